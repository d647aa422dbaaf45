use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use wizard_chat::cli::{Cli, Commands};
use wizard_chat::view::render::avatar;
use wizard_chat::view::{Command, ConversationView, PollOutcome, ViewError, ViewState};
use wizard_chat::{utils, MessageStore, NewMessage, Role, Settings, StoreClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    }
    .context("Failed to load settings")?;

    init_logging(&settings.logging.level);
    settings.model.validate().context("Invalid model settings")?;
    settings.polling.validate().context("Invalid polling settings")?;

    match cli.command {
        Commands::Chat {
            policy,
            poll_interval_ms,
            timeout_secs,
        } => {
            let mut settings = settings;
            if let Some(policy) = policy {
                settings.view.turn_policy = policy;
            }
            if let Some(interval) = poll_interval_ms {
                settings.polling.interval_ms = interval;
            }
            if let Some(timeout) = timeout_secs {
                settings.polling.timeout_secs = timeout;
            }
            settings
                .polling
                .validate()
                .context("Invalid polling options")?;
            handle_chat(settings).await
        }
        Commands::Show => handle_show(&settings).await,
        Commands::New => handle_new(&settings).await,
        Commands::Post {
            role,
            content,
            reasoning,
            files,
        } => handle_post(&settings, role, content, reasoning, files).await,
        Commands::Rate { index, value } => handle_rate(&settings, index, value).await,
        Commands::Ping => handle_ping(&settings).await,
        Commands::Settings => {
            utils::print_model_settings(&settings.model);
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(settings: &Settings) -> Result<Arc<StoreClient>> {
    let config = settings.store_config();
    let client = StoreClient::connect(&config)
        .await
        .with_context(|| format!("Cannot reach message store at {}", config.base_url))?;
    Ok(Arc::new(client))
}

/// Stdin lines from a detached thread, so a pending read never holds up shutdown
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn redraw(view: &mut ConversationView, settings: &Settings) -> Result<()> {
    let transcript = view.render().await?;
    utils::clear_screen();
    utils::print_banner(&settings.page);
    utils::print_transcript(transcript);
    Ok(())
}

async fn handle_chat(settings: Settings) -> Result<()> {
    let store = connect(&settings).await?;
    let mut view = ConversationView::from_settings(store, &settings)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut lines = spawn_line_reader();
    let local_avatar = avatar(view.local_role()).unwrap_or(">");
    let remote_avatar = avatar(view.counterparty()).unwrap_or(">");

    loop {
        match view.state() {
            ViewState::Render => redraw(&mut view, &settings).await?,
            ViewState::AwaitingCounterparty => {
                utils::print_typing(remote_avatar);
                match view.await_counterparty(&cancel).await? {
                    PollOutcome::Found { index, .. } => {
                        if let Some(bubble) = view.transcript().bubble_at(index) {
                            utils::print_bubble(bubble);
                        }
                        utils::print_info("Your turn (/help for commands)");
                    }
                    PollOutcome::TimedOut => {
                        utils::print_info("No reply yet, refreshing the conversation");
                    }
                    PollOutcome::Cancelled => break,
                }
            }
            ViewState::AwaitingLocalInput => {
                utils::print_prompt(&format!("{} ", local_avatar));
                std::io::stdout().flush()?;

                let input = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.recv() => match line {
                        Some(line) => line,
                        None => break,
                    },
                };

                if let Some(command) = Command::parse(&input) {
                    match command {
                        Ok(command) => {
                            if !run_command(&mut view, &settings, command).await? {
                                break;
                            }
                        }
                        Err(e) => utils::print_error(&e.to_string()),
                    }
                    continue;
                }

                match view.submit(&input).await {
                    Ok(_) => {}
                    Err(ViewError::Input(e)) => utils::print_error(&e.to_string()),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    println!();
    utils::print_info("Goodbye");
    Ok(())
}

/// Returns false when the operator asked to leave
async fn run_command(
    view: &mut ConversationView,
    settings: &Settings,
    command: Command,
) -> Result<bool> {
    match command {
        Command::New => {
            view.new_chat().await?;
            utils::print_success("Started a new chat");
        }
        Command::Refresh => redraw(view, settings).await?,
        Command::Rate { index, value } => match view.rate(index, value).await {
            Ok(()) => {
                utils::print_success(&format!("Feedback {} saved on message #{}", value, index))
            }
            Err(ViewError::Store(e)) => return Err(e.into()),
            Err(e) => utils::print_error(&e.to_string()),
        },
        Command::Settings => utils::print_model_settings(&settings.model),
        Command::Help => println!("{}\n", Command::help()),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn handle_show(settings: &Settings) -> Result<()> {
    let store = connect(settings).await?;
    let mut view = ConversationView::from_settings(store, settings)?;

    utils::print_banner(&settings.page);
    let transcript = view.render().await?;
    utils::print_transcript(transcript);
    if transcript.skipped > 0 {
        utils::print_error(&format!(
            "{} message(s) with unexpected roles skipped",
            transcript.skipped
        ));
    }

    match view.state() {
        ViewState::AwaitingCounterparty => {
            utils::print_info(&format!("Waiting for the {}", view.counterparty()))
        }
        _ => utils::print_info(&format!("The {} is up", view.local_role())),
    }
    Ok(())
}

async fn handle_new(settings: &Settings) -> Result<()> {
    let store = connect(settings).await?;
    store.reset().await?;
    utils::print_success("Conversation cleared, new chat started");
    Ok(())
}

async fn handle_post(
    settings: &Settings,
    role: String,
    content: String,
    reasoning: Option<String>,
    files: Vec<String>,
) -> Result<()> {
    let store = connect(settings).await?;

    let mut message = NewMessage::new(Role::from(role), content);
    if let Some(reasoning) = reasoning {
        message = message.with_reasoning(reasoning);
    }
    if !files.is_empty() {
        message = message.with_files(files);
    }

    let ack = store.post_message(message).await?;
    utils::print_success(&format!("Message posted: {}", ack));
    Ok(())
}

async fn handle_rate(settings: &Settings, index: usize, value: u8) -> Result<()> {
    let store = connect(settings).await?;
    let ack = store.update_message(index, value).await?;
    utils::print_success(&format!("Feedback saved on message #{}: {}", index, ack));
    Ok(())
}

async fn handle_ping(settings: &Settings) -> Result<()> {
    let store = connect(settings).await?;
    let info = store.test_connection().await?;
    utils::print_success(&format!("Store at {} is reachable", store.base_url()));
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
