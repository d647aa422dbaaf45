use crate::view::TurnPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wizard-chat")]
#[command(author, version, about = "Operator console for Wizard-of-Oz chat sessions", long_about = "\
Renders a conversation held by a remote message store, waits for the user's turn \
and forwards the operator's replies.\n\n\
Environment Variables:\n  \
CLIENT_BASE_URL   Message store base URL (defaults to http://localhost:8000)\n  \
CLIENT_API_KEY    Bearer token for the store (defaults to a development key)\n  \
CONFIG_ENV        Settings file under config/ to load (defaults to \"default\")")]
pub struct Cli {
    /// Settings file to load instead of config/{CONFIG_ENV}
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive operator console
    Chat {
        /// How to tell whose turn it is
        #[arg(short, long, value_enum)]
        policy: Option<TurnPolicy>,

        /// Idle time between polls while waiting for the user
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Give up waiting after this many seconds (0 waits forever)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the conversation once
    Show,

    /// Clear the conversation and start a new chat
    New,

    /// Append a message to the conversation
    Post {
        #[arg(short, long, default_value = "user")]
        role: String,

        #[arg(short = 'm', long)]
        content: String,

        #[arg(long)]
        reasoning: Option<String>,

        /// Attach a file reference (repeatable)
        #[arg(short, long = "file")]
        files: Vec<String>,
    },

    /// Set feedback on a message
    Rate {
        /// Zero-based message index
        index: usize,

        /// Thumbs: 0-1, stars: 0-4
        value: u8,
    },

    /// Check connectivity and credentials
    Ping,

    /// Show model settings
    Settings,
}
