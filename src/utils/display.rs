use crate::config::{ModelSettings, PageSettings};
use crate::core::message::{FeedbackScale, Role};
use crate::view::render::{ChatBubble, FeedbackControl, Transcript, FILES_LABEL, REASONING_LABEL};
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

pub fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

pub fn print_banner(page: &PageSettings) {
    print_header(&page.title);
    println!("{}", page.caption.dimmed());
    println!("{}\n", format!("🧙‍♂️ {}", page.welcome).bright_blue());
}

/// Textual feedback widget, e.g. `[thumbs #2: 👍]` or `[stars #7: ★★★☆☆]`
pub fn feedback_label(control: &FeedbackControl) -> String {
    let value = match (control.scale, control.value) {
        (_, None) => "unrated".to_string(),
        (FeedbackScale::Thumbs, Some(0)) => "👎".to_string(),
        (FeedbackScale::Thumbs, Some(_)) => "👍".to_string(),
        (FeedbackScale::Stars, Some(v)) => {
            let filled = usize::from(v.min(FeedbackScale::Stars.max())) + 1;
            format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
        }
    };
    format!("[{} #{}: {}]", control.scale, control.index, value)
}

pub fn print_bubble(bubble: &ChatBubble) {
    let name = match bubble.role {
        Role::Assistant => bubble.role.as_str().bright_magenta().bold(),
        _ => bubble.role.as_str().bright_green().bold(),
    };
    println!("{} {} {}", bubble.avatar, name, format!("#{}", bubble.index).dimmed());

    if let Some(reasoning) = &bubble.reasoning {
        println!("  {}", format!("▸ {}", REASONING_LABEL).yellow());
        for line in reasoning.lines() {
            println!("    {}", line.dimmed());
        }
    }

    if !bubble.files.is_empty() {
        println!("  {}", format!("▸ {}", FILES_LABEL).yellow());
        for file in &bubble.files {
            println!("    📄 {}", file);
        }
    }

    for line in bubble.body.lines() {
        println!("  {}", line);
    }

    if let Some(control) = &bubble.feedback {
        println!("  {}", feedback_label(control).dimmed());
    }
    println!();
}

pub fn print_transcript(transcript: &Transcript) {
    for bubble in &transcript.bubbles {
        print_bubble(bubble);
    }
}

pub fn print_typing(avatar: &str) {
    println!("{} {}", avatar, "Typing ...".italic().dimmed());
}

pub fn print_model_settings(model: &ModelSettings) {
    print_header("Settings");
    println!("  Model:              {}", model.model);
    println!("  Tools:              {}", model.tools.join(", "));
    println!("  Custom mode:        {}", model.custom_mode);

    if !model.custom_mode {
        println!();
        return;
    }

    println!("\n  {}", "Model parameters".bold());
    println!("  Sampling decoding:  {}", model.sampling);
    if model.sampling {
        println!("  Temperature:        {}", model.temperature);
        println!("  Top P:              {}", model.top_p);
        println!("  Top K:              {}", model.top_k);
        println!("  Random seed:        {}", model.random_seed);
    }
    println!("  Repetition penalty: {}", model.repetition_penalty);
    println!("  Min tokens:         {}", model.min_new_tokens);
    println!("  Max tokens:         {}", model.max_new_tokens);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_labels() {
        let thumbs = FeedbackControl {
            index: 2,
            scale: FeedbackScale::Thumbs,
            value: Some(1),
        };
        assert_eq!(feedback_label(&thumbs), "[thumbs #2: 👍]");

        let stars = FeedbackControl {
            index: 7,
            scale: FeedbackScale::Stars,
            value: Some(2),
        };
        assert_eq!(feedback_label(&stars), "[stars #7: ★★★☆☆]");

        let unrated = FeedbackControl {
            index: 4,
            scale: FeedbackScale::Thumbs,
            value: None,
        };
        assert_eq!(feedback_label(&unrated), "[thumbs #4: unrated]");
    }
}
