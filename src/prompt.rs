//! Interactive console
//!
//! Everything the user sees on stdout: the welcome banner, the questions
//! that build a new list, the resume offer, and per-sentence progress.
//! Questions are asked through dialoguer; logs go to stderr separately.

use crate::error::{Result, SequenceError, StepPasterError};
use crate::hotkey;
use crate::queue::DurableQueue;
use crate::sequence::{self, PhraseTemplate};
use crate::session::SessionReporter;
use dialoguer::{Confirm, Input};
use std::io::BufRead;
use std::path::Path;

/// Sentences shown in a preview before "... and N more"
pub const PREVIEW_LINES: usize = 3;

const RULE_WIDTH: usize = 60;

/// Answers collected for a new list
#[derive(Debug, Clone)]
pub struct NewSessionAnswers {
    pub template: PhraseTemplate,
    pub start: i64,
    pub end: i64,
    pub auto_commit: bool,
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn prompt_error(e: dialoguer::Error) -> StepPasterError {
    StepPasterError::Prompt(e.to_string())
}

/// Print the welcome banner and the platform line
pub fn print_welcome() {
    println!();
    println!("{}", rule());
    println!("{:^width$}", "WELCOME TO THE FRIENDLY STEP PASTER!", width = RULE_WIDTH);
    println!("{}", rule());
    println!();
    println!("This helper makes a list of sentences with numbers that count up.");
    println!("For example: 'I climbed 1 step', 'I climbed 2 steps', and so on.");
    println!();
    println!("It will copy each sentence for you, and can even detect when you paste!");
    println!("{}", rule());
    println!();
    println!("You're using: {}", platform_name());
}

fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    }
}

/// Render preview lines, numbered or ticked, plus the "more" line
pub fn format_preview(lines: &[String], hidden: u64, numbered: bool) -> Vec<String> {
    let mut out: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if numbered {
                format!("   {}. {}", i + 1, line)
            } else {
                format!("   ✓ {}", line)
            }
        })
        .collect();

    if hidden > 0 {
        out.push(format!(
            "   ... and {} more {}.",
            hidden,
            if hidden == 1 { "sentence" } else { "sentences" }
        ));
    }

    out
}

/// Show the saved list and ask whether to continue it
///
/// Returns false without asking when there is nothing to resume.
pub fn offer_resume(queue: &DurableQueue) -> Result<bool> {
    if !queue.exists() {
        return Ok(false);
    }

    println!();
    println!("I found a saved list from before!");
    println!("   The file is: {}", display_path(queue.path()));

    match queue.load() {
        Ok(lines) if !lines.is_empty() => {
            let shown = lines.len().min(PREVIEW_LINES);
            println!();
            println!("   Preview of saved sentences:");
            for line in format_preview(&lines[..shown], (lines.len() - shown) as u64, true) {
                println!("{}", line);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Could not preview the saved list: {}", e),
    }

    println!();
    Confirm::new()
        .with_prompt("Would you like to continue where you left off?")
        .default(true)
        .interact()
        .map_err(prompt_error)
}

/// Ask for the sentence pieces and number range of a new list
pub fn ask_new_session(default_auto_commit: bool) -> Result<NewSessionAnswers> {
    println!();
    println!("Let's build your sentences!");
    println!();
    println!("Here's an example to help you understand:");
    println!("   If you want: 'I ate 1 apple', 'I ate 2 apples', etc.");
    println!("   - You would start with: 'I ate'");
    println!("   - For one item: 'apple'");
    println!("   - For multiple items: 'apples'");
    println!("   - You could end with: 'today' (optional)");
    println!();

    let prefix: String = Input::new()
        .with_prompt("1. What words should come BEFORE the number? (Example: I climbed)")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Please type at least one word")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(prompt_error)?;

    let singular: String = Input::new()
        .with_prompt("2. What word to use when there's just ONE? (Example: step)")
        .interact_text()
        .map_err(prompt_error)?;

    let plural: String = Input::new()
        .with_prompt("3. What word to use when there's MORE THAN ONE? (Example: steps)")
        .interact_text()
        .map_err(prompt_error)?;

    let suffix: String = Input::new()
        .with_prompt("4. Any words to add at the END? (Example: today) [Press Enter to skip]")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;

    let template = PhraseTemplate::from_input(&prefix, &singular, &plural, &suffix);

    println!();
    println!("Now, let's decide what numbers you want to count through:");
    println!();

    let (start, end, preview, hidden) = loop {
        let start: i64 = Input::new()
            .with_prompt("5. What number should we START with? (Example: 1)")
            .interact_text()
            .map_err(prompt_error)?;

        let end: i64 = Input::new()
            .with_prompt("6. What number should we END with? (Example: 10)")
            .interact_text()
            .map_err(prompt_error)?;

        match sequence::preview(&template, start, end, PREVIEW_LINES) {
            Ok((preview, hidden)) => break (start, end, preview, hidden),
            Err(
                e @ (SequenceError::InvalidRange { .. } | SequenceError::RangeTooLarge { .. }),
            ) => {
                println!("   Oops, {}. Let's try those numbers again.", e);
                println!();
            }
            Err(e) => return Err(e.into()),
        }
    };

    println!();
    println!("Here's a preview of your sentences:");
    for line in format_preview(&preview, hidden, false) {
        println!("{}", line);
    }

    let auto_commit = ask_auto_commit(default_auto_commit)?;

    Ok(NewSessionAnswers {
        template,
        start,
        end,
        auto_commit,
    })
}

/// Ask whether Enter should be pressed after every paste
pub fn ask_auto_commit(default: bool) -> Result<bool> {
    println!();
    println!("After you paste your text, I can press Enter for you automatically.");
    Confirm::new()
        .with_prompt("Should I press Enter for you after pasting?")
        .default(default)
        .interact()
        .map_err(prompt_error)
}

/// Print the tips and wait for Enter
pub fn wait_until_ready(queue_path: &Path, watching: &[String]) -> Result<()> {
    println!();
    println!("{}", rule());
    println!("{:^width$}", "READY TO START PASTING!", width = RULE_WIDTH);
    println!("{}", rule());
    println!();
    println!("Each sentence will be copied to your clipboard automatically.");
    println!("All your sentences are also saved in this file:");
    println!("   {}", display_path(queue_path));
    if !watching.is_empty() {
        println!("Watching for: {}", watching.join(", "));
    }
    println!();
    println!("TIPS:");
    println!("   - Switch to where you want to paste (e.g., a document or website)");
    println!(
        "   - Press {} to paste each sentence",
        hotkey::paste_chord_label()
    );
    println!("   - I'll notice your paste and get the next sentence ready");
    println!("   - Press Ctrl+C at any time to stop; your progress is saved");
    println!();
    println!("Press Enter when you're ready to begin...");

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| StepPasterError::Prompt(e.to_string()))?;
    Ok(())
}

/// Absolute form of `path` when it can be resolved
fn display_path(path: &Path) -> String {
    if path.is_absolute() {
        return path.display().to_string();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Progress output for interactive runs
pub struct ConsoleReporter;

impl SessionReporter for ConsoleReporter {
    fn on_phrase(&self, index: usize, total: usize, phrase: &str) {
        println!();
        println!("[{}/{}] Copied: {}", index, total, phrase);
        println!("   Paste it where you need it.");
    }

    fn on_pasted(&self, _index: usize, _total: usize) {
        println!("   Paste detected! Moving to the next sentence.");
    }

    fn on_timed_out(&self, _index: usize, advancing: bool) {
        if advancing {
            println!("   Waited too long. Moving to the next sentence.");
        } else {
            println!("   Waited too long. Copying the same sentence again.");
        }
    }

    fn on_complete(&self, pasted: usize) {
        println!();
        if pasted > 0 {
            println!("All done! You've pasted all your sentences.");
        } else {
            println!("There is nothing left to paste.");
        }
    }

    fn on_stopped(&self, _pasted: usize, remaining: usize) {
        println!();
        println!("Stopped.");
        if remaining > 0 {
            println!(
                "Your progress has been saved ({} left). You can continue later!",
                remaining
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_numbered_preview_with_more() {
        let out = format_preview(&lines(&["a 1 b", "a 2 bs", "a 3 bs"]), 7, true);
        assert_eq!(
            out,
            vec![
                "   1. a 1 b",
                "   2. a 2 bs",
                "   3. a 3 bs",
                "   ... and 7 more sentences.",
            ]
        );
    }

    #[test]
    fn test_ticked_preview_without_more() {
        let out = format_preview(&lines(&["x 1 y"]), 0, false);
        assert_eq!(out, vec!["   ✓ x 1 y"]);
    }

    #[test]
    fn test_single_hidden_sentence() {
        let out = format_preview(&lines(&["a", "b", "c"]), 1, false);
        assert_eq!(out.last().unwrap(), "   ... and 1 more sentence.");
    }

    #[test]
    fn test_offer_resume_without_saved_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let queue = DurableQueue::new(dir.path().join("list.txt"));
        assert!(!offer_resume(&queue).unwrap());
    }

    #[test]
    fn test_display_path_is_absolute() {
        assert!(Path::new(&display_path(Path::new("list.txt"))).is_absolute());
    }
}
