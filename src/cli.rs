// Command-line interface definitions for step-paster
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "step-paster")]
#[command(author, version, about = "Paste a series of numbered sentences, one at a time")]
#[command(long_about = "
Step Paster makes a list of sentences with numbers that count up, such as
'I climbed 1 step', 'I climbed 2 steps', 'I climbed 3 steps', and copies
them to the clipboard one by one. Each time you paste, the next sentence
is copied for you.

Progress is saved after every paste, so an interrupted session can be
picked up later with `step-paster resume`.

PASTE DETECTION:
  Linux:   Ctrl+V through /dev/input (user must be in the 'input' group)
  macOS:   Cmd+V (grant Accessibility permission to your terminal)
  Windows: Ctrl+V
  Everywhere: a change of the clipboard contents also counts as a paste.

USAGE:
  step-paster                      Ask questions, then start pasting
  step-paster new --prefix 'I climbed' --singular step --plural steps \\
                  --start 1 --end 10
  step-paster resume               Continue a saved list
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Where the remaining sentences are saved
    #[arg(long, value_name = "PATH")]
    pub file: Option<std::path::PathBuf>,

    /// Clipboard check interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_ms: Option<u64>,

    /// Don't watch for the paste shortcut, only for clipboard changes
    #[arg(long)]
    pub no_hotkey: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask questions, then start pasting (default if no command specified)
    Run,

    /// Create a new list without questions and start pasting
    New {
        /// Words before the number (e.g., "I climbed")
        #[arg(long)]
        prefix: String,

        /// Word used when the number is exactly 1 (e.g., "step")
        #[arg(long)]
        singular: String,

        /// Word used for every other number (e.g., "steps")
        #[arg(long)]
        plural: String,

        /// Words after the counted word (e.g., "today")
        #[arg(long, default_value = "")]
        suffix: String,

        /// First number
        #[arg(long, allow_negative_numbers = true)]
        start: i64,

        /// Last number (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        end: i64,

        /// Press Enter after every paste
        #[arg(long)]
        enter: bool,
    },

    /// Continue the saved list
    Resume {
        /// Press Enter after every paste
        #[arg(long)]
        enter: bool,
    },

    /// Show how many sentences are left in the saved list
    Status,

    /// Delete the saved list
    Clear,

    /// Show current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_defaults_to_none() {
        let cli = Cli::try_parse_from(["step-paster"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.no_hotkey);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_new_command() {
        let cli = Cli::try_parse_from([
            "step-paster",
            "new",
            "--prefix",
            "I climbed",
            "--singular",
            "step",
            "--plural",
            "steps",
            "--start",
            "-2",
            "--end",
            "3",
            "--enter",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::New {
                prefix,
                suffix,
                start,
                end,
                enter,
                ..
            }) => {
                assert_eq!(prefix, "I climbed");
                assert_eq!(suffix, "");
                assert_eq!(start, -2);
                assert_eq!(end, 3);
                assert!(enter);
            }
            _ => panic!("Expected New command"),
        }
    }

    #[test]
    fn test_new_requires_range() {
        let result = Cli::try_parse_from([
            "step-paster",
            "new",
            "--prefix",
            "a",
            "--singular",
            "b",
            "--plural",
            "bs",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "step-paster",
            "-vv",
            "--file",
            "/tmp/list.txt",
            "--poll-ms",
            "50",
            "--no-hotkey",
            "status",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.file.as_deref(), Some(std::path::Path::new("/tmp/list.txt")));
        assert_eq!(cli.poll_ms, Some(50));
        assert!(cli.no_hotkey);
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_resume_enter_flag() {
        let cli = Cli::try_parse_from(["step-paster", "resume", "--enter"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Resume { enter: true })));
    }
}
