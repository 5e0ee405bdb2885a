//! Step Paster - paste a series of numbered sentences, one at a time
//!
//! Run with `step-paster` to answer a few questions and start pasting.
//! Use `step-paster resume` to continue a saved list.
//! Use `step-paster new ...` to start a list without questions.

use clap::Parser;
use pidlock::Pidlock;
use std::process::ExitCode;
use std::sync::Arc;
use step_paster::clipboard;
use step_paster::commit;
use step_paster::config::{self, Config};
use step_paster::detector::PasteDetector;
use step_paster::prompt::{self, ConsoleReporter};
use step_paster::queue::DurableQueue;
use step_paster::sequence::PhraseTemplate;
use step_paster::session::{self, SessionController};
use step_paster::{Cli, Commands, StepPasterError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("step_paster={},warn", log_level))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!();
            println!("Oops! Something went wrong: {:#}", e);
            println!();
            println!("Please try again. Your saved list has been kept.");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(file) = cli.file {
        config.session.queue_file = Some(file);
    }
    if let Some(ms) = cli.poll_ms {
        config.detector.poll_interval_ms = ms;
    }
    if cli.no_hotkey {
        config.detector.use_hotkey = false;
    }

    let queue = DurableQueue::new(config.session.queue_path());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            prompt::print_welcome();

            if prompt::offer_resume(&queue)? {
                config.session.auto_commit = prompt::ask_auto_commit(config.session.auto_commit)?;
            } else {
                let answers = prompt::ask_new_session(config.session.auto_commit)?;
                config.session.auto_commit = answers.auto_commit;
                let phrases =
                    session::start_new_session(&queue, &answers.template, answers.start, answers.end)?;
                println!();
                println!("Great! I've created {} sentences for you.", phrases.len());
            }

            paste_session(config, queue, true).await
        }

        Commands::New {
            prefix,
            singular,
            plural,
            suffix,
            start,
            end,
            enter,
        } => {
            let template = PhraseTemplate::from_input(&prefix, &singular, &plural, &suffix);
            let phrases = session::start_new_session(&queue, &template, start, end)?;
            println!("Created {} sentences in {}", phrases.len(), queue.path().display());
            config.session.auto_commit |= enter;
            paste_session(config, queue, false).await
        }

        Commands::Resume { enter } => {
            if !queue.exists() {
                println!("No saved list found at {}", queue.path().display());
                println!("Start one with: step-paster");
                return Ok(());
            }
            config.session.auto_commit |= enter;
            paste_session(config, queue, false).await
        }

        Commands::Status => {
            show_status(&queue)?;
            Ok(())
        }

        Commands::Clear => {
            queue.clear()?;
            println!("Removed {}", queue.path().display());
            Ok(())
        }

        Commands::Config => {
            show_config(&config)?;
            Ok(())
        }
    }
}

/// Take the single-session lock, run the controller, release the lock
async fn paste_session(config: Config, queue: DurableQueue, interactive: bool) -> anyhow::Result<()> {
    // Single instance check
    let runtime_dir = Config::runtime_dir();
    std::fs::create_dir_all(&runtime_dir)?;
    let lock_path = runtime_dir.join("step-paster.lock");
    let mut pidlock = Pidlock::new(&lock_path.to_string_lossy());
    if pidlock.acquire().is_err() {
        return Err(StepPasterError::Locked(lock_path).into());
    }

    let result = run_controller(config, queue, interactive).await;

    if let Err(e) = pidlock.release() {
        tracing::warn!("Failed to release session lock: {:?}", e);
    }

    result
}

async fn run_controller(config: Config, queue: DurableQueue, interactive: bool) -> anyhow::Result<()> {
    let clipboard = clipboard::create_clipboard(&config.clipboard).await?;
    let detector = PasteDetector::probe(config.detector.clone(), Arc::clone(&clipboard));
    let watching: Vec<String> = detector.sources().iter().map(|s| s.describe()).collect();
    tracing::info!("Watching for: {}", watching.join(", "));

    if interactive {
        prompt::wait_until_ready(queue.path(), &watching)?;
    }

    // Prompts are done; from here Ctrl+C stops the session instead of the process
    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let controller = SessionController::new(
        queue,
        clipboard,
        detector,
        commit::create_commit_chain(),
        config.session,
    );

    controller.run(&cancel, &ConsoleReporter).await?;
    Ok(())
}

/// Cancel the session on Ctrl+C (and SIGTERM on unix)
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => tracing::debug!("Received Ctrl+C"),
                        _ = sigterm.recv() => tracing::debug!("Received SIGTERM"),
                    }
                }
                Err(e) => {
                    tracing::warn!("Cannot listen for SIGTERM: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        cancel.cancel();
    });
}

/// Print how many sentences are left and the first few of them
fn show_status(queue: &DurableQueue) -> anyhow::Result<()> {
    let lines = queue.load()?;
    println!("Saved list: {}", queue.path().display());

    if lines.is_empty() {
        println!("No sentences left.");
        return Ok(());
    }

    println!("{} sentence(s) left. Next up:", lines.len());
    let shown = lines.len().min(prompt::PREVIEW_LINES);
    for line in prompt::format_preview(&lines[..shown], (lines.len() - shown) as u64, true) {
        println!("{}", line);
    }
    Ok(())
}

/// Show current configuration
fn show_config(config: &Config) -> anyhow::Result<()> {
    println!("Step Paster Configuration");
    println!("=========================\n");

    if let Some(path) = Config::default_path() {
        println!("Config file: {}", path.display());
    }
    println!("Saved list:  {}", config.session.queue_path().display());
    println!(
        "Paste chord: {}",
        step_paster::hotkey::paste_chord_label()
    );
    println!();
    println!("{}", toml::to_string_pretty(config)?);

    Ok(())
}
