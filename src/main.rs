//! Proctor Monitor CLI
//!
//! Session integrity monitoring for proctored exams.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use proctor_monitor::{
    config::{Config, SessionConfig},
    monitor::SessionMonitor,
    replay,
    report::{TracingReporter, UiEvent},
    ScriptedHost, SignalOutcome, ViolationKind, MONITORING_NOTICE, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proctor-monitor")]
#[command(version = VERSION)]
#[command(about = "Session integrity monitoring for proctored exams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session over a recorded signal script (JSON lines)
    Replay {
        /// Path to the script
        file: PathBuf,

        /// Features to enable (camera, screen, lockdown, face, or all)
        #[arg(long)]
        features: Option<String>,

        /// Devices the simulated host refuses (camera, screen, or all)
        #[arg(long, default_value = "")]
        deny: String,

        /// Save the session report to the report directory
        #[arg(long)]
        save: bool,
    },

    /// Read signals from stdin until EOF or Ctrl+C
    Watch {
        /// Features to enable (camera, screen, lockdown, face, or all)
        #[arg(long)]
        features: Option<String>,

        /// Devices the simulated host refuses (camera, screen, or all)
        #[arg(long, default_value = "")]
        deny: String,

        /// Save the session report to the report directory
        #[arg(long)]
        save: bool,
    },

    /// Print the violation rule table
    Rules,

    /// Display the monitoring notice
    Notice,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            file,
            features,
            deny,
            save,
        } => cmd_replay(&file, features.as_deref(), &deny, save).await,
        Commands::Watch {
            features,
            deny,
            save,
        } => cmd_watch(features.as_deref(), &deny, save).await,
        Commands::Rules => {
            cmd_rules();
            Ok(())
        }
        Commands::Notice => {
            println!("{MONITORING_NOTICE}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

fn session_config(config: &Config, features: Option<&str>) -> SessionConfig {
    features
        .map(SessionConfig::from_csv)
        .unwrap_or(config.session)
}

fn new_monitor(config: &Config, deny: &str) -> SessionMonitor<ScriptedHost> {
    SessionMonitor::with_ui_capacity(
        Arc::new(ScriptedHost::denying(deny)),
        TracingReporter,
        config.ui_channel_capacity,
    )
}

async fn cmd_replay(
    file: &Path,
    features: Option<&str>,
    deny: &str,
    save: bool,
) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let session = session_config(&config, features);
    let events = replay::read_script(file)
        .with_context(|| format!("could not read script {}", file.display()))?;

    println!("Proctor Monitor v{VERSION}");
    println!("Replaying {} signals from {}", events.len(), file.display());
    println!("  {session}");
    println!();

    let monitor = new_monitor(&config, deny);
    let outcomes = replay::run(&monitor, session, events).await;
    for (index, outcome) in outcomes.iter().enumerate() {
        print_outcome(index + 1, outcome);
    }
    drain_ui(&monitor);

    finish(&monitor, &config, save)
}

async fn cmd_watch(features: Option<&str>, deny: &str, save: bool) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let session = session_config(&config, features);

    println!("Proctor Monitor v{VERSION}");
    println!("  {session}");
    println!();
    println!("Reading signals from stdin. Press Ctrl+C to stop");
    println!();

    let monitor = new_monitor(&config, deny);
    if let Some(acquisitions) = monitor.start(session) {
        acquisitions.settle().await;
    }
    drain_ui(&monitor);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    // Stdin is read on its own thread so Ctrl+C is noticed while idle
    let (sender, receiver) = crossbeam_channel::bounded::<(usize, String)>(1_000);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for (index, line) in stdin.lock().lines().enumerate() {
            match line {
                Ok(line) => {
                    if sender.send((index + 1, line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    break;
                }
            }
        }
    });

    let mut dispatched = 0;
    while running.load(Ordering::SeqCst) && monitor.is_active() {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok((number, line)) => match replay::parse_line(&line, number) {
                Ok(Some(event)) => {
                    dispatched += 1;
                    let outcome = monitor.dispatch(event);
                    print_outcome(dispatched, &outcome);
                    drain_ui(&monitor);
                }
                Ok(None) => {}
                Err(e) => eprintln!("Skipping signal: {e}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    println!("Stopping session...");
    monitor.stop();
    drain_ui(&monitor);

    finish(&monitor, &config, save)
}

fn finish(
    monitor: &SessionMonitor<ScriptedHost>,
    config: &Config,
    save: bool,
) -> anyhow::Result<()> {
    println!();
    println!("{}", monitor.summary());

    if save {
        let report = monitor
            .report()
            .context("no session was started, nothing to save")?;
        config
            .ensure_directories()
            .context("could not create report directory")?;
        let path = config.report_path.join(report.file_name());
        report
            .save(&path)
            .with_context(|| format!("could not write {}", path.display()))?;
        println!();
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn print_outcome(index: usize, outcome: &SignalOutcome) {
    if let Some(violation) = &outcome.violation {
        println!(
            "#{index:<4} {} [{}] {}{}",
            violation.occurred_at().format("%H:%M:%S%.3f"),
            violation.severity(),
            violation.kind(),
            if violation.evidence().is_some() {
                " (evidence)"
            } else {
                ""
            }
        );
    } else if outcome.prevent_default {
        println!("#{index:<4} default action suppressed");
    }
}

fn drain_ui(monitor: &SessionMonitor<ScriptedHost>) {
    while let Some(event) = monitor.try_recv_ui() {
        match event {
            UiEvent::Status { status } => tracing::debug!(?status, "status"),
            UiEvent::Notify(notification) => {
                tracing::debug!(urgency = ?notification.urgency, "{}", notification.message)
            }
        }
    }
}

fn cmd_rules() {
    println!("{:<24} {:<8} Description", "Kind", "Severity");
    println!("{}", "-".repeat(72));
    for kind in ViolationKind::ALL {
        println!(
            "{:<24} {:<8} {}",
            kind.as_str(),
            kind.severity().as_str(),
            kind.description()
        );
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().context("could not load configuration")?;

    println!("Proctor Monitor Configuration");
    println!("=============================");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("Default session:");
    println!("  {}", config.session);
    println!("Report directory: {:?}", config.report_path);
    println!("UI channel capacity: {}", config.ui_channel_capacity);
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")
}
