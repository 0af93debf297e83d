//! sitewatch - HTTP availability monitor
//!
//! Probes every configured endpoint on its own interval, alerts when the
//! two-minute availability crosses 80%, and prints periodic statistics.

mod config;
mod notify;
mod probe;
mod scheduler;
mod target;

use config::MonitorConfig;
use notify::{run_notifier, ConsoleNotifier, EVENT_BUFFER};
use probe::HttpProber;
use scheduler::Monitor;
use target::{SharedTarget, Target};

use std::fs::OpenOptions;
use std::io::BufRead;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = MonitorConfig::load();
    init_logging(&cfg)?;

    tracing::info!("Loading targets from {}", cfg.targets_path.display());
    let targets: Vec<SharedTarget> = cfg
        .load_targets()?
        .into_iter()
        .map(Target::into_shared)
        .collect();

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let notifier = tokio::spawn(run_notifier(rx, ConsoleNotifier));

    let mut monitor = Monitor::new(targets, HttpProber::new(), tx);
    monitor.start();

    wait_for_exit().await;

    monitor.shutdown().await;
    if let Err(e) = notifier.await {
        tracing::error!("Notifier failed: {}", e);
    }

    tracing::info!("End of program");
    Ok(())
}

/// Console logging, plus a plain-text log file when a log directory is configured.
fn init_logging(cfg: &MonitorConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file_layer = match cfg.log_file()? {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive("sitewatch=info".parse()?))
        .init();

    Ok(())
}

/// Wait for Ctrl-C or an `exit` line on stdin.
async fn wait_for_exit() {
    let (tx, rx) = oneshot::channel();

    // Blocking stdin reads live on a detached thread so they never hold up shutdown.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim() == "exit" => {
                    let _ = tx.send(());
                    return;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Received Ctrl-C, shutting down");
        }
        Ok(()) = rx => {
            tracing::info!("Received exit command, shutting down");
        }
    }
}
