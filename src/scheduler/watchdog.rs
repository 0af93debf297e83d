//! Watchdog that turns availability changes into up/down alerts.

use crate::notify::MonitorEvent;
use crate::target::{SharedTarget, Transition};

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

/// How often the watchdog checks every target.
pub const WATCHDOG_PERIOD: Duration = Duration::from_secs(1);

/// Check all targets once a second until stopped.
pub async fn run_watchdog(
    targets: Vec<SharedTarget>,
    events: mpsc::Sender<MonitorEvent>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + WATCHDOG_PERIOD, WATCHDOG_PERIOD);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = interval.tick() => {
                for event in check_targets(&targets, Utc::now()) {
                    if events.send(event).await.is_err() {
                        tracing::error!("Watchdog: event channel closed, stopping");
                        return;
                    }
                }
            }
        }
    }

    tracing::debug!("Watchdog: stopped");
}

/// Evaluate every target and return the alerts for those that changed status.
///
/// Each target's availability is read and its status updated under one
/// write lock, so a concurrent sample can never split the decision.
pub fn check_targets(targets: &[SharedTarget], now: DateTime<Utc>) -> Vec<MonitorEvent> {
    targets
        .iter()
        .filter_map(|target| {
            let mut t = target.write();
            let transition = t.evaluate()?;
            let name = t.name().to_string();
            drop(t);

            Some(match transition {
                Transition::Recovered => {
                    tracing::info!("Watchdog: {} is up", name);
                    MonitorEvent::TargetRecovered { name, at: now }
                }
                Transition::Down { availability } => {
                    tracing::warn!("Watchdog: {} is down ({}%)", name, availability);
                    MonitorEvent::TargetDown {
                        name,
                        availability,
                        at: now,
                    }
                }
            })
        })
        .collect()
}
