//! Scheduler module for sampling targets and publishing events.
//!
//! One sampler task per target, plus a single watchdog and a single
//! reporter. All of them stop on the shared stop signal.

mod report;
mod watchdog;

pub use report::*;
pub use watchdog::*;

use crate::notify::MonitorEvent;
use crate::probe::{Prober, PROBE_TIMEOUT};
use crate::target::SharedTarget;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs the sampling, watchdog and reporting tasks for a set of targets.
pub struct Monitor<P: Prober> {
    targets: Vec<SharedTarget>,
    prober: Arc<P>,
    events: mpsc::Sender<MonitorEvent>,
    stop: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl<P: Prober> Monitor<P> {
    pub fn new(targets: Vec<SharedTarget>, prober: P, events: mpsc::Sender<MonitorEvent>) -> Self {
        let (stop, _) = broadcast::channel(1);
        Self {
            targets,
            prober: Arc::new(prober),
            events,
            stop,
            handles: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    /// Spawn every worker. Calling this twice is a no-op.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        tracing::info!("Starting monitor with {} targets", self.targets.len());

        for target in &self.targets {
            tracing::info!("Scheduler: Started monitoring for {}", target.read().name());
            self.handles.push(tokio::spawn(run_probe_loop(
                target.clone(),
                self.prober.clone(),
                self.stop.subscribe(),
            )));
        }

        self.handles.push(tokio::spawn(run_watchdog(
            self.targets.clone(),
            self.events.clone(),
            self.stop.subscribe(),
        )));
        self.handles.push(tokio::spawn(run_reporter(
            self.targets.clone(),
            self.events.clone(),
            self.stop.subscribe(),
        )));
    }

    /// Signal every worker to stop and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());

        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Scheduler: worker failed: {}", e);
            }
        }
        tracing::info!("Scheduler: all workers stopped");
    }
}

/// Probe a single target every `interval` seconds until stopped.
///
/// The first probe happens one interval after start.
async fn run_probe_loop<P: Prober>(
    target: SharedTarget,
    prober: Arc<P>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let (name, url, period) = {
        let t = target.read();
        (
            t.name().to_string(),
            t.url().to_string(),
            Duration::from_secs(t.interval()),
        )
    };

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let outcome = prober.probe(&url, PROBE_TIMEOUT).await;
                let available = outcome.available();

                let availability = {
                    let mut t = target.write();
                    t.record_outcome(outcome);
                    t.availability()
                };

                tracing::debug!(
                    "Added response data for {} (available={}, availability={})",
                    name,
                    available,
                    availability
                );
            }
        }
    }

    tracing::debug!("Scheduler: stopped sampling {}", name);
}
