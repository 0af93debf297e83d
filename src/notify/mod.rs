//! Monitor events and their consumers.
//!
//! The engine publishes [`MonitorEvent`]s on a channel; a single notifier
//! task drains it and hands each event to a [`Notifier`].

mod console;

pub use console::*;

use crate::target::{Stats, TargetStatus};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Capacity of the engine → notifier channel.
pub const EVENT_BUFFER: usize = 1000;

/// Statistics of one target within a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub name: String,
    pub stats: Stats,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Periodic statistics for every target since `window_start`.
    Report {
        entries: Vec<ReportEntry>,
        window_start: DateTime<Utc>,
    },
    TargetRecovered {
        name: String,
        at: DateTime<Utc>,
    },
    TargetDown {
        name: String,
        availability: f64,
        at: DateTime<Utc>,
    },
}

/// Renders monitor events.
pub trait Notifier: Send + 'static {
    fn notify(&mut self, event: &MonitorEvent);
}

/// Drain the event channel until every sender is gone.
pub async fn run_notifier<N: Notifier>(mut rx: mpsc::Receiver<MonitorEvent>, mut notifier: N) {
    while let Some(event) = rx.recv().await {
        notifier.notify(&event);
    }
    tracing::debug!("Notifier: event channel closed");
}
