//! Periodic statistics reports.

use crate::notify::{MonitorEvent, ReportEntry};
use crate::target::SharedTarget;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Reports land on multiples of this many wall-clock seconds.
pub const REPORT_PERIOD_SECS: i64 = 10;

/// Every this many ticks, the report uses the long window.
pub const LONG_WINDOW_EVERY: u32 = 10;

pub const SHORT_WINDOW_MINUTES: i64 = 10;
pub const LONG_WINDOW_MINUTES: i64 = 60;

/// Chooses the lookback window for each report tick.
///
/// Ticks are counted from 1; tick 10 uses the long window and resets the
/// count, so ticks 10, 20, 30, ... are long and all others short.
#[derive(Debug, Clone)]
pub struct WindowSchedule {
    tick: u32,
}

impl Default for WindowSchedule {
    fn default() -> Self {
        Self { tick: 1 }
    }
}

impl WindowSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window for the current tick; advances to the next one.
    pub fn next_window(&mut self) -> ChronoDuration {
        if self.tick == LONG_WINDOW_EVERY {
            self.tick = 1;
            ChronoDuration::minutes(LONG_WINDOW_MINUTES)
        } else {
            self.tick += 1;
            ChronoDuration::minutes(SHORT_WINDOW_MINUTES)
        }
    }
}

/// Emit a report at every report boundary until stopped.
pub async fn run_reporter(
    targets: Vec<SharedTarget>,
    events: mpsc::Sender<MonitorEvent>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut schedule = WindowSchedule::new();
    let mut boundary = next_boundary(None, Utc::now(), REPORT_PERIOD_SECS);

    loop {
        let delay = (boundary - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = tokio::time::sleep(delay) => {
                let window_start = Utc::now() - schedule.next_window();
                let report = build_report(&targets, window_start);
                if events.send(report).await.is_err() {
                    tracing::error!("Reporter: event channel closed, stopping");
                    return;
                }
                boundary = next_boundary(Some(boundary), Utc::now(), REPORT_PERIOD_SECS);
            }
        }
    }

    tracing::debug!("Reporter: stopped");
}

/// Collect the statistics of every target since `window_start`.
pub fn build_report(targets: &[SharedTarget], window_start: DateTime<Utc>) -> MonitorEvent {
    let entries = targets
        .iter()
        .map(|target| {
            let t = target.read();
            tracing::debug!("Calculating stats for {}", t.name());
            ReportEntry {
                name: t.name().to_string(),
                stats: t.windowed_stats(window_start),
                status: t.status(),
            }
        })
        .collect();

    MonitorEvent::Report {
        entries,
        window_start,
    }
}

/// Truncate a datetime to the start of its containing window.
pub fn truncate_to_window(dt: DateTime<Utc>, window_seconds: i64) -> DateTime<Utc> {
    let ts = dt.timestamp();
    let truncated = ts - ts.rem_euclid(window_seconds);
    DateTime::from_timestamp(truncated, 0).unwrap_or(dt)
}

/// The report boundary following `previous`.
///
/// Advances from the previous boundary so a wake-up slightly before it
/// cannot yield a second report right after. Re-aligns on `now` when there
/// is no previous boundary or the clock jumped past the next one.
pub fn next_boundary(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    period_secs: i64,
) -> DateTime<Utc> {
    let period = ChronoDuration::seconds(period_secs);
    match previous {
        Some(previous) if previous + period > now => previous + period,
        _ => truncate_to_window(now, period_secs) + period,
    }
}
