//! Console rendering of monitor events.

use super::{MonitorEvent, Notifier, ReportEntry};

use chrono::{DateTime, Local, Utc};

/// Writes reports and alerts through `tracing` under the `sitewatch::view` target.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Report { entries, window_start } => {
                for line in format_report(entries, *window_start) {
                    tracing::info!(target: "sitewatch::view", "{}", line);
                }
            }
            MonitorEvent::TargetRecovered { name, at } => {
                tracing::info!(target: "sitewatch::view", "{}", format_recovered(name, *at));
            }
            MonitorEvent::TargetDown { name, availability, at } => {
                tracing::warn!(target: "sitewatch::view", "{}", format_down(name, *availability, *at));
            }
        }
    }
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string()
}

pub fn format_report(entries: &[ReportEntry], window_start: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![
        "########################".to_string(),
        "#   Web Monitor Stats  #".to_string(),
        "########################".to_string(),
        format!("Average calculated from {}", format_time(window_start)),
    ];

    for entry in entries {
        let avg = match entry.stats.response_avg {
            Some(avg) => avg.to_string(),
            None => "-1".to_string(),
        };
        let codes = entry
            .stats
            .response_codes
            .iter()
            .map(|(code, count)| format!("{}: {}", code, count))
            .collect::<Vec<_>>()
            .join(", ");

        lines.push(format!("Web: {}", entry.name));
        lines.push(format!("Response time AVG: {}", avg));
        lines.push(format!("Response codes: {{{}}}", codes));
        lines.push(format!("Availability: {}%", entry.stats.availability));
        lines.push(format!("Status: {}", entry.status));
        lines.push("------------------------".to_string());
    }

    lines
}

pub fn format_recovered(name: &str, at: DateTime<Utc>) -> String {
    format!("[ALERT] Website {} is UP again. Time={}", name, format_time(at))
}

pub fn format_down(name: &str, availability: f64, at: DateTime<Utc>) -> String {
    format!(
        "[ALERT] Website {} is DOWN. Availability={}, Time={}",
        name,
        availability,
        format_time(at)
    )
}
