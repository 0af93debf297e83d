//! Windowed statistics over a target's response history.

use crate::probe::ProbeOutcome;
use std::collections::BTreeMap;

/// Aggregated statistics for a slice of history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Mean response time in seconds over available outcomes, `None` if there were none.
    pub response_avg: Option<f64>,
    /// Status code counts, available outcomes only.
    pub response_codes: BTreeMap<u16, u32>,
    /// Percentage of available outcomes; 0.0 when nothing was available.
    pub availability: f64,
    /// Number of outcomes in the window.
    pub total: usize,
}

impl Stats {
    /// Aggregate the given outcomes.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ProbeOutcome>) -> Self {
        let mut stats = Stats::default();
        let mut available = 0usize;
        let mut total_seconds = 0.0;

        for outcome in outcomes {
            stats.total += 1;
            if !outcome.available() {
                continue;
            }
            available += 1;
            total_seconds += outcome.response_time().unwrap_or_default();
            if let Some(code) = outcome.status_code() {
                *stats.response_codes.entry(code).or_insert(0) += 1;
            }
        }

        if available > 0 {
            stats.response_avg = Some(round_to(total_seconds / available as f64, 4));
            stats.availability = percentage(available, stats.total);
        }

        stats
    }
}

/// `100 * part / total` rounded to 2 decimals. The caller guarantees `total > 0`.
pub fn percentage(part: usize, total: usize) -> f64 {
    round_to(part as f64 / total as f64 * 100.0, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(percentage(7, 10), 70.0);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn test_empty_stats() {
        let stats = Stats::from_outcomes(&Vec::<ProbeOutcome>::new());
        assert_eq!(stats.response_avg, None);
        assert!(stats.response_codes.is_empty());
        assert_eq!(stats.availability, 0.0);
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn test_only_available_outcomes_count_codes() {
        let now = Utc::now();
        let outcomes = vec![
            ProbeOutcome::responded(200, 0.2, now),
            ProbeOutcome::responded(200, 0.4, now),
            ProbeOutcome::responded(500, 3.0, now),
            ProbeOutcome::unreachable(now),
        ];

        let stats = Stats::from_outcomes(&outcomes);
        assert_eq!(stats.response_avg, Some(0.3));
        assert_eq!(stats.response_codes.len(), 1);
        assert_eq!(stats.response_codes[&200], 2);
        assert_eq!(stats.availability, 50.0);
        assert_eq!(stats.total, 4);
    }

    #[test]
    fn test_nothing_available_is_zero() {
        let now = Utc::now();
        let outcomes = vec![
            ProbeOutcome::unreachable(now),
            ProbeOutcome::responded(404, 0.1, now),
        ];

        let stats = Stats::from_outcomes(&outcomes);
        assert_eq!(stats.response_avg, None);
        assert!(stats.response_codes.is_empty());
        assert_eq!(stats.availability, 0.0);
        assert_eq!(stats.total, 2);
    }
}
