//! Monitored targets.
//!
//! A [`Target`] keeps the newest-first response history of one endpoint,
//! the availability over the trailing two minutes, and its up/down status.
//! Each target is written by its own sampler and read by the watchdog and
//! reporter, so it is shared as a [`SharedTarget`].

mod stats;

pub use stats::*;

use crate::probe::ProbeOutcome;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lookback used for the alerting availability.
pub const AVAILABILITY_WINDOW_SECS: i64 = 120;

/// Availability must be strictly above this to go up, strictly below to go down.
pub const AVAILABILITY_THRESHOLD: f64 = 80.0;

/// Default history retention, the longest report window.
pub const DEFAULT_RETENTION_MINUTES: i64 = 60;

/// Upper bound on history retention (one week).
pub const MAX_RETENTION_MINUTES: i64 = 7 * 24 * 60;

/// Longest accepted probe interval, the default retention.
pub const MAX_INTERVAL_SECS: u64 = 3600;

/// A target shared between its sampler, the watchdog and the reporter.
pub type SharedTarget = Arc<RwLock<Target>>;

/// Target construction errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("target {name:?} must have exactly name, interval and url (missing: {missing:?}, unexpected: {unexpected:?})")]
    Fields {
        name: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("target {name:?} has an invalid interval: {value}")]
    Interval { name: String, value: String },
    #[error("target {name:?} has an empty url")]
    Url { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Up,
    Down,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Up => write!(f, "UP"),
            TargetStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// A status change decided by [`Target::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Recovered,
    Down { availability: f64 },
}

/// One monitored endpoint.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    url: String,
    interval: u64,
    status: TargetStatus,
    /// Last two-minute availability; 0.0 until there is data.
    availability: f64,
    history: VecDeque<ProbeOutcome>,
    retention: ChronoDuration,
}

impl Target {
    /// Create a target. The interval is in seconds and must be positive.
    pub fn new(name: &str, url: &str, interval: u64) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Fields {
                name: String::new(),
                missing: vec!["name".to_string()],
                unexpected: Vec::new(),
            });
        }
        if interval == 0 || interval > MAX_INTERVAL_SECS {
            return Err(ValidationError::Interval {
                name: name.to_string(),
                value: interval.to_string(),
            });
        }
        if url.trim().is_empty() {
            return Err(ValidationError::Url {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            interval,
            status: TargetStatus::Down,
            availability: 0.0,
            history: VecDeque::new(),
            retention: ChronoDuration::minutes(DEFAULT_RETENTION_MINUTES),
        })
    }

    /// Build a target from its name and a raw configuration entry.
    ///
    /// The entry must hold exactly `interval` and `url`; every missing or
    /// unexpected key is reported at once. `interval` may be a number or a
    /// numeric string.
    pub fn from_fields(name: &str, fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        const REQUIRED: [&str; 2] = ["interval", "url"];

        let mut missing: Vec<String> = REQUIRED
            .iter()
            .filter(|key| !fields.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if name.is_empty() {
            missing.insert(0, "name".to_string());
        }
        let unexpected: Vec<String> = fields
            .keys()
            .filter(|key| !REQUIRED.contains(&key.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ValidationError::Fields {
                name: name.to_string(),
                missing,
                unexpected,
            });
        }

        let interval = parse_interval(&fields["interval"]).ok_or_else(|| ValidationError::Interval {
            name: name.to_string(),
            value: fields["interval"].to_string(),
        })?;
        let url = fields["url"].as_str().ok_or_else(|| ValidationError::Url {
            name: name.to_string(),
        })?;

        Self::new(name, url, interval)
    }

    /// Keep outcomes for this long, clamped between the availability window
    /// and [`MAX_RETENTION_MINUTES`].
    pub fn with_retention(mut self, retention: ChronoDuration) -> Self {
        self.retention = retention.clamp(
            ChronoDuration::seconds(AVAILABILITY_WINDOW_SECS),
            ChronoDuration::minutes(MAX_RETENTION_MINUTES),
        );
        self
    }

    pub fn into_shared(self) -> SharedTarget {
        Arc::new(RwLock::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe interval in seconds.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn status(&self) -> TargetStatus {
        self.status
    }

    pub fn availability(&self) -> f64 {
        self.availability
    }

    /// Recorded outcomes, newest first.
    #[cfg(test)]
    pub fn history(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.history.iter()
    }

    pub fn set_up(&mut self) {
        self.status = TargetStatus::Up;
    }

    pub fn set_down(&mut self) {
        self.status = TargetStatus::Down;
    }

    /// Record a new outcome and recompute the two-minute availability.
    pub fn record_outcome(&mut self, outcome: ProbeOutcome) {
        self.record_outcome_at(outcome, Utc::now());
    }

    /// Same as [`Target::record_outcome`] with an explicit current time.
    ///
    /// An outcome older than the newest recorded one (the wall clock stepped
    /// back) is inserted at its sorted position, so history stays ordered.
    pub fn record_outcome_at(&mut self, outcome: ProbeOutcome, now: DateTime<Utc>) {
        let position = self
            .history
            .iter()
            .take_while(|newer| newer.timestamp() > outcome.timestamp())
            .count();
        self.history.insert(position, outcome);

        if let Some(expired) = now.checked_sub_signed(self.retention) {
            while self
                .history
                .back()
                .is_some_and(|oldest| oldest.timestamp() <= expired)
            {
                self.history.pop_back();
            }
        }

        // An empty window (clock skew, backdated outcome) resets to "no data".
        let since = now
            .checked_sub_signed(ChronoDuration::seconds(AVAILABILITY_WINDOW_SECS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let (available, total) = self
            .since(since)
            .fold((0, 0), |(a, t), o| (a + o.available() as usize, t + 1));
        self.availability = if total > 0 {
            percentage(available, total)
        } else {
            0.0
        };
    }

    /// Statistics over outcomes strictly newer than `since`.
    pub fn windowed_stats(&self, since: DateTime<Utc>) -> Stats {
        Stats::from_outcomes(self.since(since))
    }

    /// Apply the up/down policy to the current availability.
    ///
    /// Targets without data are skipped. Exactly
    /// [`AVAILABILITY_THRESHOLD`] never changes the status.
    pub fn evaluate(&mut self) -> Option<Transition> {
        if self.availability == 0.0 {
            return None;
        }

        match self.status {
            TargetStatus::Down if self.availability > AVAILABILITY_THRESHOLD => {
                self.set_up();
                Some(Transition::Recovered)
            }
            TargetStatus::Up if self.availability < AVAILABILITY_THRESHOLD => {
                self.set_down();
                Some(Transition::Down {
                    availability: self.availability,
                })
            }
            _ => None,
        }
    }

    // History is kept sorted newest first, so the scan stops at the first old
    // outcome. Windows are measured on the wall clock: a clock step moves
    // every window with it.
    fn since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &ProbeOutcome> {
        self.history
            .iter()
            .take_while(move |outcome| outcome.timestamp() > since)
    }
}

fn parse_interval(value: &Value) -> Option<u64> {
    let interval = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (interval > 0).then_some(interval)
}
