//! Configuration module for sitewatch.
//!
//! Process settings come from environment variables with sensible defaults;
//! the monitored targets come from a JSON file mapping each target name to
//! its `interval` (seconds) and `url`:
//!
//! ```json
//! {
//!     "example": { "interval": 5, "url": "https://example.com" }
//! }
//! ```

use crate::target::{Target, ValidationError, DEFAULT_RETENTION_MINUTES, MAX_RETENTION_MINUTES};

use chrono::Duration as ChronoDuration;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid targets file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no targets configured")]
    NoTargets,
    #[error("target {0:?} must be an object with interval and url")]
    Entry(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("log directory {0} does not exist")]
    LogDir(String),
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Path to the targets file (default: "targets.json")
    pub targets_path: PathBuf,
    /// Directory for the log file; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Log file name without extension (default: "sitewatch")
    pub log_file_name: String,
    /// How long each target keeps its history (default: 60, at most one week)
    pub retention_minutes: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets_path: PathBuf::from("targets.json"),
            log_dir: None,
            log_file_name: "sitewatch".to_string(),
            retention_minutes: DEFAULT_RETENTION_MINUTES,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SITEWATCH_TARGETS`: targets file path (default: "targets.json")
    /// - `SITEWATCH_LOG_DIR`: directory for the log file (default: none)
    /// - `SITEWATCH_LOG_FILE`: log file name without extension (default: "sitewatch")
    /// - `SITEWATCH_RETENTION_MINUTES`: history retention (default: 60, capped at one week)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(path) = lookup("SITEWATCH_TARGETS") {
            cfg.targets_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("SITEWATCH_LOG_DIR") {
            cfg.log_dir = Some(PathBuf::from(dir));
        }

        if let Some(name) = lookup("SITEWATCH_LOG_FILE") {
            cfg.log_file_name = name;
        }

        if let Some(minutes) = lookup("SITEWATCH_RETENTION_MINUTES") {
            if let Ok(minutes) = minutes.trim().parse::<i64>() {
                cfg.retention_minutes = minutes.clamp(DEFAULT_RETENTION_MINUTES, MAX_RETENTION_MINUTES);
            }
        }

        cfg
    }

    /// Path of the log file, if file logging is configured.
    ///
    /// Fails when the configured directory does not exist.
    pub fn log_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        if !dir.is_dir() {
            return Err(ConfigError::LogDir(dir.display().to_string()));
        }
        Ok(Some(dir.join(format!("{}.log", self.log_file_name))))
    }

    /// Read and validate the targets file.
    pub fn load_targets(&self) -> Result<Vec<Target>, ConfigError> {
        load_targets_file(
            &self.targets_path,
            ChronoDuration::minutes(
                self.retention_minutes
                    .clamp(DEFAULT_RETENTION_MINUTES, MAX_RETENTION_MINUTES),
            ),
        )
    }
}

pub fn load_targets_file(path: &Path, retention: ChronoDuration) -> Result<Vec<Target>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_targets(&text, retention)
}

/// Build targets from the JSON text of a targets file.
pub fn parse_targets(text: &str, retention: ChronoDuration) -> Result<Vec<Target>, ConfigError> {
    let raw: Map<String, Value> = serde_json::from_str(text)?;
    if raw.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    raw.iter()
        .map(|(name, entry)| -> Result<Target, ConfigError> {
            let fields = entry
                .as_object()
                .ok_or_else(|| ConfigError::Entry(name.clone()))?;
            Ok(Target::from_fields(name, fields)?.with_retention(retention))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    fn retention() -> ChronoDuration {
        ChronoDuration::minutes(DEFAULT_RETENTION_MINUTES)
    }

    #[test]
    fn test_default_config() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.targets_path, PathBuf::from("targets.json"));
        assert!(cfg.log_dir.is_none());
        assert_eq!(cfg.log_file_name, "sitewatch");
        assert_eq!(cfg.retention_minutes, 60);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("SITEWATCH_TARGETS", "/etc/sitewatch/targets.json"),
            ("SITEWATCH_LOG_FILE", "monitor"),
            ("SITEWATCH_RETENTION_MINUTES", "90"),
        ]
        .into_iter()
        .collect();

        let cfg = MonitorConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.targets_path, PathBuf::from("/etc/sitewatch/targets.json"));
        assert_eq!(cfg.log_file_name, "monitor");
        assert_eq!(cfg.retention_minutes, 90);

        // Retention is never shorter than the longest report window
        let cfg = MonitorConfig::from_lookup(|key| {
            (key == "SITEWATCH_RETENTION_MINUTES").then(|| "5".to_string())
        });
        assert_eq!(cfg.retention_minutes, 60);
    }

    #[test]
    fn test_oversized_retention_is_capped() {
        let cfg = MonitorConfig::from_lookup(|key| {
            (key == "SITEWATCH_RETENTION_MINUTES").then(|| "1000000000000".to_string())
        });
        assert_eq!(cfg.retention_minutes, MAX_RETENTION_MINUTES);

        let mut targets = assert_ok!(parse_targets(
            r#"{"a": {"interval": 5, "url": "http://a"}}"#,
            ChronoDuration::minutes(cfg.retention_minutes),
        ));
        let now = chrono::Utc::now();
        targets[0].record_outcome_at(crate::probe::ProbeOutcome::responded(200, 0.1, now), now);
        assert_eq!(targets[0].availability(), 100.0);
    }

    #[test]
    fn test_log_file() {
        let cfg = MonitorConfig::default();
        assert!(assert_ok!(cfg.log_file()).is_none());

        let dir = tempfile::tempdir().unwrap();
        let cfg = MonitorConfig {
            log_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(
            assert_ok!(cfg.log_file()),
            Some(dir.path().join("sitewatch.log"))
        );

        let cfg = MonitorConfig {
            log_dir: Some(dir.path().join("missing")),
            ..Default::default()
        };
        assert!(matches!(assert_err!(cfg.log_file()), ConfigError::LogDir(_)));
    }

    #[test]
    fn test_load_targets_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{
                "google": {{ "interval": 5, "url": "https://google.com" }},
                "local": {{ "interval": "2", "url": "localhost:8080" }}
            }}"#
        )
        .unwrap();

        let cfg = MonitorConfig {
            targets_path: tmp.path().to_path_buf(),
            ..Default::default()
        };
        let targets = assert_ok!(cfg.load_targets());
        assert_eq!(targets.len(), 2);

        let google = targets.iter().find(|t| t.name() == "google").unwrap();
        assert_eq!(google.interval(), 5);
        assert_eq!(google.url(), "https://google.com");

        let local = targets.iter().find(|t| t.name() == "local").unwrap();
        assert_eq!(local.interval(), 2);
    }

    #[test]
    fn test_load_targets_missing_file() {
        let err = assert_err!(load_targets_file(Path::new("/nonexistent/targets.json"), retention()));
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_targets_errors() {
        assert!(matches!(parse_targets("{}", retention()), Err(ConfigError::NoTargets)));
        assert!(matches!(parse_targets("[1, 2]", retention()), Err(ConfigError::Json(_))));
        assert!(matches!(
            parse_targets(r#"{"a": "http://a"}"#, retention()),
            Err(ConfigError::Entry(name)) if name == "a"
        ));

        let err = assert_err!(parse_targets(r#"{"a": {"url": "http://a"}}"#, retention()));
        match err {
            ConfigError::Validation(ValidationError::Fields { name, missing, .. }) => {
                assert_eq!(name, "a");
                assert_eq!(missing, vec!["interval"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
