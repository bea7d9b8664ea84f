//! Suite execution configuration.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tokio::sync::Semaphore;
use tracing::Level;

/// Configuration for a suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Size of the worker pool for the parallel group.
    pub workers: usize,
    /// Level of per-stage events in the tracing logger
    /// (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            log_level: "info".to_string(),
        }
    }
}

impl SuiteConfig {
    /// Creates a default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker pool size.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the log level of per-stage events.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Worker pool size, between one and the semaphore permit limit.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.workers.clamp(1, Semaphore::MAX_PERMITS)
    }

    /// Parsed log level; `info` when unrecognised.
    #[must_use]
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_builders() {
        let config = SuiteConfig::new().with_workers(0).with_log_level("debug");
        assert_eq!(config.pool_size(), 1);
        assert_eq!(config.level(), Level::DEBUG);

        assert_eq!(SuiteConfig::new().with_log_level("loud").level(), Level::INFO);
        assert_eq!(
            SuiteConfig::new().with_workers(usize::MAX).pool_size(),
            Semaphore::MAX_PERMITS
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SuiteConfig = serde_json::from_str(r#"{"workers": 4}"#).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.log_level, "info");
    }
}
