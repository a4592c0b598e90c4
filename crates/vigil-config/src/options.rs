//! Global engine options.
//!
//! Scalar settings that are not tied to any monitored object. The scheduler
//! reads these to maintain its periodic maintenance events; it recreates an
//! event whenever the interval or toggle that drives it changes between
//! reconfigurations.

use serde::{Deserialize, Serialize};

/// Global scalar configuration consumed by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Seconds between check-result reaper runs.
    pub check_reaper_interval: i64,
    /// Seconds between external-command polls; `None` selects the built-in
    /// default of five seconds.
    pub command_check_interval: Option<i64>,
    /// Whether host result freshness is swept.
    pub check_host_freshness: bool,
    /// Seconds between host freshness sweeps.
    pub host_freshness_check_interval: i64,
    /// Whether service result freshness is swept.
    pub check_service_freshness: bool,
    /// Seconds between service freshness sweeps.
    pub service_freshness_check_interval: i64,
    /// Seconds between automatic check rescheduling runs.
    pub auto_rescheduling_interval: i64,
    /// Minutes between retention saves.
    pub retention_update_interval: i64,
    /// Seconds between status file updates.
    pub status_update_interval: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            check_reaper_interval: 10,
            command_check_interval: None,
            check_host_freshness: false,
            host_freshness_check_interval: 60,
            check_service_freshness: true,
            service_freshness_check_interval: 60,
            auto_rescheduling_interval: 30,
            retention_update_interval: 60,
            status_update_interval: 60,
        }
    }
}

impl EngineOptions {
    /// Returns the effective command-check interval in seconds.
    pub fn effective_command_check_interval(&self) -> i64 {
        self.command_check_interval.unwrap_or(5)
    }

    /// Builder: set the reaper interval.
    #[must_use]
    pub fn with_check_reaper_interval(mut self, seconds: i64) -> Self {
        self.check_reaper_interval = seconds;
        self
    }

    /// Builder: enable or disable host freshness sweeps.
    #[must_use]
    pub fn with_host_freshness(mut self, enabled: bool, interval: i64) -> Self {
        self.check_host_freshness = enabled;
        self.host_freshness_check_interval = interval;
        self
    }

    /// Builder: enable or disable service freshness sweeps.
    #[must_use]
    pub fn with_service_freshness(mut self, enabled: bool, interval: i64) -> Self {
        self.check_service_freshness = enabled;
        self.service_freshness_check_interval = interval;
        self
    }

    /// Builder: set the retention save interval in minutes.
    #[must_use]
    pub fn with_retention_update_interval(mut self, minutes: i64) -> Self {
        self.retention_update_interval = minutes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_check_interval_defaults_to_five_seconds() {
        let options = EngineOptions::default();
        assert!(options.command_check_interval.is_none());
        assert_eq!(options.effective_command_check_interval(), 5);

        let options = EngineOptions {
            command_check_interval: Some(30),
            ..Default::default()
        };
        assert_eq!(options.effective_command_check_interval(), 30);
    }

    #[test]
    fn builders() {
        let options = EngineOptions::default()
            .with_host_freshness(true, 120)
            .with_retention_update_interval(15);
        assert!(options.check_host_freshness);
        assert_eq!(options.host_freshness_check_interval, 120);
        assert_eq!(options.retention_update_interval, 15);
    }
}
