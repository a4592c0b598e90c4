//! Service configuration objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Natural key of a service: `(host name, service description)`.
pub type ServiceKey = (String, String);

/// Declarative description of a monitored service.
///
/// A service belongs to exactly one host. Equality is deep, like
/// [`HostConfig`](crate::HostConfig).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name of the owning host.
    pub host_name: String,
    /// Service description, unique per host.
    pub description: String,
    /// Check command line.
    pub check_command: String,
    /// Name of the check period; `None` means always checkable.
    pub check_period: Option<String>,
    /// Normal check interval in seconds.
    pub check_interval: f64,
    /// Retry interval in seconds.
    pub retry_interval: f64,
    /// Number of soft attempts before a state hardens.
    pub max_check_attempts: u32,
    /// Whether active checks are enabled.
    pub active_checks_enabled: bool,
    /// Whether passive result freshness is checked.
    pub check_freshness: bool,
    /// Freshness threshold in seconds.
    pub freshness_threshold: u32,
    /// Event handler command, if any.
    pub event_handler: Option<String>,
    /// Whether the event handler runs.
    pub event_handler_enabled: bool,
    /// Whether flap detection is enabled.
    pub flap_detection_enabled: bool,
    /// Low flap threshold in percent.
    pub low_flap_threshold: f64,
    /// High flap threshold in percent.
    pub high_flap_threshold: f64,
    /// Whether the obsession handler runs after each check.
    pub obsess: bool,
    /// Volatile services re-notify on every bad result.
    pub volatile: bool,
    /// Custom variables, ordered by name.
    pub custom_variables: BTreeMap<String, String>,
    /// Fixed UTC offset in seconds for period evaluation; `None` means UTC.
    pub utc_offset: Option<i32>,
}

impl ServiceConfig {
    /// Creates a service configuration with engine defaults.
    pub fn new(host_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            description: description.into(),
            check_command: String::new(),
            check_period: None,
            check_interval: 300.0,
            retry_interval: 60.0,
            max_check_attempts: 3,
            active_checks_enabled: true,
            check_freshness: false,
            freshness_threshold: 0,
            event_handler: None,
            event_handler_enabled: false,
            flap_detection_enabled: false,
            low_flap_threshold: 20.0,
            high_flap_threshold: 30.0,
            obsess: false,
            volatile: false,
            custom_variables: BTreeMap::new(),
            utc_offset: None,
        }
    }

    /// Returns the natural key.
    pub fn key(&self) -> ServiceKey {
        (self.host_name.clone(), self.description.clone())
    }

    /// Builder: set check and retry intervals in seconds.
    #[must_use]
    pub fn with_intervals(mut self, check: f64, retry: f64) -> Self {
        self.check_interval = check;
        self.retry_interval = retry;
        self
    }

    /// Builder: enable or disable active checks.
    #[must_use]
    pub fn with_active_checks(mut self, enabled: bool) -> Self {
        self.active_checks_enabled = enabled;
        self
    }

    /// Builder: set the check period name.
    #[must_use]
    pub fn with_check_period(mut self, period: impl Into<String>) -> Self {
        self.check_period = Some(period.into());
        self
    }

    /// Builder: mark the service volatile.
    #[must_use]
    pub fn with_volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }
}
