//! Service runtime objects.

use std::collections::{BTreeMap, BTreeSet};

use vigil_config::{ServiceConfig, ServiceKey};
use vigil_core::ObjectId;

use super::{CheckInfo, StateType};

/// Current state of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceState {
    /// Passing its check.
    #[default]
    Ok,
    /// Degraded.
    Warning,
    /// Failing.
    Critical,
    /// Check result could not be interpreted.
    Unknown,
}

/// The mutable runtime counterpart of a [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceRuntime {
    /// Stable handle.
    pub id: ObjectId,
    /// Id of the owning host.
    pub host_id: ObjectId,
    /// Name of the owning host.
    pub host_name: String,
    /// Service description.
    pub description: String,
    /// Check command line.
    pub check_command: String,
    /// Check period name; `None` means always checkable.
    pub check_period: Option<String>,
    /// Normal check interval in seconds.
    pub check_interval: f64,
    /// Retry interval in seconds.
    pub retry_interval: f64,
    /// Soft attempts before a state hardens.
    pub max_check_attempts: u32,
    /// Whether active checks run.
    pub checks_enabled: bool,
    /// Whether passive result freshness is checked.
    pub check_freshness: bool,
    /// Freshness threshold in seconds.
    pub freshness_threshold: u32,
    /// Event handler command.
    pub event_handler: Option<String>,
    /// Whether the event handler runs.
    pub event_handler_enabled: bool,
    /// Whether flap detection runs.
    pub flap_detection_enabled: bool,
    /// Low flap threshold in percent.
    pub low_flap_threshold: f64,
    /// High flap threshold in percent.
    pub high_flap_threshold: f64,
    /// Whether the obsession handler runs.
    pub obsess: bool,
    /// Volatile services re-notify on every bad result.
    pub volatile: bool,
    /// Custom variables.
    pub custom_variables: BTreeMap<String, String>,
    /// Fixed UTC offset in seconds for period evaluation.
    pub utc_offset: Option<i32>,

    /// Current state.
    pub state: ServiceState,
    /// Soft or hard.
    pub state_type: StateType,
    /// Check bookkeeping.
    pub check: CheckInfo,

    /// Ids of downtimes targeting this service.
    pub downtimes: BTreeSet<u64>,
}

impl ServiceRuntime {
    /// Creates a runtime service from its configuration, attached to the
    /// given host.
    pub fn from_config(id: ObjectId, host_id: ObjectId, config: &ServiceConfig) -> Self {
        let mut service = Self {
            id,
            host_id,
            host_name: config.host_name.clone(),
            description: config.description.clone(),
            check_command: String::new(),
            check_period: None,
            check_interval: 0.0,
            retry_interval: 0.0,
            max_check_attempts: 0,
            checks_enabled: false,
            check_freshness: false,
            freshness_threshold: 0,
            event_handler: None,
            event_handler_enabled: false,
            flap_detection_enabled: false,
            low_flap_threshold: 0.0,
            high_flap_threshold: 0.0,
            obsess: false,
            volatile: false,
            custom_variables: BTreeMap::new(),
            utc_offset: None,
            state: ServiceState::Ok,
            state_type: StateType::Hard,
            check: CheckInfo::default(),
            downtimes: BTreeSet::new(),
        };
        service.apply_config(config);
        service
    }

    /// Applies configuration scalars in place, leaving operational state
    /// untouched.
    pub fn apply_config(&mut self, config: &ServiceConfig) {
        self.check_command = config.check_command.clone();
        self.check_period = config.check_period.clone();
        self.check_interval = config.check_interval;
        self.retry_interval = config.retry_interval;
        self.max_check_attempts = config.max_check_attempts;
        self.checks_enabled = config.active_checks_enabled;
        self.check_freshness = config.check_freshness;
        self.freshness_threshold = config.freshness_threshold;
        self.event_handler = config.event_handler.clone();
        self.event_handler_enabled = config.event_handler_enabled;
        self.flap_detection_enabled = config.flap_detection_enabled;
        self.low_flap_threshold = config.low_flap_threshold;
        self.high_flap_threshold = config.high_flap_threshold;
        self.obsess = config.obsess;
        self.volatile = config.volatile;
        self.custom_variables = config.custom_variables.clone();
        self.utc_offset = config.utc_offset;
    }

    /// Returns the natural key.
    pub fn key(&self) -> ServiceKey {
        (self.host_name.clone(), self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::IdAllocator;

    #[test]
    fn creation_binds_service_to_host() {
        let mut alloc = IdAllocator::new();
        let host_id = alloc.allocate();
        let config = ServiceConfig::new("web-1", "http").with_volatile(true);
        let service = ServiceRuntime::from_config(alloc.allocate(), host_id, &config);

        assert_eq!(service.host_id, host_id);
        assert_eq!(service.key(), ("web-1".to_string(), "http".to_string()));
        assert!(service.volatile);
        assert_eq!(service.state, ServiceState::Ok);
    }
}
