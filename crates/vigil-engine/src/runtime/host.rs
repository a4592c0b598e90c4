//! Host runtime objects.

use std::collections::{BTreeMap, BTreeSet};

use vigil_config::HostConfig;
use vigil_core::ObjectId;

use super::{CheckInfo, StateType};

/// Current state of a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostState {
    /// Reachable and healthy.
    #[default]
    Up,
    /// Failing its check.
    Down,
    /// Unreachable through its parents.
    Unreachable,
}

/// The mutable runtime counterpart of a [`HostConfig`].
#[derive(Debug, Clone)]
pub struct HostRuntime {
    /// Stable handle, assigned at creation and never reused.
    pub id: ObjectId,
    /// Host name, the natural key.
    pub name: String,
    /// Display alias.
    pub alias: String,
    /// Network address.
    pub address: String,
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
    /// Custom variables.
    pub custom_variables: BTreeMap<String, String>,
    /// Fixed UTC offset in seconds for period evaluation.
    pub utc_offset: Option<i32>,

    /// Current state.
    pub state: HostState,
    /// Soft or hard.
    pub state_type: StateType,
    /// Check bookkeeping.
    pub check: CheckInfo,

    /// Ids of parent hosts.
    pub parents: BTreeSet<ObjectId>,
    /// Ids of child hosts.
    pub children: BTreeSet<ObjectId>,
    /// Ids of services attached to this host.
    pub services: BTreeSet<ObjectId>,
    /// Ids of downtimes targeting this host.
    pub downtimes: BTreeSet<u64>,
}

impl HostRuntime {
    /// Creates a runtime host from its configuration.
    pub fn from_config(id: ObjectId, config: &HostConfig) -> Self {
        let mut host = Self {
            id,
            name: config.name.clone(),
            alias: String::new(),
            address: String::new(),
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
            custom_variables: BTreeMap::new(),
            utc_offset: None,
            state: HostState::Up,
            state_type: StateType::Hard,
            check: CheckInfo::default(),
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            services: BTreeSet::new(),
            downtimes: BTreeSet::new(),
        };
        host.apply_config(config);
        host
    }

    /// Applies configuration scalars in place, leaving operational state
    /// and graph links untouched.
    pub fn apply_config(&mut self, config: &HostConfig) {
        self.alias = config.display_alias().to_string();
        self.address = config.address.clone();
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
        self.custom_variables = config.custom_variables.clone();
        self.utc_offset = config.utc_offset;
    }
}
