//! Host configuration objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative description of a monitored host.
///
/// A host configuration is immutable once inserted into a snapshot; change
/// is expressed by replacing the snapshot. The natural key is the host name.
/// Equality is deep: every scalar and collection field participates, which
/// is what the differ relies on to classify a host as modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host name, the natural key.
    pub name: String,
    /// Display alias; falls back to the name when empty.
    pub alias: String,
    /// Network address.
    pub address: String,
    /// Check command line.
    pub check_command: String,
    /// Name of the check period; `None` means always checkable.
    pub check_period: Option<String>,
    /// Normal check interval in seconds.
    pub check_interval: f64,
    /// Retry interval in seconds, used while in a soft state.
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
    /// Parent host names.
    pub parents: Vec<String>,
    /// Custom variables, ordered by name.
    pub custom_variables: BTreeMap<String, String>,
    /// Fixed UTC offset in seconds for period evaluation; `None` means UTC.
    pub utc_offset: Option<i32>,
}

impl HostConfig {
    /// Creates a host configuration with engine defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            address: String::new(),
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
            parents: Vec::new(),
            custom_variables: BTreeMap::new(),
            utc_offset: None,
        }
    }

    /// Returns the natural key.
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Returns the alias, falling back to the host name when empty.
    pub fn display_alias(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Builder: set the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
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

    /// Builder: set parent host names.
    #[must_use]
    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }

    /// Builder: add a custom variable.
    #[must_use]
    pub fn with_custom_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.custom_variables.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_schedulable() {
        let host = HostConfig::new("web-1");
        assert_eq!(host.key(), "web-1");
        assert!(host.active_checks_enabled);
        assert!(host.check_interval > 0.0);
    }

    #[test]
    fn alias_falls_back_to_name() {
        let mut host = HostConfig::new("db-1");
        assert_eq!(host.display_alias(), "db-1");
        host.alias = "primary database".into();
        assert_eq!(host.display_alias(), "primary database");
    }

    #[test]
    fn equality_is_deep() {
        let a = HostConfig::new("a").with_parents(vec!["gw".into()]);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.custom_variables.insert("SNMP".into(), "v2c".into());
        assert_ne!(a, b);
    }
}
