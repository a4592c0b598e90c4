//! Configuration snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vigil_core::TimePeriod;

use crate::dependency::{HostDependencyConfig, ServiceDependencyConfig};
use crate::downtime::DowntimeConfig;
use crate::error::ConfigError;
use crate::group::HostGroupConfig;
use crate::host::HostConfig;
use crate::options::EngineOptions;
use crate::service::{ServiceConfig, ServiceKey};

/// A complete, immutable-until-replaced configuration: one ordered, keyed
/// collection per entity kind plus the global scalar options.
///
/// The engine holds the snapshot it is currently running; a reconfiguration
/// diffs it against a freshly built one. The `add_*` methods reject
/// duplicate keys and are meant for snapshot construction; appliers mutate
/// the held snapshot through the public fields, mirroring the fact that an
/// applier's configuration-side insert/remove never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Time periods by name.
    pub timeperiods: BTreeMap<String, TimePeriod>,
    /// Hosts by name.
    pub hosts: BTreeMap<String, HostConfig>,
    /// Services by (host, description). Serialized as a list; the key is
    /// derived from the value on load.
    #[serde(
        serialize_with = "serialize_services",
        deserialize_with = "deserialize_services"
    )]
    pub services: BTreeMap<ServiceKey, ServiceConfig>,
    /// Host groups by name.
    pub hostgroups: BTreeMap<String, HostGroupConfig>,
    /// Host dependencies, keyed by their own content.
    pub host_dependencies: BTreeSet<HostDependencyConfig>,
    /// Service dependencies, keyed by their own content.
    pub service_dependencies: BTreeSet<ServiceDependencyConfig>,
    /// Downtimes by id.
    pub downtimes: BTreeMap<u64, DowntimeConfig>,
    /// Global scalar options.
    pub options: EngineOptions,
}

impl ConfigSnapshot {
    /// Creates an empty snapshot with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a time period, rejecting duplicate names.
    pub fn add_timeperiod(&mut self, period: TimePeriod) -> Result<(), ConfigError> {
        if self.timeperiods.contains_key(&period.name) {
            return Err(ConfigError::duplicate_key("timeperiod", &period.name));
        }
        self.timeperiods.insert(period.name.clone(), period);
        Ok(())
    }

    /// Adds a host, rejecting duplicate names.
    pub fn add_host(&mut self, host: HostConfig) -> Result<(), ConfigError> {
        if self.hosts.contains_key(&host.name) {
            return Err(ConfigError::duplicate_key("host", &host.name));
        }
        self.hosts.insert(host.name.clone(), host);
        Ok(())
    }

    /// Adds a service, rejecting duplicate (host, description) pairs.
    pub fn add_service(&mut self, service: ServiceConfig) -> Result<(), ConfigError> {
        let key = service.key();
        if self.services.contains_key(&key) {
            return Err(ConfigError::duplicate_key(
                "service",
                format!("{}/{}", key.0, key.1),
            ));
        }
        self.services.insert(key, service);
        Ok(())
    }

    /// Adds a host group, rejecting duplicate names.
    pub fn add_hostgroup(&mut self, group: HostGroupConfig) -> Result<(), ConfigError> {
        if self.hostgroups.contains_key(&group.name) {
            return Err(ConfigError::duplicate_key("hostgroup", &group.name));
        }
        self.hostgroups.insert(group.name.clone(), group);
        Ok(())
    }

    /// Adds a host dependency. Content-keyed, so re-adding the same
    /// dependency is a no-op rather than an error.
    pub fn add_host_dependency(&mut self, dependency: HostDependencyConfig) {
        self.host_dependencies.insert(dependency);
    }

    /// Adds a service dependency.
    pub fn add_service_dependency(&mut self, dependency: ServiceDependencyConfig) {
        self.service_dependencies.insert(dependency);
    }

    /// Adds a downtime, rejecting duplicate ids and inverted windows.
    pub fn add_downtime(&mut self, downtime: DowntimeConfig) -> Result<(), ConfigError> {
        if self.downtimes.contains_key(&downtime.id) {
            return Err(ConfigError::duplicate_key(
                "downtime",
                downtime.id.to_string(),
            ));
        }
        if downtime.end_time <= downtime.start_time {
            return Err(ConfigError::invalid(
                "downtime",
                downtime.id.to_string(),
                "window must end after it starts",
            ));
        }
        self.downtimes.insert(downtime.id, downtime);
        Ok(())
    }

    /// Total number of configuration objects across all kinds.
    pub fn object_count(&self) -> usize {
        self.timeperiods.len()
            + self.hosts.len()
            + self.services.len()
            + self.hostgroups.len()
            + self.host_dependencies.len()
            + self.service_dependencies.len()
            + self.downtimes.len()
    }
}

fn serialize_services<S>(
    services: &BTreeMap<ServiceKey, ServiceConfig>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(services.values())
}

fn deserialize_services<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ServiceKey, ServiceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let services = Vec::<ServiceConfig>::deserialize(deserializer)?;
    Ok(services.into_iter().map(|s| (s.key(), s)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_host_is_rejected() {
        let mut snapshot = ConfigSnapshot::new();
        snapshot.add_host(HostConfig::new("web-1")).unwrap();
        let err = snapshot.add_host(HostConfig::new("web-1")).unwrap_err();
        assert!(err.to_string().contains("web-1"));
    }

    #[test]
    fn duplicate_dependency_is_a_noop() {
        let mut snapshot = ConfigSnapshot::new();
        let dep = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        snapshot.add_host_dependency(dep.clone());
        snapshot.add_host_dependency(dep);
        assert_eq!(snapshot.host_dependencies.len(), 1);
    }

    #[test]
    fn snapshot_survives_json_round_trip() {
        let mut snapshot = ConfigSnapshot::new();
        snapshot
            .add_host(HostConfig::new("web-1").with_parents(vec!["gw".into()]))
            .unwrap();
        snapshot
            .add_service(ServiceConfig::new("web-1", "http"))
            .unwrap();
        snapshot.add_host_dependency(HostDependencyConfig::new(
            vec!["gw".into()],
            vec!["web-1".into()],
        ));

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ConfigSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn inverted_downtime_window_is_rejected() {
        use chrono::{TimeZone, Utc};

        use crate::downtime::{DowntimeConfig, DowntimeTarget};

        let mut snapshot = ConfigSnapshot::new();
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let err = snapshot
            .add_downtime(DowntimeConfig::new(
                7,
                DowntimeTarget::Host { host: "a".into() },
                start,
                end,
            ))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("end after it starts"));
    }

    #[test]
    fn object_count_sums_all_kinds() {
        let mut snapshot = ConfigSnapshot::new();
        snapshot.add_host(HostConfig::new("a")).unwrap();
        snapshot
            .add_service(ServiceConfig::new("a", "ping"))
            .unwrap();
        snapshot
            .add_timeperiod(TimePeriod::always("24x7"))
            .unwrap();
        assert_eq!(snapshot.object_count(), 3);
    }
}
