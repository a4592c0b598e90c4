//! The runtime object table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use vigil_config::{HostDependencyConfig, ServiceDependencyConfig, ServiceKey};
use vigil_core::{IdAllocator, ObjectId};

use super::dependency::{HostDependencyRuntime, ServiceDependencyRuntime};
use super::downtime::DowntimeRuntime;
use super::host::HostRuntime;
use super::service::ServiceRuntime;

/// Owner of every runtime object and of the id allocator.
///
/// Collections are keyed by natural key; reverse maps translate an
/// [`ObjectId`] back to its key so graph edges (which are id sets) can be
/// followed. Dependencies are keyed by their configuration content, the
/// same identity the configuration sets use.
///
/// The `remove_*` methods are authoritative: they unlink the object from
/// every other object referencing it before releasing it, so the graph
/// never holds an edge to a missing object.
#[derive(Debug, Default)]
pub struct RuntimeTable {
    alloc: IdAllocator,
    /// Hosts by name.
    pub hosts: BTreeMap<String, HostRuntime>,
    /// Services by (host, description).
    pub services: BTreeMap<ServiceKey, ServiceRuntime>,
    /// Host dependencies by configuration content.
    pub host_dependencies: BTreeMap<HostDependencyConfig, HostDependencyRuntime>,
    /// Service dependencies by configuration content.
    pub service_dependencies: BTreeMap<ServiceDependencyConfig, ServiceDependencyRuntime>,
    /// Downtimes by downtime id.
    pub downtimes: BTreeMap<u64, DowntimeRuntime>,
    /// Host group memberships: group name to member host ids.
    pub group_members: BTreeMap<String, BTreeSet<ObjectId>>,
    host_names: HashMap<ObjectId, String>,
    service_keys: HashMap<ObjectId, ServiceKey>,
}

impl RuntimeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh object id.
    pub fn allocate_id(&mut self) -> ObjectId {
        self.alloc.allocate()
    }

    /// Looks up a host by name.
    pub fn host(&self, name: &str) -> Option<&HostRuntime> {
        self.hosts.get(name)
    }

    /// Looks up a host mutably by name.
    pub fn host_mut(&mut self, name: &str) -> Option<&mut HostRuntime> {
        self.hosts.get_mut(name)
    }

    /// Translates a host id back to its name.
    pub fn host_name(&self, id: ObjectId) -> Option<&str> {
        self.host_names.get(&id).map(String::as_str)
    }

    /// Looks up a service by key.
    pub fn service(&self, key: &ServiceKey) -> Option<&ServiceRuntime> {
        self.services.get(key)
    }

    /// Looks up a service mutably by key.
    pub fn service_mut(&mut self, key: &ServiceKey) -> Option<&mut ServiceRuntime> {
        self.services.get_mut(key)
    }

    /// Translates a service id back to its key.
    pub fn service_key(&self, id: ObjectId) -> Option<&ServiceKey> {
        self.service_keys.get(&id)
    }

    /// Inserts a host, registering the reverse id mapping.
    pub fn insert_host(&mut self, host: HostRuntime) {
        self.host_names.insert(host.id, host.name.clone());
        self.hosts.insert(host.name.clone(), host);
    }

    /// Removes a host and every edge pointing at it.
    ///
    /// Downtimes targeting the host are removed in cascade; their ids are
    /// returned so the caller can announce them. Services owned by the host
    /// are not touched: their own removals run separately.
    pub fn remove_host(&mut self, name: &str) -> Option<(HostRuntime, Vec<u64>)> {
        let host = self.hosts.remove(name)?;
        self.host_names.remove(&host.id);

        for parent_id in &host.parents {
            if let Some(parent_name) = self.host_names.get(parent_id).cloned()
                && let Some(parent) = self.hosts.get_mut(&parent_name)
            {
                parent.children.remove(&host.id);
            }
        }
        for child_id in &host.children {
            if let Some(child_name) = self.host_names.get(child_id).cloned()
                && let Some(child) = self.hosts.get_mut(&child_name)
            {
                child.parents.remove(&host.id);
            }
        }
        for members in self.group_members.values_mut() {
            members.remove(&host.id);
        }

        let mut removed_downtimes = Vec::new();
        for downtime_id in &host.downtimes {
            if self.downtimes.remove(downtime_id).is_some() {
                removed_downtimes.push(*downtime_id);
            }
        }

        Some((host, removed_downtimes))
    }

    /// Inserts a service, linking it into its host's service set.
    pub fn insert_service(&mut self, service: ServiceRuntime) {
        if let Some(host_name) = self.host_names.get(&service.host_id).cloned()
            && let Some(host) = self.hosts.get_mut(&host_name)
        {
            host.services.insert(service.id);
        }
        self.service_keys.insert(service.id, service.key());
        self.services.insert(service.key(), service);
    }

    /// Removes a service and every edge pointing at it.
    ///
    /// Tolerates a host that has already been removed in the same cycle.
    pub fn remove_service(&mut self, key: &ServiceKey) -> Option<(ServiceRuntime, Vec<u64>)> {
        let service = self.services.remove(key)?;
        self.service_keys.remove(&service.id);

        if let Some(host_name) = self.host_names.get(&service.host_id).cloned()
            && let Some(host) = self.hosts.get_mut(&host_name)
        {
            host.services.remove(&service.id);
        }

        let mut removed_downtimes = Vec::new();
        for downtime_id in &service.downtimes {
            if self.downtimes.remove(downtime_id).is_some() {
                removed_downtimes.push(*downtime_id);
            }
        }

        Some((service, removed_downtimes))
    }

    /// Inserts a host dependency under its configuration key.
    pub fn insert_host_dependency(
        &mut self,
        key: HostDependencyConfig,
        dependency: HostDependencyRuntime,
    ) {
        self.host_dependencies.insert(key, dependency);
    }

    /// Removes a host dependency by configuration key.
    pub fn remove_host_dependency(
        &mut self,
        key: &HostDependencyConfig,
    ) -> Option<HostDependencyRuntime> {
        self.host_dependencies.remove(key)
    }

    /// Inserts a service dependency under its configuration key.
    pub fn insert_service_dependency(
        &mut self,
        key: ServiceDependencyConfig,
        dependency: ServiceDependencyRuntime,
    ) {
        self.service_dependencies.insert(key, dependency);
    }

    /// Removes a service dependency by configuration key.
    pub fn remove_service_dependency(
        &mut self,
        key: &ServiceDependencyConfig,
    ) -> Option<ServiceDependencyRuntime> {
        self.service_dependencies.remove(key)
    }

    /// Inserts a downtime, linking it into its target's downtime set.
    pub fn insert_downtime(&mut self, downtime: DowntimeRuntime) {
        match downtime.target.service_key() {
            Some(key) => {
                if let Some(service) = self.services.get_mut(&key) {
                    service.downtimes.insert(downtime.downtime_id);
                }
            }
            None => {
                if let Some(host) = self.hosts.get_mut(downtime.target.host_name()) {
                    host.downtimes.insert(downtime.downtime_id);
                }
            }
        }
        self.downtimes.insert(downtime.downtime_id, downtime);
    }

    /// Removes a downtime and its back-reference.
    pub fn remove_downtime(&mut self, downtime_id: u64) -> Option<DowntimeRuntime> {
        let downtime = self.downtimes.remove(&downtime_id)?;
        match downtime.target.service_key() {
            Some(key) => {
                if let Some(service) = self.services.get_mut(&key) {
                    service.downtimes.remove(&downtime_id);
                }
            }
            None => {
                if let Some(host) = self.hosts.get_mut(downtime.target.host_name()) {
                    host.downtimes.remove(&downtime_id);
                }
            }
        }
        Some(downtime)
    }

    /// Total number of runtime objects across all kinds.
    pub fn object_count(&self) -> usize {
        self.hosts.len()
            + self.services.len()
            + self.host_dependencies.len()
            + self.service_dependencies.len()
            + self.downtimes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigil_config::{DowntimeConfig, DowntimeTarget, HostConfig, ServiceConfig};

    fn table_with_host(name: &str) -> RuntimeTable {
        let mut table = RuntimeTable::new();
        let id = table.allocate_id();
        table.insert_host(HostRuntime::from_config(id, &HostConfig::new(name)));
        table
    }

    #[test]
    fn host_removal_unlinks_parents_and_children() {
        let mut table = RuntimeTable::new();
        let gw = table.allocate_id();
        let web = table.allocate_id();
        table.insert_host(HostRuntime::from_config(gw, &HostConfig::new("gw")));
        table.insert_host(HostRuntime::from_config(web, &HostConfig::new("web-1")));
        table.host_mut("web-1").unwrap().parents.insert(gw);
        table.host_mut("gw").unwrap().children.insert(web);

        table.remove_host("gw").unwrap();

        assert!(table.host("web-1").unwrap().parents.is_empty());
        assert!(table.host_name(gw).is_none());
    }

    #[test]
    fn host_removal_is_idempotent() {
        let mut table = table_with_host("web-1");
        assert!(table.remove_host("web-1").is_some());
        assert!(table.remove_host("web-1").is_none());
    }

    #[test]
    fn host_removal_cascades_its_downtimes() {
        let mut table = table_with_host("web-1");
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
        let id = table.allocate_id();
        table.insert_downtime(DowntimeRuntime::from_config(
            id,
            &DowntimeConfig::new(7, DowntimeTarget::Host { host: "web-1".into() }, start, end),
        ));

        let (_, cascaded) = table.remove_host("web-1").unwrap();
        assert_eq!(cascaded, vec![7]);
        assert!(table.downtimes.is_empty());
    }

    #[test]
    fn service_links_to_its_host() {
        let mut table = table_with_host("web-1");
        let host_id = table.host("web-1").unwrap().id;
        let id = table.allocate_id();
        table.insert_service(ServiceRuntime::from_config(
            id,
            host_id,
            &ServiceConfig::new("web-1", "http"),
        ));

        assert!(table.host("web-1").unwrap().services.contains(&id));

        let key = ("web-1".to_string(), "http".to_string());
        table.remove_service(&key).unwrap();
        assert!(table.host("web-1").unwrap().services.is_empty());
        assert!(table.service_key(id).is_none());
    }

    #[test]
    fn group_membership_is_cleared_on_host_removal() {
        let mut table = table_with_host("web-1");
        let id = table.host("web-1").unwrap().id;
        table
            .group_members
            .entry("frontends".to_string())
            .or_default()
            .insert(id);

        table.remove_host("web-1").unwrap();
        assert!(table.group_members["frontends"].is_empty());
    }
}
