//! Host applier.

use tracing::debug;
use vigil_config::HostConfig;
use vigil_core::ObjectId;

use crate::broker::ObjectKind;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::runtime::HostRuntime;

impl Engine {
    /// Creates the runtime host for a new configuration object.
    ///
    /// Parents that already exist are linked immediately; parents added
    /// later in the same cycle are picked up by [`Engine::resolve_hosts`],
    /// which also rejects names that never materialize.
    pub(crate) fn add_host(&mut self, obj: &HostConfig) -> EngineResult<()> {
        debug!(host = %obj.name, "creating new host");
        if self.runtime.host(&obj.name).is_some() {
            return Err(EngineError::configuration(format!(
                "cannot create already existing host '{}'",
                obj.name
            )));
        }

        let id = self.runtime.allocate_id();
        let mut host = HostRuntime::from_config(id, obj);
        let parent_ids: Vec<ObjectId> = obj
            .parents
            .iter()
            .filter_map(|parent| self.runtime.host(parent).map(|p| p.id))
            .collect();
        host.parents.extend(parent_ids.iter().copied());
        self.runtime.insert_host(host);
        for parent_id in parent_ids {
            let Some(parent_name) = self.runtime.host_name(parent_id).map(str::to_string) else {
                continue;
            };
            if let Some(parent) = self.runtime.host_mut(&parent_name) {
                parent.children.insert(id);
            }
        }

        self.config.hosts.insert(obj.name.clone(), obj.clone());
        self.broker.object_added(ObjectKind::Host, &obj.name);
        Ok(())
    }

    /// Applies a modified configuration to the existing runtime host,
    /// preserving its operational state.
    pub(crate) fn modify_host(&mut self, obj: &HostConfig) -> EngineResult<()> {
        debug!(host = %obj.name, "modifying host");
        let Some(old) = self.config.hosts.get(&obj.name).cloned() else {
            return Err(EngineError::configuration(format!(
                "cannot modify non-existing host '{}'",
                obj.name
            )));
        };
        let Some(host) = self.runtime.host_mut(&obj.name) else {
            return Err(EngineError::internal(format!(
                "host '{}' is applied but missing from the runtime table",
                obj.name
            )));
        };
        let id = host.id;
        host.apply_config(obj);

        if old.parents != obj.parents {
            self.relink_parents(&obj.name, id, &obj.parents);
        }

        self.config.hosts.insert(obj.name.clone(), obj.clone());
        self.broker.object_updated(ObjectKind::Host, &obj.name);
        Ok(())
    }

    /// Removes a host, its pending check events and every edge pointing at
    /// it. Removing an already absent host only clears the configuration
    /// entry.
    pub(crate) fn remove_host(&mut self, obj: &HostConfig) -> EngineResult<()> {
        debug!(host = %obj.name, "removing host");
        if let Some(host) = self.runtime.host(&obj.name) {
            let id = host.id;
            self.unschedule_host_checks(id);
            if let Some((_, cascaded)) = self.runtime.remove_host(&obj.name) {
                for downtime_id in cascaded {
                    self.broker
                        .object_removed(ObjectKind::Downtime, &downtime_id.to_string());
                }
            }
            self.broker.object_removed(ObjectKind::Host, &obj.name);
        }
        self.config.hosts.remove(&obj.name);
        Ok(())
    }

    /// Rebuilds the parent/child graph from the applied configuration and
    /// validates that every referenced name resolves.
    pub(crate) fn resolve_hosts(&mut self) -> EngineResult<()> {
        for host in self.runtime.hosts.values_mut() {
            host.parents.clear();
            host.children.clear();
        }

        let references: Vec<(String, Vec<String>, Option<String>)> = self
            .config
            .hosts
            .values()
            .map(|h| (h.name.clone(), h.parents.clone(), h.check_period.clone()))
            .collect();

        for (name, parents, check_period) in references {
            if let Some(period) = &check_period
                && !self.config.timeperiods.contains_key(period)
            {
                return Err(EngineError::validation(format!(
                    "host '{name}' refers to non-existing check period '{period}'"
                )));
            }
            let id = self
                .runtime
                .host(&name)
                .ok_or_else(|| {
                    EngineError::internal(format!(
                        "host '{name}' is applied but missing from the runtime table"
                    ))
                })?
                .id;
            for parent in &parents {
                let parent_id = self
                    .runtime
                    .host(parent)
                    .ok_or_else(|| {
                        EngineError::validation(format!(
                            "host '{name}' has non-existing parent '{parent}'"
                        ))
                    })?
                    .id;
                if let Some(host) = self.runtime.host_mut(&name) {
                    host.parents.insert(parent_id);
                }
                if let Some(parent) = self.runtime.host_mut(parent) {
                    parent.children.insert(id);
                }
            }
        }
        Ok(())
    }

    /// Drops the host's current parent links (both directions) and links
    /// the parents of the new configuration that already exist.
    fn relink_parents(&mut self, name: &str, id: ObjectId, new_parents: &[String]) {
        let old_parents: Vec<ObjectId> = self
            .runtime
            .host(name)
            .map(|h| h.parents.iter().copied().collect())
            .unwrap_or_default();
        for parent_id in old_parents {
            let Some(parent_name) = self.runtime.host_name(parent_id).map(str::to_string) else {
                continue;
            };
            if let Some(parent) = self.runtime.host_mut(&parent_name) {
                parent.children.remove(&id);
            }
        }
        if let Some(host) = self.runtime.host_mut(name) {
            host.parents.clear();
        }

        for parent_name in new_parents {
            let Some(parent_id) = self.runtime.host(parent_name).map(|p| p.id) else {
                continue;
            };
            if let Some(host) = self.runtime.host_mut(name) {
                host.parents.insert(parent_id);
            }
            if let Some(parent) = self.runtime.host_mut(parent_name) {
                parent.children.insert(id);
            }
        }
    }
}
