//! Host group applier.
//!
//! Groups own no runtime object of their own; their runtime footprint is
//! the membership sets in the table, kept as host ids so dependency
//! expansion and status reporting never chase names.

use std::collections::BTreeSet;

use tracing::debug;
use vigil_config::HostGroupConfig;

use crate::broker::ObjectKind;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    pub(crate) fn add_hostgroup(&mut self, obj: &HostGroupConfig) -> EngineResult<()> {
        debug!(group = %obj.name, "creating new host group");
        if self.config.hostgroups.contains_key(&obj.name) {
            return Err(EngineError::configuration(format!(
                "cannot create already existing host group '{}'",
                obj.name
            )));
        }
        self.rebuild_membership(obj);
        self.config.hostgroups.insert(obj.name.clone(), obj.clone());
        self.broker.object_added(ObjectKind::HostGroup, &obj.name);
        Ok(())
    }

    pub(crate) fn modify_hostgroup(&mut self, obj: &HostGroupConfig) -> EngineResult<()> {
        debug!(group = %obj.name, "modifying host group");
        if !self.config.hostgroups.contains_key(&obj.name) {
            return Err(EngineError::configuration(format!(
                "cannot modify non-existing host group '{}'",
                obj.name
            )));
        }
        self.rebuild_membership(obj);
        self.config.hostgroups.insert(obj.name.clone(), obj.clone());
        self.broker.object_updated(ObjectKind::HostGroup, &obj.name);
        Ok(())
    }

    pub(crate) fn remove_hostgroup(&mut self, obj: &HostGroupConfig) -> EngineResult<()> {
        debug!(group = %obj.name, "removing host group");
        self.runtime.group_members.remove(&obj.name);
        if self.config.hostgroups.remove(&obj.name).is_some() {
            self.broker.object_removed(ObjectKind::HostGroup, &obj.name);
        }
        Ok(())
    }

    /// Validates that every group member resolves to an applied host and
    /// rebuilds the membership sets from scratch.
    pub(crate) fn resolve_hostgroups(&mut self) -> EngineResult<()> {
        let groups: Vec<HostGroupConfig> = self.config.hostgroups.values().cloned().collect();
        for group in &groups {
            for member in &group.members {
                if !self.config.hosts.contains_key(member) {
                    return Err(EngineError::validation(format!(
                        "host group '{}' has non-existing member '{member}'",
                        group.name
                    )));
                }
            }
            self.rebuild_membership(group);
        }
        Ok(())
    }

    /// Replaces a group's membership set with the ids of its members that
    /// currently exist; members created later in the cycle are picked up
    /// by the resolve pass.
    fn rebuild_membership(&mut self, group: &HostGroupConfig) {
        let members: BTreeSet<_> = group
            .members
            .iter()
            .filter_map(|name| self.runtime.host(name).map(|h| h.id))
            .collect();
        self.runtime
            .group_members
            .insert(group.name.clone(), members);
    }
}
