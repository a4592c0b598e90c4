//! Host and service dependency appliers.
//!
//! Dependencies are immutable: their identity is their content, so a
//! change arrives from the differ as a remove plus an add and the modify
//! operation always fails. The appliers refuse objects that still carry
//! group references; expansion must have rewritten them first.

use std::collections::BTreeMap;

use tracing::debug;
use vigil_config::{
    DependencyKind, HostDependencyConfig, ServiceDependencyConfig, ServiceKey,
};

use crate::broker::{ObjectKind, id_label, service_key_label};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::runtime::{HostDependencyRuntime, ServiceDependencyRuntime};

impl Engine {
    /// Instantiates a runtime host dependency from an expanded, concrete
    /// configuration object.
    pub(crate) fn add_host_dependency(&mut self, obj: &HostDependencyConfig) -> EngineResult<()> {
        if obj.needs_expansion() {
            return Err(EngineError::configuration(
                "could not create host dependency with multiple hosts or host groups; \
                 it must be expanded into one-to-one pairs first",
            ));
        }
        let (Some(depended), Some(dependent)) = (obj.depended_host(), obj.dependent_host()) else {
            return Err(EngineError::internal(
                "expanded host dependency lost its host references",
            ));
        };
        debug!(depended, dependent, kind = ?obj.kind, "creating new host dependency");

        let depended_id = self
            .runtime
            .host(depended)
            .ok_or_else(|| {
                EngineError::configuration(format!(
                    "host dependency refers to non-existing host '{depended}'"
                ))
            })?
            .id;
        let dependent_id = self
            .runtime
            .host(dependent)
            .ok_or_else(|| {
                EngineError::configuration(format!(
                    "host dependency refers to non-existing dependent host '{dependent}'"
                ))
            })?
            .id;
        let failure_options = match obj.kind {
            DependencyKind::Execution => obj.execution_failure_options,
            DependencyKind::Notification => obj.notification_failure_options,
            DependencyKind::Unexpanded => unreachable!("rejected above"),
        };

        let id = self.runtime.allocate_id();
        self.runtime.insert_host_dependency(
            obj.clone(),
            HostDependencyRuntime {
                id,
                kind: obj.kind,
                depended_host: depended_id,
                dependent_host: dependent_id,
                inherits_parent: obj.inherits_parent,
                failure_options,
                dependency_period: obj.dependency_period.clone(),
            },
        );
        self.config.host_dependencies.insert(obj.clone());
        self.broker
            .object_added(ObjectKind::HostDependency, &id_label(id));
        Ok(())
    }

    /// Dependencies cannot be modified; always fails.
    pub(crate) fn modify_host_dependency(
        &mut self,
        _obj: &HostDependencyConfig,
    ) -> EngineResult<()> {
        Err(EngineError::configuration(
            "host dependency objects can only be added or removed",
        ))
    }

    /// Removes a host dependency; removing an absent one only clears the
    /// configuration entry.
    pub(crate) fn remove_host_dependency(
        &mut self,
        obj: &HostDependencyConfig,
    ) -> EngineResult<()> {
        if let Some(dependency) = self.runtime.remove_host_dependency(obj) {
            debug!(id = %dependency.id, "removing host dependency");
            self.broker
                .object_removed(ObjectKind::HostDependency, &id_label(dependency.id));
        }
        self.config.host_dependencies.remove(obj);
        Ok(())
    }

    /// Instantiates a runtime service dependency from an expanded,
    /// concrete configuration object.
    pub(crate) fn add_service_dependency(
        &mut self,
        obj: &ServiceDependencyConfig,
    ) -> EngineResult<()> {
        if obj.needs_expansion() {
            return Err(EngineError::configuration(
                "could not create service dependency with multiple services or host groups; \
                 it must be expanded into one-to-one pairs first",
            ));
        }
        let (Some(depended), Some(dependent)) =
            (obj.depended_service(), obj.dependent_service())
        else {
            return Err(EngineError::internal(
                "expanded service dependency lost its service references",
            ));
        };
        let depended_label = service_key_label(depended.0, depended.1);
        let dependent_label = service_key_label(dependent.0, dependent.1);
        debug!(
            depended = %depended_label,
            dependent = %dependent_label,
            kind = ?obj.kind,
            "creating new service dependency"
        );

        let depended_key: ServiceKey = (depended.0.to_string(), depended.1.to_string());
        let dependent_key: ServiceKey = (dependent.0.to_string(), dependent.1.to_string());
        let depended_id = self
            .runtime
            .service(&depended_key)
            .ok_or_else(|| {
                EngineError::configuration(format!(
                    "service dependency refers to non-existing service '{depended_label}'"
                ))
            })?
            .id;
        let dependent_id = self
            .runtime
            .service(&dependent_key)
            .ok_or_else(|| {
                EngineError::configuration(format!(
                    "service dependency refers to non-existing dependent service \
                     '{dependent_label}'"
                ))
            })?
            .id;
        let failure_options = match obj.kind {
            DependencyKind::Execution => obj.execution_failure_options,
            DependencyKind::Notification => obj.notification_failure_options,
            DependencyKind::Unexpanded => unreachable!("rejected above"),
        };

        let id = self.runtime.allocate_id();
        self.runtime.insert_service_dependency(
            obj.clone(),
            ServiceDependencyRuntime {
                id,
                kind: obj.kind,
                depended_service: depended_id,
                dependent_service: dependent_id,
                inherits_parent: obj.inherits_parent,
                failure_options,
                dependency_period: obj.dependency_period.clone(),
            },
        );
        self.config.service_dependencies.insert(obj.clone());
        self.broker
            .object_added(ObjectKind::ServiceDependency, &id_label(id));
        Ok(())
    }

    /// Dependencies cannot be modified; always fails.
    pub(crate) fn modify_service_dependency(
        &mut self,
        _obj: &ServiceDependencyConfig,
    ) -> EngineResult<()> {
        Err(EngineError::configuration(
            "service dependency objects can only be added or removed",
        ))
    }

    /// Removes a service dependency; removing an absent one only clears
    /// the configuration entry.
    pub(crate) fn remove_service_dependency(
        &mut self,
        obj: &ServiceDependencyConfig,
    ) -> EngineResult<()> {
        if let Some(dependency) = self.runtime.remove_service_dependency(obj) {
            debug!(id = %dependency.id, "removing service dependency");
            self.broker
                .object_removed(ObjectKind::ServiceDependency, &id_label(dependency.id));
        }
        self.config.service_dependencies.remove(obj);
        Ok(())
    }

    /// Validates dependency periods and rejects circular dependency
    /// chains, separately per suppression kind.
    pub(crate) fn resolve_dependencies(&mut self) -> EngineResult<()> {
        for dep in &self.config.host_dependencies {
            if let Some(period) = &dep.dependency_period
                && !self.config.timeperiods.contains_key(period)
            {
                return Err(EngineError::validation(format!(
                    "host dependency refers to non-existing period '{period}'"
                )));
            }
        }
        for dep in &self.config.service_dependencies {
            if let Some(period) = &dep.dependency_period
                && !self.config.timeperiods.contains_key(period)
            {
                return Err(EngineError::validation(format!(
                    "service dependency refers to non-existing period '{period}'"
                )));
            }
        }

        for kind in [DependencyKind::Execution, DependencyKind::Notification] {
            let mut host_edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for dep in &self.config.host_dependencies {
                if dep.kind == kind
                    && let (Some(depended), Some(dependent)) =
                        (dep.depended_host(), dep.dependent_host())
                {
                    host_edges.entry(dependent).or_default().push(depended);
                }
            }
            if let Some(name) = find_cycle(&host_edges) {
                return Err(EngineError::validation(format!(
                    "circular host dependency chain involving host '{name}'"
                )));
            }

            let mut service_edges: BTreeMap<(&str, &str), Vec<(&str, &str)>> = BTreeMap::new();
            for dep in &self.config.service_dependencies {
                if dep.kind == kind
                    && let (Some(depended), Some(dependent)) =
                        (dep.depended_service(), dep.dependent_service())
                {
                    service_edges.entry(dependent).or_default().push(depended);
                }
            }
            if let Some((host, description)) = find_cycle(&service_edges) {
                return Err(EngineError::validation(format!(
                    "circular service dependency chain involving service '{}'",
                    service_key_label(host, description)
                )));
            }
        }
        Ok(())
    }
}

/// Depth-first cycle search over a dependency graph; returns one node on a
/// cycle if any exists.
fn find_cycle<K: Ord + Copy>(edges: &BTreeMap<K, Vec<K>>) -> Option<K> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<K: Ord + Copy>(
        node: K,
        edges: &BTreeMap<K, Vec<K>>,
        marks: &mut BTreeMap<K, Mark>,
    ) -> Option<K> {
        match marks.get(&node) {
            Some(Mark::Visiting) => return Some(node),
            Some(Mark::Done) => return None,
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        if let Some(targets) = edges.get(&node) {
            for &target in targets {
                if let Some(cycle) = visit(target, edges, marks) {
                    return Some(cycle);
                }
            }
        }
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = BTreeMap::new();
    for &node in edges.keys() {
        if let Some(cycle) = visit(node, edges, &mut marks) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_config::{ConfigSnapshot, HostConfig, expand_snapshot};

    fn engine_with_hosts(names: &[&str]) -> Engine {
        let mut snapshot = ConfigSnapshot::new();
        for name in names {
            snapshot.add_host(HostConfig::new(*name)).unwrap();
        }
        let mut engine = Engine::new();
        engine.apply(snapshot).unwrap();
        engine
    }

    #[test]
    fn unexpanded_dependency_is_rejected_then_accepted_pair_by_pair() {
        let mut engine = engine_with_hosts(&["gw", "web-1", "web-2"]);
        let dep = HostDependencyConfig::new(
            vec!["gw".into()],
            vec!["web-1".into(), "web-2".into()],
        );

        let err = engine.add_host_dependency(&dep).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));

        let mut snapshot = engine.config().clone();
        snapshot.add_host_dependency(dep);
        expand_snapshot(&mut snapshot).unwrap();
        for concrete in snapshot.host_dependencies.clone() {
            engine.add_host_dependency(&concrete).unwrap();
        }
        // 2 dependents x 2 kinds.
        assert_eq!(engine.runtime().host_dependencies.len(), 4);
    }

    #[test]
    fn dependencies_cannot_be_modified() {
        let mut engine = engine_with_hosts(&["gw", "web-1"]);
        let mut dep = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        dep.kind = DependencyKind::Execution;
        engine.add_host_dependency(&dep).unwrap();

        let err = engine.modify_host_dependency(&dep).unwrap_err();
        assert!(err.to_string().contains("added or removed"));
    }

    #[test]
    fn dependency_removal_is_idempotent() {
        let mut engine = engine_with_hosts(&["gw", "web-1"]);
        let mut dep = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        dep.kind = DependencyKind::Execution;
        engine.add_host_dependency(&dep).unwrap();

        engine.remove_host_dependency(&dep).unwrap();
        engine.remove_host_dependency(&dep).unwrap();
        assert!(engine.runtime().host_dependencies.is_empty());
    }

    #[test]
    fn finds_a_two_node_cycle() {
        let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        edges.insert("a", vec!["b"]);
        edges.insert("b", vec!["a"]);
        assert!(find_cycle(&edges).is_some());
    }

    #[test]
    fn accepts_a_diamond() {
        let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        edges.insert("a", vec!["b", "c"]);
        edges.insert("b", vec!["d"]);
        edges.insert("c", vec!["d"]);
        assert!(find_cycle(&edges).is_none());
    }
}
