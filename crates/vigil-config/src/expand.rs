//! Group expansion of dependency objects.
//!
//! Operators declare dependencies against host lists and host groups; the
//! appliers only accept concrete one-to-one pairs. Expansion runs on the
//! *new* snapshot before diffing: every dependency that references several
//! hosts, any group, or has no concrete kind yet is replaced by one
//! execution and one notification dependency per (depended, dependent)
//! member pair, each with the irrelevant failure-option set cleared.
//! Because dependency sets are content-keyed, duplicates collapse on
//! insert.

use std::collections::BTreeSet;

use crate::dependency::{
    DependencyKind, HostDependencyConfig, HostFailureOptions, ServiceDependencyConfig,
    ServiceFailureOptions,
};
use crate::error::ConfigError;
use crate::snapshot::ConfigSnapshot;

/// Expands every group-scoped dependency in the snapshot into concrete
/// one-to-one pairs.
///
/// # Errors
///
/// Fails with [`ConfigError::UnknownHostGroup`] if a dependency references
/// a group that is not defined in the same snapshot.
pub fn expand_snapshot(snapshot: &mut ConfigSnapshot) -> Result<(), ConfigError> {
    expand_host_dependencies(snapshot)?;
    expand_service_dependencies(snapshot)?;
    Ok(())
}

fn expand_host_dependencies(snapshot: &mut ConfigSnapshot) -> Result<(), ConfigError> {
    let pending: Vec<HostDependencyConfig> = snapshot
        .host_dependencies
        .iter()
        .filter(|d| d.needs_expansion())
        .cloned()
        .collect();

    for dep in pending {
        let depended = resolve_hosts(&dep.hosts, &dep.hostgroups, snapshot)?;
        let dependent = resolve_hosts(&dep.dependent_hosts, &dep.dependent_hostgroups, snapshot)?;

        snapshot.host_dependencies.remove(&dep);

        for depended_host in &depended {
            for dependent_host in &dependent {
                for kind in [DependencyKind::Execution, DependencyKind::Notification] {
                    let mut concrete = dep.clone();
                    concrete.hosts = vec![depended_host.clone()];
                    concrete.hostgroups.clear();
                    concrete.dependent_hosts = vec![dependent_host.clone()];
                    concrete.dependent_hostgroups.clear();
                    concrete.kind = kind;
                    match kind {
                        DependencyKind::Execution => {
                            concrete.notification_failure_options = HostFailureOptions::none();
                        }
                        DependencyKind::Notification => {
                            concrete.execution_failure_options = HostFailureOptions::none();
                        }
                        DependencyKind::Unexpanded => unreachable!(),
                    }
                    snapshot.host_dependencies.insert(concrete);
                }
            }
        }
    }
    Ok(())
}

fn expand_service_dependencies(snapshot: &mut ConfigSnapshot) -> Result<(), ConfigError> {
    let pending: Vec<ServiceDependencyConfig> = snapshot
        .service_dependencies
        .iter()
        .filter(|d| d.needs_expansion())
        .cloned()
        .collect();

    for dep in pending {
        let depended_hosts = resolve_hosts(&dep.hosts, &dep.hostgroups, snapshot)?;
        let dependent_hosts =
            resolve_hosts(&dep.dependent_hosts, &dep.dependent_hostgroups, snapshot)?;

        snapshot.service_dependencies.remove(&dep);

        for depended_host in &depended_hosts {
            for depended_desc in &dep.service_descriptions {
                for dependent_host in &dependent_hosts {
                    for dependent_desc in &dep.dependent_service_descriptions {
                        for kind in [DependencyKind::Execution, DependencyKind::Notification] {
                            let mut concrete = dep.clone();
                            concrete.hosts = vec![depended_host.clone()];
                            concrete.hostgroups.clear();
                            concrete.service_descriptions = vec![depended_desc.clone()];
                            concrete.dependent_hosts = vec![dependent_host.clone()];
                            concrete.dependent_hostgroups.clear();
                            concrete.dependent_service_descriptions =
                                vec![dependent_desc.clone()];
                            concrete.kind = kind;
                            match kind {
                                DependencyKind::Execution => {
                                    concrete.notification_failure_options =
                                        ServiceFailureOptions::none();
                                }
                                DependencyKind::Notification => {
                                    concrete.execution_failure_options =
                                        ServiceFailureOptions::none();
                                }
                                DependencyKind::Unexpanded => unreachable!(),
                            }
                            snapshot.service_dependencies.insert(concrete);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolves a host list plus group list into the set of concrete names.
fn resolve_hosts(
    hosts: &[String],
    groups: &[String],
    snapshot: &ConfigSnapshot,
) -> Result<BTreeSet<String>, ConfigError> {
    let mut expanded: BTreeSet<String> = hosts.iter().cloned().collect();
    for group_name in groups {
        let group = snapshot
            .hostgroups
            .get(group_name)
            .ok_or_else(|| ConfigError::unknown_host_group(group_name))?;
        expanded.extend(group.members.iter().cloned());
    }
    Ok(expanded)
}
