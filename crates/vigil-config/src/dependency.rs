//! Host and service dependency configuration objects.
//!
//! Dependencies are the one entity kind whose identity *is* their content:
//! they derive `Ord` and live in ordered sets keyed by themselves. They can
//! be added and removed but never modified; a change is a remove plus an
//! add. As written by operators they may reference several hosts or whole
//! groups; expansion rewrites them into concrete one-to-one pairs.

use serde::{Deserialize, Serialize};

/// The kind of suppression a dependency expresses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Not yet expanded into execution/notification pairs.
    #[default]
    Unexpanded,
    /// Suppresses check execution of the dependent object.
    Execution,
    /// Suppresses notifications for the dependent object.
    Notification,
}

/// Host states of the depended-on host that trigger suppression.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HostFailureOptions {
    /// Suppress while the depended-on host is up.
    pub up: bool,
    /// Suppress while it is down.
    pub down: bool,
    /// Suppress while it is unreachable.
    pub unreachable: bool,
    /// Suppress while its state is still pending.
    pub pending: bool,
}

impl HostFailureOptions {
    /// No state triggers suppression.
    pub fn none() -> Self {
        Self::default()
    }

    /// Suppression on down and unreachable, the common case.
    pub fn problems() -> Self {
        Self {
            up: false,
            down: true,
            unreachable: true,
            pending: false,
        }
    }
}

/// Service states of the depended-on service that trigger suppression.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ServiceFailureOptions {
    /// Suppress while the depended-on service is ok.
    pub ok: bool,
    /// Suppress on warning.
    pub warning: bool,
    /// Suppress on unknown.
    pub unknown: bool,
    /// Suppress on critical.
    pub critical: bool,
    /// Suppress while its state is still pending.
    pub pending: bool,
}

impl ServiceFailureOptions {
    /// No state triggers suppression.
    pub fn none() -> Self {
        Self::default()
    }

    /// Suppression on warning, unknown and critical.
    pub fn problems() -> Self {
        Self {
            ok: false,
            warning: true,
            unknown: true,
            critical: true,
            pending: false,
        }
    }
}

/// A dependency of one host on another.
///
/// Before expansion the host lists may hold several names and the group
/// lists may be non-empty; after expansion exactly one depended-on host and
/// one dependent host remain and `kind` is concrete.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostDependencyConfig {
    /// Depended-on host names.
    pub hosts: Vec<String>,
    /// Depended-on host groups.
    pub hostgroups: Vec<String>,
    /// Dependent host names.
    pub dependent_hosts: Vec<String>,
    /// Dependent host groups.
    pub dependent_hostgroups: Vec<String>,
    /// Execution or notification dependency.
    pub kind: DependencyKind,
    /// Whether the dependency chain is followed upward.
    pub inherits_parent: bool,
    /// States suppressing execution.
    pub execution_failure_options: HostFailureOptions,
    /// States suppressing notifications.
    pub notification_failure_options: HostFailureOptions,
    /// Period during which the dependency applies; `None` means always.
    pub dependency_period: Option<String>,
}

impl HostDependencyConfig {
    /// Creates an unexpanded dependency of `dependent_hosts` on `hosts`.
    pub fn new(hosts: Vec<String>, dependent_hosts: Vec<String>) -> Self {
        Self {
            hosts,
            hostgroups: Vec::new(),
            dependent_hosts,
            dependent_hostgroups: Vec::new(),
            kind: DependencyKind::Unexpanded,
            inherits_parent: false,
            execution_failure_options: HostFailureOptions::problems(),
            notification_failure_options: HostFailureOptions::problems(),
            dependency_period: None,
        }
    }

    /// Builder: add depended-on host groups.
    #[must_use]
    pub fn with_hostgroups(mut self, groups: Vec<String>) -> Self {
        self.hostgroups = groups;
        self
    }

    /// Builder: add dependent host groups.
    #[must_use]
    pub fn with_dependent_hostgroups(mut self, groups: Vec<String>) -> Self {
        self.dependent_hostgroups = groups;
        self
    }

    /// Returns true if the dependency still needs expansion.
    pub fn needs_expansion(&self) -> bool {
        self.hosts.len() != 1
            || !self.hostgroups.is_empty()
            || self.dependent_hosts.len() != 1
            || !self.dependent_hostgroups.is_empty()
            || self.kind == DependencyKind::Unexpanded
    }

    /// Returns the single depended-on host of an expanded dependency.
    pub fn depended_host(&self) -> Option<&str> {
        if self.hosts.len() == 1 {
            Some(&self.hosts[0])
        } else {
            None
        }
    }

    /// Returns the single dependent host of an expanded dependency.
    pub fn dependent_host(&self) -> Option<&str> {
        if self.dependent_hosts.len() == 1 {
            Some(&self.dependent_hosts[0])
        } else {
            None
        }
    }
}

/// A dependency of one service on another.
///
/// Host references expand through groups like host dependencies; the
/// service description lists pair with every referenced host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceDependencyConfig {
    /// Depended-on host names.
    pub hosts: Vec<String>,
    /// Depended-on host groups.
    pub hostgroups: Vec<String>,
    /// Depended-on service descriptions, paired with every host.
    pub service_descriptions: Vec<String>,
    /// Dependent host names.
    pub dependent_hosts: Vec<String>,
    /// Dependent host groups.
    pub dependent_hostgroups: Vec<String>,
    /// Dependent service descriptions.
    pub dependent_service_descriptions: Vec<String>,
    /// Execution or notification dependency.
    pub kind: DependencyKind,
    /// Whether the dependency chain is followed upward.
    pub inherits_parent: bool,
    /// States suppressing execution.
    pub execution_failure_options: ServiceFailureOptions,
    /// States suppressing notifications.
    pub notification_failure_options: ServiceFailureOptions,
    /// Period during which the dependency applies; `None` means always.
    pub dependency_period: Option<String>,
}

impl ServiceDependencyConfig {
    /// Creates an unexpanded dependency of one service list on another.
    pub fn new(
        hosts: Vec<String>,
        service_descriptions: Vec<String>,
        dependent_hosts: Vec<String>,
        dependent_service_descriptions: Vec<String>,
    ) -> Self {
        Self {
            hosts,
            hostgroups: Vec::new(),
            service_descriptions,
            dependent_hosts,
            dependent_hostgroups: Vec::new(),
            dependent_service_descriptions,
            kind: DependencyKind::Unexpanded,
            inherits_parent: false,
            execution_failure_options: ServiceFailureOptions::problems(),
            notification_failure_options: ServiceFailureOptions::problems(),
            dependency_period: None,
        }
    }

    /// Returns true if the dependency still needs expansion.
    pub fn needs_expansion(&self) -> bool {
        self.hosts.len() != 1
            || !self.hostgroups.is_empty()
            || self.service_descriptions.len() != 1
            || self.dependent_hosts.len() != 1
            || !self.dependent_hostgroups.is_empty()
            || self.dependent_service_descriptions.len() != 1
            || self.kind == DependencyKind::Unexpanded
    }

    /// Returns the single depended-on service of an expanded dependency.
    pub fn depended_service(&self) -> Option<(&str, &str)> {
        if self.hosts.len() == 1 && self.service_descriptions.len() == 1 {
            Some((&self.hosts[0], &self.service_descriptions[0]))
        } else {
            None
        }
    }

    /// Returns the single dependent service of an expanded dependency.
    pub fn dependent_service(&self) -> Option<(&str, &str)> {
        if self.dependent_hosts.len() == 1 && self.dependent_service_descriptions.len() == 1 {
            Some((
                &self.dependent_hosts[0],
                &self.dependent_service_descriptions[0],
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_concrete_dependency_needs_no_expansion() {
        let mut dep = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        assert!(dep.needs_expansion());
        dep.kind = DependencyKind::Execution;
        assert!(!dep.needs_expansion());
    }

    #[test]
    fn group_reference_forces_expansion() {
        let mut dep = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        dep.kind = DependencyKind::Execution;
        let dep = dep.with_dependent_hostgroups(vec!["frontends".into()]);
        assert!(dep.needs_expansion());
    }

    #[test]
    fn identity_is_content() {
        let mut a = HostDependencyConfig::new(vec!["gw".into()], vec!["web-1".into()]);
        a.kind = DependencyKind::Execution;
        let mut b = a.clone();
        assert_eq!(a, b);
        b.inherits_parent = true;
        assert_ne!(a, b);
    }
}
