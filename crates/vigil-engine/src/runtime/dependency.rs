//! Dependency runtime objects.
//!
//! Runtime dependencies always reference exactly one depended-on object and
//! one dependent object by id; the appliers refuse to instantiate anything
//! still carrying group references.

use vigil_config::{DependencyKind, HostFailureOptions, ServiceFailureOptions};
use vigil_core::ObjectId;

/// A runtime dependency of one host on another.
#[derive(Debug, Clone)]
pub struct HostDependencyRuntime {
    /// Stable handle.
    pub id: ObjectId,
    /// Execution or notification.
    pub kind: DependencyKind,
    /// Id of the depended-on host.
    pub depended_host: ObjectId,
    /// Id of the dependent host.
    pub dependent_host: ObjectId,
    /// Whether the dependency chain is followed upward.
    pub inherits_parent: bool,
    /// States of the depended-on host that trigger suppression.
    pub failure_options: HostFailureOptions,
    /// Period during which the dependency applies; `None` means always.
    pub dependency_period: Option<String>,
}

/// A runtime dependency of one service on another.
#[derive(Debug, Clone)]
pub struct ServiceDependencyRuntime {
    /// Stable handle.
    pub id: ObjectId,
    /// Execution or notification.
    pub kind: DependencyKind,
    /// Id of the depended-on service.
    pub depended_service: ObjectId,
    /// Id of the dependent service.
    pub dependent_service: ObjectId,
    /// Whether the dependency chain is followed upward.
    pub inherits_parent: bool,
    /// States of the depended-on service that trigger suppression.
    pub failure_options: ServiceFailureOptions,
    /// Period during which the dependency applies; `None` means always.
    pub dependency_period: Option<String>,
}
