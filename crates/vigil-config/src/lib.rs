//! Configuration objects, snapshots, diffing and group expansion.
//!
//! A [`ConfigSnapshot`] holds one ordered, keyed collection per monitored
//! entity kind. Snapshots are immutable-until-replaced: a reconfiguration
//! cycle compares an old and a new snapshot with [`diff_keyed`] /
//! [`diff_set`] and hands the resulting added/modified/removed sets to the
//! engine's appliers. Group-scoped dependencies are rewritten into concrete
//! one-to-one pairs by [`expand_snapshot`] before any diffing happens.

pub mod dependency;
pub mod diff;
pub mod downtime;
pub mod error;
pub mod expand;
pub mod group;
pub mod host;
pub mod options;
pub mod service;
pub mod snapshot;

pub use dependency::{
    DependencyKind, HostDependencyConfig, HostFailureOptions, ServiceDependencyConfig,
    ServiceFailureOptions,
};
pub use diff::{Difference, diff_keyed, diff_set};
pub use downtime::{DowntimeConfig, DowntimeTarget, Recurrence};
pub use error::ConfigError;
pub use expand::expand_snapshot;
pub use group::HostGroupConfig;
pub use host::HostConfig;
pub use options::EngineOptions;
pub use service::{ServiceConfig, ServiceKey};
pub use snapshot::ConfigSnapshot;
