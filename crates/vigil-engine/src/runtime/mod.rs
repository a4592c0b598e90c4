//! Runtime objects and the table that owns them.
//!
//! Runtime objects are the mutable counterparts of configuration objects:
//! they carry operational state (current state, check bookkeeping, schedule
//! placement) plus the cross-references of the object graph. All
//! cross-references are stored as owned sets of [`ObjectId`]s or natural
//! keys, never as pointers into another object's storage.
//!
//! [`RuntimeTable`] is the single owner of every runtime object and of the
//! id allocator; its removal routines are the only authoritative way to
//! unlink an object from the graph.

mod dependency;
mod downtime;
mod host;
mod service;
mod table;

pub use dependency::{HostDependencyRuntime, ServiceDependencyRuntime};
pub use downtime::DowntimeRuntime;
pub use host::{HostRuntime, HostState};
pub use service::{ServiceRuntime, ServiceState};
pub use table::RuntimeTable;

/// Whether a state is still being confirmed or has hardened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StateType {
    /// The state change has not yet been confirmed by enough attempts.
    Soft,
    /// The state has been confirmed.
    #[default]
    Hard,
}

/// Shared check bookkeeping for hosts and services.
#[derive(Debug, Clone, Default)]
pub struct CheckInfo {
    /// Whether a check result has ever been processed.
    pub has_been_checked: bool,
    /// Current attempt number within the soft retry window.
    pub current_attempt: u32,
    /// When the last check ran.
    pub last_check: Option<chrono::DateTime<chrono::Utc>>,
    /// When the next active check is placed, if any.
    pub next_check: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether the scheduler considers the object eligible for active
    /// checking.
    pub should_be_scheduled: bool,
    /// A forced check was requested while active checks were disabled; the
    /// placement is kept so the forced check still runs.
    pub forced_check_pending: bool,
}
