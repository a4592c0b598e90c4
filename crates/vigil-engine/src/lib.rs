//! Live reconfiguration and check scheduling core.
//!
//! The [`Engine`] owns the currently applied configuration snapshot, the
//! runtime object graph, the timed event queue and the scheduler state.
//! [`Engine::apply`] runs one full reconfiguration cycle: expand the new
//! snapshot, diff it per entity kind against the applied one, push the
//! differences through the appliers, re-validate the graph and reconcile
//! the event queue.

mod apply;
pub mod broker;
pub mod engine;
pub mod error;
pub mod events;
pub mod runtime;

pub use apply::scheduler::SchedulingInfo;
pub use broker::{Broker, BrokerEvent, NullBroker, ObjectKind, RecordingBroker};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use events::{EventHandle, EventKind, Priority, TimedEvent, TimedEventQueue};
pub use runtime::{
    CheckInfo, HostRuntime, HostState, RuntimeTable, ServiceRuntime, ServiceState, StateType,
};
