//! Appliers: translate per-kind configuration differences into runtime
//! graph and event queue mutations.
//!
//! Each applier implements the same four operations for its entity kind:
//! `add` creates the runtime object and links it into the graph, `modify`
//! updates it in place, `remove` unlinks and deletes it (idempotently), and
//! `resolve` re-validates cross-object references after a whole cycle has
//! been applied. Appliers also maintain the engine's configuration snapshot
//! so it always mirrors what the runtime graph was built from.

mod dependency;
mod downtime;
mod group;
mod host;
pub(crate) mod scheduler;
mod service;
mod timeperiod;
