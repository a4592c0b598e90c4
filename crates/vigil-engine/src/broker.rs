//! Broker notification hooks.
//!
//! Every structural change to the runtime graph is announced through a
//! [`Broker`] so external consumers (status writers, event brokers) can
//! mirror the object inventory. The engine owns exactly one broker; tests
//! use [`RecordingBroker`] to assert on the emitted sequence.

use vigil_core::ObjectId;

/// The kind of runtime object a broker callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A time period.
    TimePeriod,
    /// A host.
    Host,
    /// A service.
    Service,
    /// A host group.
    HostGroup,
    /// A host dependency.
    HostDependency,
    /// A service dependency.
    ServiceDependency,
    /// A downtime record.
    Downtime,
}

/// A single broker notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// An object was created.
    Added(ObjectKind, String),
    /// An object was updated in place.
    Updated(ObjectKind, String),
    /// An object was removed.
    Removed(ObjectKind, String),
}

/// Receiver for runtime object lifecycle notifications.
///
/// Callbacks run inside the reconfiguration cycle, after the change they
/// describe has been applied. Implementations must not call back into the
/// engine.
pub trait Broker {
    /// An object identified by `key` was created.
    fn object_added(&mut self, kind: ObjectKind, key: &str);
    /// An object identified by `key` was updated.
    fn object_updated(&mut self, kind: ObjectKind, key: &str);
    /// An object identified by `key` was removed.
    fn object_removed(&mut self, kind: ObjectKind, key: &str);
}

/// A broker that drops every notification.
#[derive(Debug, Default)]
pub struct NullBroker;

impl Broker for NullBroker {
    fn object_added(&mut self, _kind: ObjectKind, _key: &str) {}
    fn object_updated(&mut self, _kind: ObjectKind, _key: &str) {}
    fn object_removed(&mut self, _kind: ObjectKind, _key: &str) {}
}

/// A broker that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingBroker {
    /// Notifications in emission order.
    pub events: Vec<BrokerEvent>,
}

impl RecordingBroker {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the given notification was recorded.
    pub fn contains(&self, event: &BrokerEvent) -> bool {
        self.events.contains(event)
    }
}

/// Shared-handle form: lets a test keep a handle to the recorder after
/// moving the broker into the engine.
impl Broker for std::rc::Rc<std::cell::RefCell<RecordingBroker>> {
    fn object_added(&mut self, kind: ObjectKind, key: &str) {
        self.borrow_mut().object_added(kind, key);
    }

    fn object_updated(&mut self, kind: ObjectKind, key: &str) {
        self.borrow_mut().object_updated(kind, key);
    }

    fn object_removed(&mut self, kind: ObjectKind, key: &str) {
        self.borrow_mut().object_removed(kind, key);
    }
}

impl Broker for RecordingBroker {
    fn object_added(&mut self, kind: ObjectKind, key: &str) {
        self.events.push(BrokerEvent::Added(kind, key.to_string()));
    }

    fn object_updated(&mut self, kind: ObjectKind, key: &str) {
        self.events.push(BrokerEvent::Updated(kind, key.to_string()));
    }

    fn object_removed(&mut self, kind: ObjectKind, key: &str) {
        self.events.push(BrokerEvent::Removed(kind, key.to_string()));
    }
}

/// Formats a service key for broker callbacks and log lines.
pub(crate) fn service_key_label(host: &str, description: &str) -> String {
    format!("{host}/{description}")
}

/// Formats an object id based key, used for dependencies whose identity is
/// their content.
pub(crate) fn id_label(id: ObjectId) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_broker_keeps_order() {
        let mut broker = RecordingBroker::new();
        broker.object_added(ObjectKind::Host, "web-1");
        broker.object_updated(ObjectKind::Host, "web-1");
        broker.object_removed(ObjectKind::Host, "web-1");

        assert_eq!(
            broker.events,
            vec![
                BrokerEvent::Added(ObjectKind::Host, "web-1".into()),
                BrokerEvent::Updated(ObjectKind::Host, "web-1".into()),
                BrokerEvent::Removed(ObjectKind::Host, "web-1".into()),
            ]
        );
    }

    #[test]
    fn labels() {
        assert_eq!(service_key_label("web-1", "http"), "web-1/http");
    }
}
