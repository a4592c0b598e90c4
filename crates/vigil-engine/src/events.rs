//! The timed event queue.
//!
//! Two ordered queues (high and low priority) hold every future action the
//! engine has committed to: object checks in the low queue, periodic
//! maintenance events in the high queue. Events are keyed by scheduled time
//! with a monotonic sequence number breaking ties, so insertion order is
//! stable among events due at the same second.
//!
//! A hash index from `(priority, kind, object)` to the set of queue
//! positions backs cheap lookup of an object's pending checks, which is
//! what keeps the "at most one pending check per object" invariant cheap
//! to enforce: the scheduler looks up and removes until none remain, so
//! accidental duplicates drain instead of lingering.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use vigil_core::ObjectId;

/// What a timed event does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Active check of one host.
    HostCheck,
    /// Active check of one service.
    ServiceCheck,
    /// Reap finished check results.
    CheckReaper,
    /// Poll the external command interface.
    CommandCheck,
    /// Sweep passive host results for staleness.
    HostFreshnessCheck,
    /// Sweep passive service results for staleness.
    ServiceFreshnessCheck,
    /// Smooth check distribution over time.
    RescheduleChecks,
    /// Save runtime state to retention.
    RetentionSave,
    /// Write the status snapshot.
    StatusSave,
}

/// Which of the two queues an event lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Maintenance events, drained before low-priority ones when due.
    High,
    /// Object checks.
    Low,
}

/// A scheduled future action.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    /// What the event does.
    pub kind: EventKind,
    /// When it fires.
    pub scheduled_time: DateTime<Utc>,
    /// Whether it reschedules itself after firing.
    pub recurring: bool,
    /// Seconds between recurrences.
    pub recurring_interval: i64,
    /// Whether the scheduled time is adjusted when the system clock jumps.
    pub compensate_for_time_change: bool,
    /// Queue the event lives in.
    pub priority: Priority,
    /// The object a check event targets; `None` for maintenance events.
    pub object: Option<ObjectId>,
}

/// A stable reference to a queued event.
///
/// Handles stay valid until the event is removed or rescheduled; they embed
/// the queue position, so operations through a handle never scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle {
    priority: Priority,
    time: DateTime<Utc>,
    seq: u64,
}

type QueueKey = (DateTime<Utc>, u64);
type IndexKey = (Priority, EventKind, ObjectId);

/// The engine's pending timed events.
#[derive(Debug, Default)]
pub struct TimedEventQueue {
    high: BTreeMap<QueueKey, TimedEvent>,
    low: BTreeMap<QueueKey, TimedEvent>,
    index: HashMap<IndexKey, BTreeSet<QueueKey>>,
    next_seq: u64,
}

impl TimedEventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a new event and returns its handle.
    pub fn schedule(&mut self, event: TimedEvent) -> EventHandle {
        self.next_seq += 1;
        let key = (event.scheduled_time, self.next_seq);
        let handle = EventHandle {
            priority: event.priority,
            time: key.0,
            seq: key.1,
        };
        if let Some(object) = event.object {
            self.index
                .entry((event.priority, event.kind, object))
                .or_default()
                .insert(key);
        }
        self.queue_mut(event.priority).insert(key, event);
        handle
    }

    /// Removes an event, returning it if it was still queued.
    ///
    /// The hash index entry is erased in the same step; removal through a
    /// stale handle is a no-op.
    pub fn remove(&mut self, handle: EventHandle) -> Option<TimedEvent> {
        let key = (handle.time, handle.seq);
        let event = self.queue_mut(handle.priority).remove(&key)?;
        if let Some(object) = event.object {
            let index_key = (event.priority, event.kind, object);
            if let Some(keys) = self.index.get_mut(&index_key) {
                keys.remove(&key);
                if keys.is_empty() {
                    self.index.remove(&index_key);
                }
            }
        }
        Some(event)
    }

    /// Finds the earliest pending event of the given kind for an object.
    pub fn find(&self, priority: Priority, kind: EventKind, object: ObjectId) -> Option<EventHandle> {
        let keys = self.index.get(&(priority, kind, object))?;
        let key = keys.first()?;
        Some(EventHandle {
            priority,
            time: key.0,
            seq: key.1,
        })
    }

    /// Returns the event behind a handle.
    pub fn get(&self, handle: EventHandle) -> Option<&TimedEvent> {
        self.queue(handle.priority).get(&(handle.time, handle.seq))
    }

    /// Returns the earliest queued event, preferring the high-priority
    /// queue when both are due at the same time.
    pub fn next_event(&self) -> Option<(EventHandle, &TimedEvent)> {
        let high = self.high.iter().next();
        let low = self.low.iter().next();
        let (key, event) = match (high, low) {
            (Some((hk, he)), Some((lk, _))) if hk.0 <= lk.0 => (hk, he),
            (_, Some((lk, le))) => (lk, le),
            (Some((hk, he)), None) => (hk, he),
            (None, None) => return None,
        };
        Some((
            EventHandle {
                priority: event.priority,
                time: key.0,
                seq: key.1,
            },
            event,
        ))
    }

    /// Moves a recurring event one interval forward, returning the new
    /// handle. Non-recurring events are removed and not re-queued.
    pub fn reschedule(&mut self, handle: EventHandle) -> Option<EventHandle> {
        let mut event = self.remove(handle)?;
        if !event.recurring {
            return None;
        }
        event.scheduled_time += Duration::seconds(event.recurring_interval);
        Some(self.schedule(event))
    }

    /// Number of queued events across both priorities.
    pub fn len(&self) -> usize {
        self.high.len() + self.low.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }

    /// Iterates low-priority events in firing order.
    pub fn iter_low(&self) -> impl Iterator<Item = &TimedEvent> {
        self.low.values()
    }

    /// Iterates high-priority events in firing order.
    pub fn iter_high(&self) -> impl Iterator<Item = &TimedEvent> {
        self.high.values()
    }

    fn queue(&self, priority: Priority) -> &BTreeMap<QueueKey, TimedEvent> {
        match priority {
            Priority::High => &self.high,
            Priority::Low => &self.low,
        }
    }

    fn queue_mut(&mut self, priority: Priority) -> &mut BTreeMap<QueueKey, TimedEvent> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Low => &mut self.low,
        }
    }
}

/// Builds a one-shot check event for an object.
pub fn check_event(
    kind: EventKind,
    object: ObjectId,
    scheduled_time: DateTime<Utc>,
) -> TimedEvent {
    TimedEvent {
        kind,
        scheduled_time,
        recurring: false,
        recurring_interval: 0,
        compensate_for_time_change: true,
        priority: Priority::Low,
        object: Some(object),
    }
}

/// Builds a recurring maintenance event.
pub fn recurring_event(
    kind: EventKind,
    scheduled_time: DateTime<Utc>,
    interval: i64,
) -> TimedEvent {
    TimedEvent {
        kind,
        scheduled_time,
        recurring: true,
        recurring_interval: interval,
        compensate_for_time_change: true,
        priority: Priority::High,
        object: None,
    }
}
