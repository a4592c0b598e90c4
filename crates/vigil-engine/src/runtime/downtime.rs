//! Downtime runtime objects.

use chrono::{DateTime, Utc};
use vigil_config::{DowntimeConfig, DowntimeTarget, Recurrence};
use vigil_core::ObjectId;

/// The runtime counterpart of a [`DowntimeConfig`].
///
/// The effective window may differ from the configured one: recurring
/// downtimes are shifted forward so the next occurrence starts inside
/// their recurrence period.
#[derive(Debug, Clone)]
pub struct DowntimeRuntime {
    /// Stable handle.
    pub id: ObjectId,
    /// Downtime id, the natural key.
    pub downtime_id: u64,
    /// Suppressed host or service.
    pub target: DowntimeTarget,
    /// Effective window start.
    pub start_time: DateTime<Utc>,
    /// Effective window end.
    pub end_time: DateTime<Utc>,
    /// Fixed or flexible.
    pub fixed: bool,
    /// Duration in seconds for flexible downtimes.
    pub duration: i64,
    /// Id of the triggering downtime, if any.
    pub triggered_by: Option<u64>,
    /// Who scheduled it.
    pub author: String,
    /// Free-form comment.
    pub comment: String,
    /// Recurrence rule for repeating windows.
    pub recurrence: Option<Recurrence>,
    /// Whether the suppression is currently active.
    pub in_effect: bool,
}

impl DowntimeRuntime {
    /// Creates a runtime downtime from its configuration.
    pub fn from_config(id: ObjectId, config: &DowntimeConfig) -> Self {
        let mut downtime = Self {
            id,
            downtime_id: config.id,
            target: config.target.clone(),
            start_time: config.start_time,
            end_time: config.end_time,
            fixed: config.fixed,
            duration: config.duration,
            triggered_by: config.triggered_by,
            author: String::new(),
            comment: String::new(),
            recurrence: None,
            in_effect: false,
        };
        downtime.apply_config(config);
        downtime
    }

    /// Applies configuration fields in place, leaving `in_effect` alone.
    pub fn apply_config(&mut self, config: &DowntimeConfig) {
        self.target = config.target.clone();
        self.start_time = config.start_time;
        self.end_time = config.end_time;
        self.fixed = config.fixed;
        self.duration = config.duration;
        self.triggered_by = config.triggered_by;
        self.author = config.author.clone();
        self.comment = config.comment.clone();
        self.recurrence = config.recurrence.clone();
    }
}
