//! Scheduled downtime configuration objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::ServiceKey;

/// What a downtime suppresses: a host or a single service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DowntimeTarget {
    /// Downtime on a host.
    Host {
        /// Host name.
        host: String,
    },
    /// Downtime on one service.
    Service {
        /// Host name.
        host: String,
        /// Service description.
        description: String,
    },
}

impl DowntimeTarget {
    /// Returns the host name of the target.
    pub fn host_name(&self) -> &str {
        match self {
            Self::Host { host } | Self::Service { host, .. } => host,
        }
    }

    /// Returns the service key, if the target is a service.
    pub fn service_key(&self) -> Option<ServiceKey> {
        match self {
            Self::Host { .. } => None,
            Self::Service { host, description } => Some((host.clone(), description.clone())),
        }
    }
}

/// Recurrence rule for a repeating downtime window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Recurrence {
    /// Seconds between recurrences.
    pub interval: i64,
    /// Name of the time period the window must start inside.
    pub period: String,
}

/// Declarative description of a scheduled suppression window.
///
/// The natural key is the downtime id, assigned by whoever scheduled it
/// (operator command or retention load).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeConfig {
    /// Downtime id, the natural key.
    pub id: u64,
    /// Suppressed host or service.
    pub target: DowntimeTarget,
    /// When the downtime was entered.
    pub entry_time: DateTime<Utc>,
    /// Window start.
    pub start_time: DateTime<Utc>,
    /// Window end.
    pub end_time: DateTime<Utc>,
    /// Fixed downtimes run exactly `[start, end]`; flexible ones start with
    /// the first problem inside the window and last `duration` seconds.
    pub fixed: bool,
    /// Duration in seconds for flexible downtimes.
    pub duration: i64,
    /// Id of the downtime that triggers this one, if any.
    pub triggered_by: Option<u64>,
    /// Who scheduled it.
    pub author: String,
    /// Free-form comment.
    pub comment: String,
    /// Recurrence rule for repeating windows.
    pub recurrence: Option<Recurrence>,
}

impl DowntimeConfig {
    /// Creates a fixed one-shot downtime.
    pub fn new(
        id: u64,
        target: DowntimeTarget,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            target,
            entry_time: start_time,
            start_time,
            end_time,
            fixed: true,
            duration: (end_time - start_time).num_seconds(),
            triggered_by: None,
            author: String::new(),
            comment: String::new(),
            recurrence: None,
        }
    }

    /// Returns the natural key.
    pub fn key(&self) -> u64 {
        self.id
    }

    /// Builder: make the downtime flexible with the given duration.
    #[must_use]
    pub fn with_flexible_duration(mut self, duration: i64) -> Self {
        self.fixed = false;
        self.duration = duration;
        self
    }

    /// Builder: set the recurrence rule.
    #[must_use]
    pub fn with_recurrence(mut self, interval: i64, period: impl Into<String>) -> Self {
        self.recurrence = Some(Recurrence {
            interval,
            period: period.into(),
        });
        self
    }

    /// Builder: set author and comment.
    #[must_use]
    pub fn with_comment(mut self, author: impl Into<String>, comment: impl Into<String>) -> Self {
        self.author = author.into();
        self.comment = comment.into();
        self
    }
}
