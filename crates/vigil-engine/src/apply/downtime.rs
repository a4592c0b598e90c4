//! Downtime applier.

use chrono::{Offset, Utc};
use tracing::debug;
use vigil_config::{DowntimeConfig, DowntimeTarget};
use vigil_core::next_valid_time;

use crate::broker::ObjectKind;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::runtime::DowntimeRuntime;

impl Engine {
    /// Creates a runtime downtime. The target must already exist; the
    /// first window of a recurring downtime is shifted forward so it
    /// starts inside the recurrence period.
    pub(crate) fn add_downtime(&mut self, obj: &DowntimeConfig) -> EngineResult<()> {
        debug!(id = obj.id, "creating new downtime");
        if self.runtime.downtimes.contains_key(&obj.id) {
            return Err(EngineError::configuration(format!(
                "cannot create already existing downtime '{}'",
                obj.id
            )));
        }
        self.check_downtime_target(obj)?;

        let id = self.runtime.allocate_id();
        let mut downtime = DowntimeRuntime::from_config(id, obj);
        self.align_recurring_window(&mut downtime);
        self.runtime.insert_downtime(downtime);

        self.config.downtimes.insert(obj.id, obj.clone());
        self.broker
            .object_added(ObjectKind::Downtime, &obj.id.to_string());
        Ok(())
    }

    /// Re-applies every configuration field of an existing downtime,
    /// keeping only its in-effect flag.
    pub(crate) fn modify_downtime(&mut self, obj: &DowntimeConfig) -> EngineResult<()> {
        debug!(id = obj.id, "modifying downtime");
        if !self.config.downtimes.contains_key(&obj.id) {
            return Err(EngineError::configuration(format!(
                "cannot modify non-existing downtime '{}'",
                obj.id
            )));
        }
        self.check_downtime_target(obj)?;
        let Some(existing) = self.runtime.downtimes.get(&obj.id) else {
            return Err(EngineError::internal(format!(
                "downtime '{}' is applied but missing from the runtime table",
                obj.id
            )));
        };

        // The target may have changed; relink through remove + insert.
        let in_effect = existing.in_effect;
        let id = existing.id;
        self.runtime.remove_downtime(obj.id);
        let mut downtime = DowntimeRuntime::from_config(id, obj);
        downtime.in_effect = in_effect;
        self.align_recurring_window(&mut downtime);
        self.runtime.insert_downtime(downtime);

        self.config.downtimes.insert(obj.id, obj.clone());
        self.broker
            .object_updated(ObjectKind::Downtime, &obj.id.to_string());
        Ok(())
    }

    /// Removes a downtime; removing an absent one only clears the
    /// configuration entry.
    pub(crate) fn remove_downtime(&mut self, obj: &DowntimeConfig) -> EngineResult<()> {
        debug!(id = obj.id, "removing downtime");
        if self.runtime.remove_downtime(obj.id).is_some() {
            self.broker
                .object_removed(ObjectKind::Downtime, &obj.id.to_string());
        }
        self.config.downtimes.remove(&obj.id);
        Ok(())
    }

    /// Validates targets, trigger references and recurrence periods of
    /// every applied downtime.
    pub(crate) fn resolve_downtimes(&mut self) -> EngineResult<()> {
        for downtime in self.config.downtimes.values() {
            let target_exists = match &downtime.target {
                DowntimeTarget::Host { host } => self.config.hosts.contains_key(host),
                DowntimeTarget::Service { host, description } => self
                    .config
                    .services
                    .contains_key(&(host.clone(), description.clone())),
            };
            if !target_exists {
                return Err(EngineError::validation(format!(
                    "downtime '{}' targets a non-existing object on host '{}'",
                    downtime.id,
                    downtime.target.host_name()
                )));
            }
            if let Some(trigger) = downtime.triggered_by
                && !self.config.downtimes.contains_key(&trigger)
            {
                return Err(EngineError::validation(format!(
                    "downtime '{}' is triggered by non-existing downtime '{trigger}'",
                    downtime.id
                )));
            }
            if let Some(recurrence) = &downtime.recurrence
                && !self.config.timeperiods.contains_key(&recurrence.period)
            {
                return Err(EngineError::validation(format!(
                    "downtime '{}' recurs in non-existing period '{}'",
                    downtime.id, recurrence.period
                )));
            }
        }
        Ok(())
    }

    fn check_downtime_target(&self, obj: &DowntimeConfig) -> EngineResult<()> {
        let exists = match obj.target.service_key() {
            Some(key) => self.runtime.service(&key).is_some(),
            None => self.runtime.host(obj.target.host_name()).is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(EngineError::configuration(format!(
                "downtime '{}' targets a non-existing object on host '{}'",
                obj.id,
                obj.target.host_name()
            )))
        }
    }

    /// Shifts a recurring downtime's window forward to the next moment its
    /// recurrence period considers valid, preserving the window length.
    /// Non-recurring downtimes and unknown periods are left untouched;
    /// resolve rejects the latter.
    fn align_recurring_window(&self, downtime: &mut DowntimeRuntime) {
        let Some(recurrence) = &downtime.recurrence else {
            return;
        };
        let Some(period) = self.config.timeperiods.get(&recurrence.period) else {
            return;
        };
        let offset = Utc.fix();
        let length = downtime.end_time - downtime.start_time;
        let start = next_valid_time(downtime.start_time, period, offset);
        downtime.start_time = start;
        downtime.end_time = start + length;
    }
}
