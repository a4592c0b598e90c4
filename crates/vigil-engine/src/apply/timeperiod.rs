//! Time period applier.
//!
//! Time periods have no separate runtime representation; the applied
//! configuration entry is what period evaluation reads. The applier still
//! announces every change so consumers can track the period inventory.

use tracing::debug;
use vigil_core::TimePeriod;

use crate::broker::ObjectKind;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    pub(crate) fn add_timeperiod(&mut self, obj: &TimePeriod) -> EngineResult<()> {
        debug!(name = %obj.name, "creating new time period");
        if self.config.timeperiods.contains_key(&obj.name) {
            return Err(EngineError::configuration(format!(
                "cannot create already existing time period '{}'",
                obj.name
            )));
        }
        self.config.timeperiods.insert(obj.name.clone(), obj.clone());
        self.broker.object_added(ObjectKind::TimePeriod, &obj.name);
        Ok(())
    }

    pub(crate) fn modify_timeperiod(&mut self, obj: &TimePeriod) -> EngineResult<()> {
        debug!(name = %obj.name, "modifying time period");
        let Some(existing) = self.config.timeperiods.get_mut(&obj.name) else {
            return Err(EngineError::configuration(format!(
                "cannot modify non-existing time period '{}'",
                obj.name
            )));
        };
        *existing = obj.clone();
        self.broker.object_updated(ObjectKind::TimePeriod, &obj.name);
        Ok(())
    }

    pub(crate) fn remove_timeperiod(&mut self, obj: &TimePeriod) -> EngineResult<()> {
        debug!(name = %obj.name, "removing time period");
        if self.config.timeperiods.remove(&obj.name).is_some() {
            self.broker.object_removed(ObjectKind::TimePeriod, &obj.name);
        }
        Ok(())
    }
}
