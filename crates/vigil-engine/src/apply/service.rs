//! Service applier.

use tracing::debug;
use vigil_config::ServiceConfig;

use crate::broker::{ObjectKind, service_key_label};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::runtime::ServiceRuntime;

impl Engine {
    /// Creates the runtime service for a new configuration object and
    /// links it to its host, which must already exist (hosts are applied
    /// before services).
    pub(crate) fn add_service(&mut self, obj: &ServiceConfig) -> EngineResult<()> {
        let label = service_key_label(&obj.host_name, &obj.description);
        debug!(service = %label, "creating new service");
        if self.runtime.service(&obj.key()).is_some() {
            return Err(EngineError::configuration(format!(
                "cannot create already existing service '{label}'"
            )));
        }
        let Some(host) = self.runtime.host(&obj.host_name) else {
            return Err(EngineError::configuration(format!(
                "service '{label}' refers to non-existing host '{}'",
                obj.host_name
            )));
        };
        let host_id = host.id;

        let id = self.runtime.allocate_id();
        self.runtime
            .insert_service(ServiceRuntime::from_config(id, host_id, obj));

        self.config.services.insert(obj.key(), obj.clone());
        self.broker.object_added(ObjectKind::Service, &label);
        Ok(())
    }

    /// Applies a modified configuration to the existing runtime service,
    /// preserving its operational state.
    pub(crate) fn modify_service(&mut self, obj: &ServiceConfig) -> EngineResult<()> {
        let label = service_key_label(&obj.host_name, &obj.description);
        debug!(service = %label, "modifying service");
        if !self.config.services.contains_key(&obj.key()) {
            return Err(EngineError::configuration(format!(
                "cannot modify non-existing service '{label}'"
            )));
        }
        let Some(service) = self.runtime.service_mut(&obj.key()) else {
            return Err(EngineError::internal(format!(
                "service '{label}' is applied but missing from the runtime table"
            )));
        };
        service.apply_config(obj);

        self.config.services.insert(obj.key(), obj.clone());
        self.broker.object_updated(ObjectKind::Service, &label);
        Ok(())
    }

    /// Removes a service, its pending check events and its host backlink.
    /// Tolerates a host already removed in the same cycle.
    pub(crate) fn remove_service(&mut self, obj: &ServiceConfig) -> EngineResult<()> {
        let label = service_key_label(&obj.host_name, &obj.description);
        debug!(service = %label, "removing service");
        let key = obj.key();
        if let Some(service) = self.runtime.service(&key) {
            let id = service.id;
            self.unschedule_service_checks(id);
            if let Some((_, cascaded)) = self.runtime.remove_service(&key) {
                for downtime_id in cascaded {
                    self.broker
                        .object_removed(ObjectKind::Downtime, &downtime_id.to_string());
                }
            }
            self.broker.object_removed(ObjectKind::Service, &label);
        }
        self.config.services.remove(&key);
        Ok(())
    }

    /// Validates host and check-period references of every applied
    /// service.
    pub(crate) fn resolve_services(&mut self) -> EngineResult<()> {
        for (key, service) in &self.config.services {
            let label = service_key_label(&key.0, &key.1);
            if !self.config.hosts.contains_key(&service.host_name) {
                return Err(EngineError::validation(format!(
                    "service '{label}' refers to non-existing host '{}'",
                    service.host_name
                )));
            }
            if let Some(period) = &service.check_period
                && !self.config.timeperiods.contains_key(period)
            {
                return Err(EngineError::validation(format!(
                    "service '{label}' refers to non-existing check period '{period}'"
                )));
            }
            if self.runtime.service(key).is_none() {
                return Err(EngineError::internal(format!(
                    "service '{label}' is applied but missing from the runtime table"
                )));
            }
        }
        Ok(())
    }
}
