//! The engine context.
//!
//! An [`Engine`] owns everything the reconfiguration cycle touches: the
//! currently applied configuration snapshot, the runtime object table, the
//! timed event queue, the scheduler bookkeeping and the broker. There is no
//! process-wide state; constructing an engine is the `load` lifecycle step
//! and dropping it is `unload`.
//!
//! Every mutating operation takes `&mut self`, which makes reconfiguration
//! and event dispatch mutually exclusive critical sections by construction.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use vigil_config::{ConfigSnapshot, ServiceKey, diff_keyed, diff_set, expand_snapshot};

use crate::apply::scheduler::{SchedulerState, SchedulingInfo};
use crate::broker::{Broker, NullBroker};
use crate::error::EngineResult;
use crate::events::{EventKind, Priority, TimedEvent, TimedEventQueue};
use crate::runtime::RuntimeTable;

/// The monitoring engine core: configuration, runtime graph, event queue
/// and scheduler, behind one exclusive handle.
pub struct Engine {
    pub(crate) config: ConfigSnapshot,
    pub(crate) runtime: RuntimeTable,
    pub(crate) queue: TimedEventQueue,
    pub(crate) sched: SchedulerState,
    pub(crate) broker: Box<dyn Broker>,
    pinned_now: Option<DateTime<Utc>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with an empty configuration and a broker that
    /// drops all notifications.
    pub fn new() -> Self {
        Self::with_broker(Box::new(NullBroker))
    }

    /// Creates an engine announcing structural changes to `broker`.
    pub fn with_broker(broker: Box<dyn Broker>) -> Self {
        Self {
            config: ConfigSnapshot::new(),
            runtime: RuntimeTable::new(),
            queue: TimedEventQueue::new(),
            sched: SchedulerState::default(),
            broker,
            pinned_now: None,
        }
    }

    /// Pins the engine clock to a fixed instant.
    ///
    /// Scheduling decisions become deterministic, which replay and tests
    /// rely on; an unpinned engine reads the system clock.
    pub fn set_current_time(&mut self, now: DateTime<Utc>) {
        self.pinned_now = Some(now);
    }

    /// The instant scheduling decisions are evaluated against.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    /// Runs one full reconfiguration cycle against `new`.
    ///
    /// The new snapshot is expanded, diffed per entity kind against the
    /// currently applied one, and the differences are pushed through the
    /// appliers in dependency order: time periods, hosts, services, host
    /// groups, dependencies, downtimes. A resolve pass then re-validates
    /// the whole graph, and the scheduler reconciles the event queue.
    ///
    /// # Errors
    ///
    /// Fails fast on the first applier or resolve error. Changes applied
    /// before the failure are not rolled back; the engine keeps running on
    /// the partially updated in-memory state and the caller decides whether
    /// that is acceptable.
    pub fn apply(&mut self, mut new: ConfigSnapshot) -> EngineResult<()> {
        let started = std::time::Instant::now();
        expand_snapshot(&mut new)?;

        let timeperiods = diff_keyed(&self.config.timeperiods, &new.timeperiods);
        let hosts = diff_keyed(&self.config.hosts, &new.hosts);
        let services = diff_keyed(&self.config.services, &new.services);
        let hostgroups = diff_keyed(&self.config.hostgroups, &new.hostgroups);
        let host_dependencies =
            diff_set(&self.config.host_dependencies, &new.host_dependencies);
        let service_dependencies =
            diff_set(&self.config.service_dependencies, &new.service_dependencies);
        let downtimes = diff_keyed(&self.config.downtimes, &new.downtimes);

        let changes = timeperiods.change_count()
            + hosts.change_count()
            + services.change_count()
            + hostgroups.change_count()
            + host_dependencies.change_count()
            + service_dependencies.change_count()
            + downtimes.change_count();
        debug!(changes, "starting reconfiguration cycle");

        for obj in &timeperiods.added {
            self.add_timeperiod(obj)?;
        }
        for obj in &timeperiods.modified {
            self.modify_timeperiod(obj)?;
        }
        for obj in &timeperiods.removed {
            self.remove_timeperiod(obj)?;
        }

        for obj in &hosts.added {
            self.add_host(obj)?;
        }
        for obj in &hosts.modified {
            self.modify_host(obj)?;
        }
        for obj in &hosts.removed {
            self.remove_host(obj)?;
        }

        for obj in &services.added {
            self.add_service(obj)?;
        }
        for obj in &services.modified {
            self.modify_service(obj)?;
        }
        for obj in &services.removed {
            self.remove_service(obj)?;
        }

        for obj in &hostgroups.added {
            self.add_hostgroup(obj)?;
        }
        for obj in &hostgroups.modified {
            self.modify_hostgroup(obj)?;
        }
        for obj in &hostgroups.removed {
            self.remove_hostgroup(obj)?;
        }

        for obj in &host_dependencies.added {
            self.add_host_dependency(obj)?;
        }
        for obj in &host_dependencies.removed {
            self.remove_host_dependency(obj)?;
        }

        for obj in &service_dependencies.added {
            self.add_service_dependency(obj)?;
        }
        for obj in &service_dependencies.removed {
            self.remove_service_dependency(obj)?;
        }

        for obj in &downtimes.added {
            self.add_downtime(obj)?;
        }
        for obj in &downtimes.modified {
            self.modify_downtime(obj)?;
        }
        for obj in &downtimes.removed {
            self.remove_downtime(obj)?;
        }

        self.config.options = new.options.clone();

        self.resolve_hosts()?;
        self.resolve_services()?;
        self.resolve_hostgroups()?;
        self.resolve_dependencies()?;
        self.resolve_downtimes()?;

        self.apply_scheduler(&hosts, &services)?;

        info!(
            changes,
            objects = self.runtime.object_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "configuration applied"
        );
        Ok(())
    }

    /// The currently applied configuration.
    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    /// The runtime object table.
    pub fn runtime(&self) -> &RuntimeTable {
        &self.runtime
    }

    /// The timed event queue.
    pub fn queue(&self) -> &TimedEventQueue {
        &self.queue
    }

    /// The scheduling statistics from the last scheduling pass.
    pub fn scheduling_info(&self) -> &SchedulingInfo {
        &self.sched.info
    }

    /// Returns the pending check event for a host, if one is queued.
    pub fn pending_host_check(&self, name: &str) -> Option<&TimedEvent> {
        let host = self.runtime.host(name)?;
        let handle = self
            .queue
            .find(Priority::Low, EventKind::HostCheck, host.id)?;
        self.queue.get(handle)
    }

    /// Returns the pending check event for a service, if one is queued.
    pub fn pending_service_check(&self, key: &ServiceKey) -> Option<&TimedEvent> {
        let service = self.runtime.service(key)?;
        let handle = self
            .queue
            .find(Priority::Low, EventKind::ServiceCheck, service.id)?;
        self.queue.get(handle)
    }
}
