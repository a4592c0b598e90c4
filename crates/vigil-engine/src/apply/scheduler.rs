//! Scheduler applier.
//!
//! Translates "this batch of hosts/services was added, modified or
//! removed" into timed event queue mutations, and keeps the periodic
//! maintenance events aligned with the global options. Check placement
//! fans start times out across the spread window instead of firing every
//! check at once, and interleaves services of different hosts so no single
//! host takes a burst.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use tracing::debug;
use vigil_config::{Difference, HostConfig, ServiceConfig, ServiceKey};
use vigil_core::{ObjectId, TimePeriod, is_time_in_period, next_valid_time};

use crate::broker::{ObjectKind, service_key_label};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::events::{EventHandle, EventKind, Priority, TimedEventQueue, check_event, recurring_event};

/// Longest spread window the scheduler accepts, in seconds (366 days).
const MAX_CHECK_SPREAD: f64 = 366.0 * 24.0 * 3600.0;

/// Global scheduling statistics, recomputed from the full runtime
/// inventory whenever a batch of objects needs scheduling.
#[derive(Debug, Clone, Default)]
pub struct SchedulingInfo {
    /// Total hosts in the runtime table.
    pub total_hosts: u32,
    /// Hosts eligible for active checking.
    pub total_scheduled_hosts: u32,
    /// Average check interval of schedulable hosts, in seconds.
    pub average_host_check_interval: f64,
    /// Window host check start times are spread across, in seconds.
    pub host_check_spread: f64,
    /// Offset between consecutive host check start times, in seconds.
    pub host_inter_check_delay: f64,
    /// Earliest host check placed by the last scheduling pass.
    pub first_host_check: Option<DateTime<Utc>>,
    /// Latest host check placed by the last scheduling pass.
    pub last_host_check: Option<DateTime<Utc>>,

    /// Total services in the runtime table.
    pub total_services: u32,
    /// Services eligible for active checking.
    pub total_scheduled_services: u32,
    /// Average check interval of schedulable services, in seconds.
    pub average_service_check_interval: f64,
    /// Average services per host, over all services.
    pub average_services_per_host: f64,
    /// Average schedulable services per host.
    pub average_scheduled_services_per_host: f64,
    /// Window service check start times are spread across, in seconds.
    pub service_check_spread: f64,
    /// Offset between consecutive service check start times, in seconds.
    pub service_inter_check_delay: f64,
    /// Number of services from different hosts interleaved between two
    /// checks of services on the same host.
    pub service_interleave_factor: u32,
    /// Earliest service check placed by the last scheduling pass.
    pub first_service_check: Option<DateTime<Utc>>,
    /// Latest service check placed by the last scheduling pass.
    pub last_service_check: Option<DateTime<Utc>>,
}

/// One periodic maintenance event slot: the queued handle plus the
/// (toggle, interval) pair it was created from.
#[derive(Debug, Default)]
struct MiscEvent {
    handle: Option<EventHandle>,
    applied: Option<(bool, i64)>,
}

#[derive(Debug, Default)]
struct MiscEvents {
    check_reaper: MiscEvent,
    command_check: MiscEvent,
    host_freshness: MiscEvent,
    service_freshness: MiscEvent,
    reschedule_checks: MiscEvent,
    retention_save: MiscEvent,
    status_save: MiscEvent,
}

/// Scheduler bookkeeping owned by the engine.
#[derive(Debug, Default)]
pub(crate) struct SchedulerState {
    pub(crate) info: SchedulingInfo,
    misc: MiscEvents,
}

impl Engine {
    /// Reconciles the event queue with one cycle's host and service
    /// differences.
    pub(crate) fn apply_scheduler(
        &mut self,
        hosts: &Difference<HostConfig>,
        services: &Difference<ServiceConfig>,
    ) -> EngineResult<()> {
        let now = self.now();
        self.apply_misc_events(now);

        let mut hosts_to_unschedule: Vec<String> = Vec::new();
        let mut hosts_to_schedule: Vec<String> = Vec::new();
        for obj in &hosts.added {
            hosts_to_schedule.push(obj.name.clone());
        }
        for obj in &hosts.removed {
            hosts_to_unschedule.push(obj.name.clone());
        }
        for obj in &hosts.modified {
            let host = self.runtime.host(&obj.name).ok_or_else(|| {
                EngineError::internal(format!(
                    "modified host '{}' is missing from the runtime table",
                    obj.name
                ))
            })?;
            let has_event = self
                .queue
                .find(Priority::Low, EventKind::HostCheck, host.id)
                .is_some();
            let wants_event = obj.active_checks_enabled && obj.check_interval > 0.0;
            // A host keeping its event is unscheduled then rescheduled so
            // it picks up the new interval and timing.
            if has_event {
                hosts_to_unschedule.push(obj.name.clone());
            }
            if wants_event {
                hosts_to_schedule.push(obj.name.clone());
            }
        }

        let mut services_to_unschedule: Vec<ServiceKey> = Vec::new();
        let mut services_to_schedule: Vec<ServiceKey> = Vec::new();
        for obj in &services.added {
            services_to_schedule.push(obj.key());
        }
        for obj in &services.removed {
            services_to_unschedule.push(obj.key());
        }
        for obj in &services.modified {
            let key = obj.key();
            let service = self.runtime.service(&key).ok_or_else(|| {
                EngineError::internal(format!(
                    "modified service '{}' is missing from the runtime table",
                    service_key_label(&key.0, &key.1)
                ))
            })?;
            let has_event = self
                .queue
                .find(Priority::Low, EventKind::ServiceCheck, service.id)
                .is_some();
            let wants_event = obj.active_checks_enabled && obj.check_interval > 0.0;
            if has_event {
                services_to_unschedule.push(key.clone());
            }
            if wants_event {
                services_to_schedule.push(key);
            }
        }

        // Removed objects are already gone from the table (their appliers
        // unscheduled them); the lookup miss below is the expected case.
        for name in &hosts_to_unschedule {
            if let Some(host) = self.runtime.host(name) {
                let id = host.id;
                self.unschedule_host_checks(id);
                if let Some(host) = self.runtime.host_mut(name) {
                    host.check.should_be_scheduled = false;
                    host.check.next_check = None;
                }
            }
        }
        for key in &services_to_unschedule {
            if let Some(service) = self.runtime.service(key) {
                let id = service.id;
                self.unschedule_service_checks(id);
                if let Some(service) = self.runtime.service_mut(key) {
                    service.check.should_be_scheduled = false;
                    service.check.next_check = None;
                }
            }
        }

        if hosts_to_schedule.is_empty() && services_to_schedule.is_empty() {
            return Ok(());
        }

        // Spread and interleave depend on the whole population, not just
        // the delta.
        self.sched.info = SchedulingInfo::default();
        self.calculate_host_scheduling_params(now);
        self.calculate_service_scheduling_params(now);
        self.schedule_host_checks(&hosts_to_schedule, now)?;
        self.schedule_service_checks(&services_to_schedule, now)?;
        Ok(())
    }

    /// Removes every pending check event for a host. Loops until none is
    /// found, which defends against accidental duplicates.
    pub(crate) fn unschedule_host_checks(&mut self, id: ObjectId) {
        while let Some(handle) = self.queue.find(Priority::Low, EventKind::HostCheck, id) {
            self.queue.remove(handle);
        }
    }

    /// Removes every pending check event for a service.
    pub(crate) fn unschedule_service_checks(&mut self, id: ObjectId) {
        while let Some(handle) = self.queue.find(Priority::Low, EventKind::ServiceCheck, id) {
            self.queue.remove(handle);
        }
    }

    /// Recreates every periodic maintenance event whose interval or
    /// feature toggle changed since it was last applied.
    fn apply_misc_events(&mut self, now: DateTime<Utc>) {
        let options = self.config.options.clone();
        let queue = &mut self.queue;
        let misc = &mut self.sched.misc;

        reconcile_misc_event(
            queue,
            &mut misc.check_reaper,
            true,
            options.check_reaper_interval,
            EventKind::CheckReaper,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.command_check,
            true,
            options.effective_command_check_interval(),
            EventKind::CommandCheck,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.host_freshness,
            options.check_host_freshness,
            options.host_freshness_check_interval,
            EventKind::HostFreshnessCheck,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.service_freshness,
            options.check_service_freshness,
            options.service_freshness_check_interval,
            EventKind::ServiceFreshnessCheck,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.reschedule_checks,
            true,
            options.auto_rescheduling_interval,
            EventKind::RescheduleChecks,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.retention_save,
            true,
            options.retention_update_interval * 60,
            EventKind::RetentionSave,
            now,
        );
        reconcile_misc_event(
            queue,
            &mut misc.status_save,
            true,
            options.status_update_interval,
            EventKind::StatusSave,
            now,
        );
    }

    /// Walks the full host table once, marking each host schedulable or
    /// not and deriving the global host statistics.
    fn calculate_host_scheduling_params(&mut self, now: DateTime<Utc>) {
        let mut total = 0u32;
        let mut scheduled = 0u32;
        let mut interval_sum = 0.0f64;
        let mut spread_seed = f64::INFINITY;

        let names: Vec<String> = self.runtime.hosts.keys().cloned().collect();
        for name in &names {
            let Some(host) = self.runtime.host(name) else {
                continue;
            };
            let mut schedulable = host.check_interval > 0.0 && host.checks_enabled;
            if schedulable {
                schedulable = period_allows_scheduling(
                    &self.config.timeperiods,
                    host.check_period.as_deref(),
                    host.utc_offset,
                    now,
                );
            }
            total += 1;
            if schedulable {
                scheduled += 1;
                interval_sum += host.check_interval;
                spread_seed = spread_seed.min(host.check_interval);
                if host.retry_interval > 0.0 {
                    spread_seed = spread_seed.min(host.retry_interval);
                }
            } else {
                debug!(host = %name, "host will not be actively checked");
            }
            if let Some(host) = self.runtime.host_mut(name) {
                host.check.should_be_scheduled = schedulable;
            }
        }

        let info = &mut self.sched.info;
        info.total_hosts = total;
        info.total_scheduled_hosts = scheduled;
        info.average_host_check_interval = if scheduled > 0 {
            interval_sum / f64::from(scheduled)
        } else {
            0.0
        };
        info.host_check_spread = clamp_spread(spread_seed);
        info.host_inter_check_delay = if scheduled > 0 {
            info.host_check_spread / f64::from(scheduled)
        } else {
            0.0
        };
        debug!(
            total,
            scheduled,
            spread = info.host_check_spread,
            delay = info.host_inter_check_delay,
            "host scheduling parameters"
        );
    }

    /// Walks the full service table once; like the host pass, plus the
    /// interleave factor that spaces same-host services apart.
    fn calculate_service_scheduling_params(&mut self, now: DateTime<Utc>) {
        let mut total = 0u32;
        let mut scheduled = 0u32;
        let mut interval_sum = 0.0f64;
        let mut spread_seed = f64::INFINITY;

        let keys: Vec<ServiceKey> = self.runtime.services.keys().cloned().collect();
        for key in &keys {
            let Some(service) = self.runtime.service(key) else {
                continue;
            };
            let mut schedulable = service.check_interval > 0.0 && service.checks_enabled;
            if schedulable {
                schedulable = period_allows_scheduling(
                    &self.config.timeperiods,
                    service.check_period.as_deref(),
                    service.utc_offset,
                    now,
                );
            }
            total += 1;
            if schedulable {
                scheduled += 1;
                interval_sum += service.check_interval;
                spread_seed = spread_seed.min(service.check_interval);
                if service.retry_interval > 0.0 {
                    spread_seed = spread_seed.min(service.retry_interval);
                }
            } else {
                debug!(service = %service_key_label(&key.0, &key.1), "service will not be actively checked");
            }
            if let Some(service) = self.runtime.service_mut(key) {
                service.check.should_be_scheduled = schedulable;
            }
        }

        let total_hosts = self.sched.info.total_hosts;
        let info = &mut self.sched.info;
        info.total_services = total;
        info.total_scheduled_services = scheduled;
        info.average_service_check_interval = if scheduled > 0 {
            interval_sum / f64::from(scheduled)
        } else {
            0.0
        };
        info.average_services_per_host = if total_hosts > 0 {
            f64::from(total) / f64::from(total_hosts)
        } else {
            0.0
        };
        info.average_scheduled_services_per_host = if total_hosts > 0 {
            f64::from(scheduled) / f64::from(total_hosts)
        } else {
            0.0
        };
        info.service_interleave_factor = info.average_scheduled_services_per_host.ceil() as u32;
        info.service_check_spread = clamp_spread(spread_seed);
        info.service_inter_check_delay = if scheduled > 0 {
            info.service_check_spread / f64::from(scheduled)
        } else {
            0.0
        };
        debug!(
            total,
            scheduled,
            interleave = info.service_interleave_factor,
            delay = info.service_inter_check_delay,
            "service scheduling parameters"
        );
    }

    /// Places check events for a batch of hosts, fanned out across the
    /// spread window.
    fn schedule_host_checks(&mut self, names: &[String], now: DateTime<Utc>) -> EngineResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        debug!(count = names.len(), "scheduling host checks");
        let delay = self.sched.info.host_inter_check_delay;
        // Slots are consumed only by hosts actually placed, so skipped
        // hosts do not leave holes in the fan-out.
        let mut mult_factor = 0u32;
        let mut placements: Vec<(DateTime<Utc>, ObjectId)> = Vec::new();

        for name in names {
            let (schedulable, keep_forced, next) = {
                let Some(host) = self.runtime.host(name) else {
                    return Err(EngineError::internal(format!(
                        "could not schedule non-existing host '{name}'"
                    )));
                };
                let schedulable = host.check.should_be_scheduled;
                let keep_forced = !host.checks_enabled
                    && host.check.next_check.is_some()
                    && host.check.forced_check_pending;
                let next = schedulable.then(|| {
                    let mut time =
                        now + millis_of_seconds(f64::from(mult_factor) * delay);
                    if let Some(period) = host
                        .check_period
                        .as_ref()
                        .and_then(|n| self.config.timeperiods.get(n))
                    {
                        time = next_valid_time(time, period, fixed_offset(host.utc_offset));
                    }
                    time
                });
                (schedulable, keep_forced, next)
            };
            if schedulable {
                mult_factor += 1;
            }

            // Live status fields are updated even for hosts ultimately not
            // queued.
            let placement = {
                let Some(host) = self.runtime.host_mut(name) else {
                    continue;
                };
                if let Some(time) = next {
                    host.check.next_check = Some(time);
                } else if !keep_forced {
                    host.check.next_check = None;
                }
                match host.check.next_check {
                    Some(time) if schedulable || keep_forced => Some((time, host.id)),
                    _ => None,
                }
            };
            self.broker.object_updated(ObjectKind::Host, name);

            if let Some((time, id)) = placement {
                let info = &mut self.sched.info;
                info.first_host_check =
                    Some(info.first_host_check.map_or(time, |t| t.min(time)));
                info.last_host_check =
                    Some(info.last_host_check.map_or(time, |t| t.max(time)));
                placements.push((time, id));
            }
        }

        // Ascending insertion keeps queue maintenance cheap.
        placements.sort_by_key(|(time, _)| *time);
        for (time, id) in placements {
            self.queue
                .schedule(check_event(EventKind::HostCheck, id, time));
        }
        Ok(())
    }

    /// Places check events for a batch of services, interleaving services
    /// of different hosts between two checks of the same host.
    fn schedule_service_checks(
        &mut self,
        keys: &[ServiceKey],
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        debug!(count = keys.len(), "scheduling service checks");
        let delay = self.sched.info.service_inter_check_delay;
        let factor = self.sched.info.service_interleave_factor;
        let total_blocks = if factor > 0 {
            self.sched.info.total_scheduled_services.div_ceil(factor)
        } else {
            1
        };
        let mut current_block = 0u32;
        let mut position = 0u32;
        let mut placements: Vec<(DateTime<Utc>, ObjectId)> = Vec::new();

        for key in keys {
            let (schedulable, keep_forced, next) = {
                let Some(service) = self.runtime.service(key) else {
                    return Err(EngineError::internal(format!(
                        "could not schedule non-existing service '{}'",
                        service_key_label(&key.0, &key.1)
                    )));
                };
                let schedulable = service.check.should_be_scheduled;
                let keep_forced = !service.checks_enabled
                    && service.check.next_check.is_some()
                    && service.check.forced_check_pending;
                let next = if schedulable {
                    if factor > 0 && position >= factor {
                        current_block += 1;
                        position = 0;
                    }
                    let mult_factor = current_block + position * total_blocks;
                    position += 1;
                    let mut time = now + millis_of_seconds(f64::from(mult_factor) * delay);
                    if let Some(period) = service
                        .check_period
                        .as_ref()
                        .and_then(|n| self.config.timeperiods.get(n))
                    {
                        time = next_valid_time(time, period, fixed_offset(service.utc_offset));
                    }
                    Some(time)
                } else {
                    None
                };
                (schedulable, keep_forced, next)
            };

            let placement = {
                let Some(service) = self.runtime.service_mut(key) else {
                    continue;
                };
                if let Some(time) = next {
                    service.check.next_check = Some(time);
                } else if !keep_forced {
                    service.check.next_check = None;
                }
                match service.check.next_check {
                    Some(time) if schedulable || keep_forced => Some((time, service.id)),
                    _ => None,
                }
            };
            self.broker
                .object_updated(ObjectKind::Service, &service_key_label(&key.0, &key.1));

            if let Some((time, id)) = placement {
                let info = &mut self.sched.info;
                info.first_service_check =
                    Some(info.first_service_check.map_or(time, |t| t.min(time)));
                info.last_service_check =
                    Some(info.last_service_check.map_or(time, |t| t.max(time)));
                placements.push((time, id));
            }
        }

        placements.sort_by_key(|(time, _)| *time);
        for (time, id) in placements {
            self.queue
                .schedule(check_event(EventKind::ServiceCheck, id, time));
        }
        Ok(())
    }
}

/// Recreates one maintenance event slot if its toggle or interval changed.
fn reconcile_misc_event(
    queue: &mut TimedEventQueue,
    slot: &mut MiscEvent,
    enabled: bool,
    interval: i64,
    kind: EventKind,
    now: DateTime<Utc>,
) {
    let wanted = enabled && interval > 0;
    if slot.applied == Some((enabled, interval)) && slot.handle.is_some() == wanted {
        return;
    }
    if let Some(handle) = slot.handle.take() {
        queue.remove(handle);
    }
    if wanted {
        debug!(?kind, interval, "creating recurring maintenance event");
        slot.handle = Some(queue.schedule(recurring_event(
            kind,
            now + Duration::seconds(interval),
            interval,
        )));
    }
    slot.applied = Some((enabled, interval));
}

/// Returns true if `now` is inside the named period, or the period has a
/// reachable valid moment later on. A missing or unnamed period never
/// blocks scheduling.
fn period_allows_scheduling(
    timeperiods: &BTreeMap<String, TimePeriod>,
    period_name: Option<&str>,
    utc_offset: Option<i32>,
    now: DateTime<Utc>,
) -> bool {
    let Some(period) = period_name.and_then(|name| timeperiods.get(name)) else {
        return true;
    };
    let offset = fixed_offset(utc_offset);
    if is_time_in_period(now, period, offset) {
        return true;
    }
    // next_valid_time returns `now` unchanged when no valid moment exists.
    next_valid_time(now, period, offset) != now
}

/// Clamps a spread seed to the accepted window; out-of-range or unseeded
/// values collapse to zero.
fn clamp_spread(seed: f64) -> f64 {
    if seed.is_finite() && (0.0..=MAX_CHECK_SPREAD).contains(&seed) {
        seed
    } else {
        0.0
    }
}

fn fixed_offset(utc_offset: Option<i32>) -> FixedOffset {
    utc_offset
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

fn millis_of_seconds(seconds: f64) -> Duration {
    Duration::milliseconds((seconds * 1000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_config::ConfigSnapshot;
    use vigil_core::DayRange;

    #[test]
    fn spread_clamp_collapses_out_of_range_values() {
        assert_eq!(clamp_spread(60.0), 60.0);
        assert_eq!(clamp_spread(0.0), 0.0);
        assert_eq!(clamp_spread(-1.0), 0.0);
        assert_eq!(clamp_spread(f64::INFINITY), 0.0);
        assert_eq!(clamp_spread(MAX_CHECK_SPREAD + 1.0), 0.0);
    }

    #[test]
    fn missing_period_allows_scheduling() {
        let timeperiods = BTreeMap::new();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        assert!(period_allows_scheduling(&timeperiods, None, None, now));
        assert!(period_allows_scheduling(
            &timeperiods,
            Some("workhours"),
            None,
            now
        ));
    }

    #[test]
    fn forced_check_keeps_its_placement_when_checks_are_disabled() {
        let noon = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let mut engine = Engine::new();
        engine.set_current_time(noon);
        let mut snapshot = ConfigSnapshot::new();
        snapshot
            .add_host(HostConfig::new("a").with_active_checks(false))
            .unwrap();
        engine.apply(snapshot).unwrap();
        assert!(engine.pending_host_check("a").is_none());

        // An operator forced a check while active checks were off.
        let pending = noon + Duration::seconds(45);
        let host = engine.runtime.host_mut("a").unwrap();
        host.check.next_check = Some(pending);
        host.check.forced_check_pending = true;

        engine.schedule_host_checks(&["a".into()], noon).unwrap();

        let host = engine.runtime.host("a").unwrap();
        assert!(!host.check.should_be_scheduled);
        assert_eq!(host.check.next_check, Some(pending));
        let event = engine.pending_host_check("a").expect("forced one-shot queued");
        assert_eq!(event.scheduled_time, pending);
    }

    #[test]
    fn out_of_window_period_with_future_window_allows_scheduling() {
        let mut timeperiods = BTreeMap::new();
        timeperiods.insert(
            "monday-business".to_string(),
            TimePeriod::always("monday-business")
                .with_range(1, DayRange::new(9 * 3600, 17 * 3600)),
        );
        // Sunday noon: outside, but Monday morning is reachable.
        let sunday = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert!(period_allows_scheduling(
            &timeperiods,
            Some("monday-business"),
            None,
            sunday
        ));
    }
}
