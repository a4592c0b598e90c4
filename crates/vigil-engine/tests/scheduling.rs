//! Scheduler behavior across reconfiguration cycles.

use chrono::{DateTime, Duration, TimeZone, Utc};
use vigil_config::{ConfigSnapshot, HostConfig, ServiceConfig};
use vigil_engine::{Engine, EventKind, Priority};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_current_time(noon());
    engine
}

fn host(name: &str, interval: f64) -> HostConfig {
    HostConfig::new(name).with_intervals(interval, interval)
}

fn count_checks(engine: &Engine, kind: EventKind) -> usize {
    engine.queue().iter_low().filter(|e| e.kind == kind).count()
}

#[test]
fn new_host_gets_one_event_within_its_interval() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(host("a", 60.0)).unwrap();
    engine.apply(snapshot).unwrap();

    let event = engine.pending_host_check("a").expect("event queued");
    assert_eq!(event.kind, EventKind::HostCheck);
    assert_eq!(event.priority, Priority::Low);
    assert!(event.scheduled_time >= noon());
    assert!(event.scheduled_time < noon() + Duration::seconds(60));

    let info = engine.scheduling_info();
    assert_eq!(info.total_scheduled_hosts, 1);
    assert_eq!(info.host_check_spread, 60.0);
    assert_eq!(info.host_inter_check_delay, 60.0);

    let runtime_host = engine.runtime().host("a").unwrap();
    assert!(runtime_host.check.should_be_scheduled);
    assert_eq!(runtime_host.check.next_check, Some(event.scheduled_time));
}

#[test]
fn zero_interval_removes_the_pending_event() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(host("a", 60.0)).unwrap();
    engine.apply(snapshot).unwrap();
    assert!(engine.pending_host_check("a").is_some());

    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(host("a", 0.0)).unwrap();
    engine.apply(snapshot).unwrap();

    assert!(engine.pending_host_check("a").is_none());
    assert_eq!(count_checks(&engine, EventKind::HostCheck), 0);
    let runtime_host = engine.runtime().host("a").unwrap();
    assert!(!runtime_host.check.should_be_scheduled);
    assert!(runtime_host.check.next_check.is_none());
}

#[test]
fn disabling_active_checks_removes_the_pending_event() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(host("a", 60.0)).unwrap();
    engine.apply(snapshot).unwrap();

    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_host(host("a", 60.0).with_active_checks(false))
        .unwrap();
    engine.apply(snapshot).unwrap();

    assert!(engine.pending_host_check("a").is_none());
}

#[test]
fn at_most_one_pending_check_per_host_across_reapplies() {
    let mut engine = engine();
    for interval in [60.0, 90.0, 90.0, 45.0] {
        let mut snapshot = ConfigSnapshot::new();
        snapshot.add_host(host("a", interval)).unwrap();
        snapshot.add_host(host("b", interval)).unwrap();
        engine.apply(snapshot).unwrap();
        assert_eq!(count_checks(&engine, EventKind::HostCheck), 2);
        assert!(engine.pending_host_check("a").is_some());
        assert!(engine.pending_host_check("b").is_some());
    }
}

#[test]
fn inter_check_delay_scales_with_population() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    for name in ["h1", "h2", "h3", "h4"] {
        snapshot.add_host(host(name, 120.0)).unwrap();
    }
    engine.apply(snapshot).unwrap();

    let info = engine.scheduling_info();
    assert_eq!(info.total_hosts, 4);
    assert_eq!(info.total_scheduled_hosts, 4);
    assert_eq!(info.average_host_check_interval, 120.0);
    assert_eq!(info.host_check_spread, 120.0);
    assert_eq!(info.host_inter_check_delay, 30.0);

    // Batch order is key order, so placements fan out 30s apart.
    for (index, name) in ["h1", "h2", "h3", "h4"].iter().enumerate() {
        let event = engine.pending_host_check(name).unwrap();
        assert_eq!(
            event.scheduled_time,
            noon() + Duration::seconds(30 * index as i64)
        );
    }
    assert_eq!(info.first_host_check, Some(noon()));
    assert_eq!(info.last_host_check, Some(noon() + Duration::seconds(90)));
}

#[test]
fn interleave_factor_averages_services_over_hosts() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(host("h1", 300.0)).unwrap();
    snapshot.add_host(host("h2", 300.0)).unwrap();
    for description in ["disk", "load", "mem"] {
        snapshot
            .add_service(ServiceConfig::new("h1", description))
            .unwrap();
    }
    snapshot.add_service(ServiceConfig::new("h2", "disk")).unwrap();
    engine.apply(snapshot).unwrap();

    let info = engine.scheduling_info();
    assert_eq!(info.total_services, 4);
    assert_eq!(info.total_scheduled_services, 4);
    assert_eq!(info.average_services_per_host, 2.0);
    assert_eq!(info.average_scheduled_services_per_host, 2.0);
    assert_eq!(info.service_interleave_factor, 2);

    assert_eq!(count_checks(&engine, EventKind::ServiceCheck), 4);
    for key in [("h1", "disk"), ("h1", "load"), ("h1", "mem"), ("h2", "disk")] {
        let key = (key.0.to_string(), key.1.to_string());
        assert!(engine.pending_service_check(&key).is_some());
    }
}

#[test]
fn maintenance_events_follow_their_options() {
    let mut engine = engine();
    engine.apply(ConfigSnapshot::new()).unwrap();

    let kind_count = |engine: &Engine, kind: EventKind| {
        engine.queue().iter_high().filter(|e| e.kind == kind).count()
    };
    let interval_of = |engine: &Engine, kind: EventKind| {
        engine
            .queue()
            .iter_high()
            .find(|e| e.kind == kind)
            .map(|e| e.recurring_interval)
    };

    assert_eq!(interval_of(&engine, EventKind::CheckReaper), Some(10));
    assert_eq!(interval_of(&engine, EventKind::CommandCheck), Some(5));
    // Host freshness is off by default, service freshness on.
    assert_eq!(kind_count(&engine, EventKind::HostFreshnessCheck), 0);
    assert_eq!(interval_of(&engine, EventKind::ServiceFreshnessCheck), Some(60));
    assert_eq!(interval_of(&engine, EventKind::RescheduleChecks), Some(30));
    assert_eq!(interval_of(&engine, EventKind::RetentionSave), Some(3600));
    assert_eq!(interval_of(&engine, EventKind::StatusSave), Some(60));

    // Unchanged options keep the same events across a cycle.
    engine.apply(ConfigSnapshot::new()).unwrap();
    assert_eq!(kind_count(&engine, EventKind::CheckReaper), 1);

    let mut snapshot = ConfigSnapshot::new();
    snapshot.options = snapshot
        .options
        .with_check_reaper_interval(5)
        .with_host_freshness(true, 120);
    engine.apply(snapshot).unwrap();

    assert_eq!(interval_of(&engine, EventKind::CheckReaper), Some(5));
    assert_eq!(kind_count(&engine, EventKind::CheckReaper), 1);
    assert_eq!(interval_of(&engine, EventKind::HostFreshnessCheck), Some(120));
}

#[test]
fn service_freshness_toggle_is_symmetric() {
    let mut engine = engine();
    engine.apply(ConfigSnapshot::new()).unwrap();
    let has_sweep = |engine: &Engine| {
        engine
            .queue()
            .iter_high()
            .any(|e| e.kind == EventKind::ServiceFreshnessCheck)
    };
    assert!(has_sweep(&engine));

    let mut snapshot = ConfigSnapshot::new();
    snapshot.options = snapshot.options.with_service_freshness(false, 60);
    engine.apply(snapshot).unwrap();
    assert!(!has_sweep(&engine));

    let mut snapshot = ConfigSnapshot::new();
    snapshot.options = snapshot.options.with_service_freshness(true, 60);
    engine.apply(snapshot).unwrap();
    assert!(has_sweep(&engine));
}

#[test]
fn check_outside_its_period_snaps_to_the_next_window() {
    use vigil_core::{DayRange, TimePeriod};

    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_timeperiod(
            TimePeriod::always("tuesday-business")
                .with_range(2, DayRange::new(9 * 3600, 17 * 3600)),
        )
        .unwrap();
    // Monday noon is outside the window; the next one opens Tuesday 09:00.
    snapshot
        .add_host(host("a", 60.0).with_check_period("tuesday-business"))
        .unwrap();
    engine.apply(snapshot).unwrap();

    assert_eq!(engine.scheduling_info().total_scheduled_hosts, 1);
    let event = engine.pending_host_check("a").unwrap();
    assert_eq!(
        event.scheduled_time,
        Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap()
    );
    assert_eq!(
        engine.runtime().host("a").unwrap().check.next_check,
        Some(event.scheduled_time)
    );
}
