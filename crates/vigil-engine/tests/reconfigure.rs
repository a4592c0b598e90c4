//! Full reconfiguration cycles against the runtime graph.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use vigil_config::{
    ConfigSnapshot, DependencyKind, DowntimeConfig, DowntimeTarget, HostConfig,
    HostDependencyConfig, HostGroupConfig, ServiceConfig,
};
use vigil_core::{DayRange, TimePeriod};
use vigil_engine::{BrokerEvent, Engine, EngineError, EventKind, ObjectKind, RecordingBroker};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_current_time(noon());
    engine
}

#[test]
fn removing_a_host_cleans_backlinks_and_events() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("gw")).unwrap();
    snapshot
        .add_host(HostConfig::new("web").with_parents(vec!["gw".into()]))
        .unwrap();
    engine.apply(snapshot).unwrap();

    let gw_id = engine.runtime().host("gw").unwrap().id;
    let web = engine.runtime().host("web").unwrap();
    assert!(web.parents.contains(&gw_id));
    assert!(engine.runtime().host("gw").unwrap().children.contains(&web.id));

    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("web")).unwrap();
    engine.apply(snapshot).unwrap();

    assert!(engine.runtime().host("gw").is_none());
    let web = engine.runtime().host("web").unwrap();
    assert!(web.parents.is_empty());
    // Only web's check event survives.
    let low: Vec<_> = engine
        .queue()
        .iter_low()
        .filter(|e| e.kind == EventKind::HostCheck)
        .collect();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].object, Some(web.id));
}

#[test]
fn repeated_removal_is_a_noop() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    snapshot.add_service(ServiceConfig::new("a", "ping")).unwrap();
    engine.apply(snapshot).unwrap();

    engine.apply(ConfigSnapshot::new()).unwrap();
    engine.apply(ConfigSnapshot::new()).unwrap();

    assert_eq!(engine.runtime().object_count(), 0);
    assert_eq!(engine.queue().iter_low().count(), 0);
}

#[test]
fn broker_sees_the_object_lifecycle() {
    let recorder = Rc::new(RefCell::new(RecordingBroker::new()));
    let mut engine = Engine::with_broker(Box::new(recorder.clone()));
    engine.set_current_time(noon());

    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    engine.apply(snapshot).unwrap();

    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_host(HostConfig::new("a").with_address("10.0.0.1"))
        .unwrap();
    engine.apply(snapshot).unwrap();

    engine.apply(ConfigSnapshot::new()).unwrap();

    let events = &recorder.borrow().events;
    assert!(events.contains(&BrokerEvent::Added(ObjectKind::Host, "a".into())));
    assert!(events.contains(&BrokerEvent::Updated(ObjectKind::Host, "a".into())));
    assert!(events.contains(&BrokerEvent::Removed(ObjectKind::Host, "a".into())));
}

#[test]
fn modify_preserves_identity_and_state() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    engine.apply(snapshot).unwrap();
    let id = engine.runtime().host("a").unwrap().id;

    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_host(HostConfig::new("a").with_address("10.0.0.1"))
        .unwrap();
    engine.apply(snapshot).unwrap();

    let host = engine.runtime().host("a").unwrap();
    assert_eq!(host.id, id);
    assert_eq!(host.address, "10.0.0.1");
}

#[test]
fn unknown_parent_fails_resolve() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_host(HostConfig::new("web").with_parents(vec!["ghost".into()]))
        .unwrap();

    let err = engine.apply(snapshot).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn service_without_host_is_rejected() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_service(ServiceConfig::new("ghost", "ping"))
        .unwrap();

    let err = engine.apply(snapshot).unwrap_err();
    assert!(matches!(err, EngineError::Configuration { .. }));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn circular_dependency_fails_resolve_naming_a_member() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    snapshot.add_host(HostConfig::new("b")).unwrap();
    let mut forward = HostDependencyConfig::new(vec!["a".into()], vec!["b".into()]);
    forward.kind = DependencyKind::Execution;
    let mut backward = HostDependencyConfig::new(vec!["b".into()], vec!["a".into()]);
    backward.kind = DependencyKind::Execution;
    snapshot.add_host_dependency(forward);
    snapshot.add_host_dependency(backward);

    let err = engine.apply(snapshot).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    assert!(err.to_string().contains("circular"));
}

#[test]
fn group_membership_follows_configuration() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    snapshot.add_host(HostConfig::new("b")).unwrap();
    snapshot
        .add_hostgroup(HostGroupConfig::new(
            "frontends",
            vec!["a".into(), "b".into()],
        ))
        .unwrap();
    engine.apply(snapshot).unwrap();

    let a_id = engine.runtime().host("a").unwrap().id;
    let b_id = engine.runtime().host("b").unwrap().id;
    let members = &engine.runtime().group_members["frontends"];
    assert!(members.contains(&a_id) && members.contains(&b_id));

    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    snapshot.add_host(HostConfig::new("b")).unwrap();
    snapshot
        .add_hostgroup(HostGroupConfig::new("frontends", vec!["a".into()]))
        .unwrap();
    engine.apply(snapshot).unwrap();

    let members = &engine.runtime().group_members["frontends"];
    assert!(members.contains(&a_id) && !members.contains(&b_id));
}

#[test]
fn group_with_unknown_member_fails_resolve() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_hostgroup(HostGroupConfig::new("frontends", vec!["ghost".into()]))
        .unwrap();

    let err = engine.apply(snapshot).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
}

#[test]
fn recurring_downtime_window_snaps_into_its_period() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot
        .add_timeperiod(
            TimePeriod::always("monday-business")
                .with_range(1, DayRange::new(9 * 3600, 17 * 3600)),
        )
        .unwrap();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    // Sunday noon, outside the period.
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();
    snapshot
        .add_downtime(
            DowntimeConfig::new(7, DowntimeTarget::Host { host: "a".into() }, start, end)
                .with_recurrence(86_400, "monday-business"),
        )
        .unwrap();
    engine.apply(snapshot).unwrap();

    let downtime = &engine.runtime().downtimes[&7];
    assert_eq!(
        downtime.start_time,
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    );
    assert_eq!(
        downtime.end_time,
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    );
    assert!(engine.runtime().host("a").unwrap().downtimes.contains(&7));
}

#[test]
fn downtime_on_unknown_target_is_rejected() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    let start = noon();
    let end = noon() + chrono::Duration::hours(1);
    snapshot
        .add_downtime(DowntimeConfig::new(
            1,
            DowntimeTarget::Host { host: "ghost".into() },
            start,
            end,
        ))
        .unwrap();

    let err = engine.apply(snapshot).unwrap_err();
    assert!(matches!(err, EngineError::Configuration { .. }));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn removing_a_host_and_its_service_in_one_cycle() {
    let mut engine = engine();
    let mut snapshot = ConfigSnapshot::new();
    snapshot.add_host(HostConfig::new("a")).unwrap();
    snapshot.add_service(ServiceConfig::new("a", "http")).unwrap();
    engine.apply(snapshot).unwrap();
    assert_eq!(engine.runtime().object_count(), 2);

    engine.apply(ConfigSnapshot::new()).unwrap();
    assert_eq!(engine.runtime().object_count(), 0);
    assert_eq!(engine.queue().iter_low().count(), 0);
    assert!(engine.config().hosts.is_empty());
    assert!(engine.config().services.is_empty());
}
