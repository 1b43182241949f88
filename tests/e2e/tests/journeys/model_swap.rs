//! S6: snapshot isolation. A `ModelHandle` opened before a concurrent
//! Model Builder run keeps serving the version it opened — a publish is
//! an atomic rename, never an in-place mutation, so an in-flight
//! request never sees a half-swapped model.

#[path = "../support/mod.rs"]
mod support;

use recsys_core::connector::{Fixture, MockConnector};
use recsys_core::{BuilderConfig, Connector, ModelBuilder, ModelHandle, Strategy};
use std::sync::Arc;
use support::{build, event, user};

#[tokio::test]
async fn in_flight_snapshot_is_unaffected_by_a_concurrent_republish() {
    let events_v1 = vec![
        event(1, "organizer", "music", &[], 3),
        event(2, "organizer", "music", &[], 5),
        event(3, "organizer", "music", &[], 7),
        event(4, "organizer", "music", &[], 9),
        event(5, "organizer", "music", &[], 11),
    ];
    let fixture_v1 = Fixture { events: events_v1, users: vec![user("viewer", &["music"])], ..Default::default() };
    let harness = build(fixture_v1);

    let version_v1 = harness.engine.current_version().unwrap();
    let handle_v1 = ModelHandle::load(&harness.store).expect("v1 snapshot opens cleanly");
    assert_eq!(handle_v1.version, version_v1);
    assert_eq!(handle_v1.events.ids, vec!["1", "2", "3", "4", "5"]);

    // An operator reruns the builder against an entirely different event
    // set, republishing "events" in place while `handle_v1` is still held.
    let events_v2 = vec![
        event(10, "organizer", "music", &[], 3),
        event(11, "organizer", "music", &[], 5),
        event(12, "organizer", "music", &[], 7),
        event(13, "organizer", "music", &[], 9),
        event(14, "organizer", "music", &[], 11),
    ];
    let fixture_v2 = Fixture { events: events_v2, users: vec![user("viewer", &["music"])], ..Default::default() };
    let connector_v2: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture_v2).unwrap());
    let builder = ModelBuilder::new(BuilderConfig::default());
    let report_v2 = builder
        .run(connector_v2.as_ref(), harness.embedder.as_ref(), &harness.store, chrono::Utc::now())
        .expect("v2 build succeeds");

    // The handle opened before the republish is untouched.
    assert_eq!(handle_v1.events.ids, vec!["1", "2", "3", "4", "5"]);

    // A handle opened after the republish sees only v2.
    let handle_v2 = ModelHandle::load(&harness.store).expect("v2 snapshot opens cleanly");
    assert_ne!(handle_v2.version, handle_v1.version);
    assert_eq!(handle_v2.events.ids, vec!["10", "11", "12", "13", "14"]);
    assert_ne!(report_v2.version, version_v1);

    // And a fresh request against the engine naturally picks up v2.
    let result = harness.engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();
    assert_eq!(result.model_version, handle_v2.version);
    assert!(result.items.iter().all(|i| i.event_id >= 10), "v1 events must not leak into a v2 response");
}
