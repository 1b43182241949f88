//! S5: an event the viewer organizes, and an event the viewer is
//! already going to, never appear in that viewer's recommendations —
//! under every strategy, not just the default.

#[path = "../support/mod.rs"]
mod support;

use recsys_core::Strategy;
use support::{build, event, follows, going, user};

#[tokio::test]
async fn organizer_and_attending_events_are_excluded_under_every_strategy() {
    use recsys_core::connector::Fixture;

    let events = vec![
        event(1, "viewer", "music", &[], 3),
        event(2, "organizer", "music", &[], 5),
        event(3, "organizer", "food", &[], 7),
        event(4, "organizer", "art", &[], 9),
        event(5, "organizer", "sports", &[], 11),
        event(6, "organizer", "tech", &[], 13),
    ];
    let fixture = Fixture {
        events,
        users: vec![user("viewer", &["music"]), user("friend", &[])],
        social_edges: vec![follows("viewer", "friend")],
        interactions: vec![going("viewer", 2, 1), going("friend", 3, 1)],
    };
    let harness = build(fixture);

    for strategy in Strategy::ALL {
        let result = harness.engine.recommend("viewer", 10, strategy).await.unwrap();
        assert!(
            result.items.iter().all(|i| i.event_id != 1),
            "{strategy} must exclude the event viewer organizes"
        );
        assert!(
            result.items.iter().all(|i| i.event_id != 2),
            "{strategy} must exclude the event viewer is already going to"
        );
    }
}
