//! S2: when followees are already going to a candidate event, the
//! friend boost lifts its score by exactly the ratio each strategy's
//! weight table promises — `friends_boosted` at 1.60x vs `hybrid`'s
//! 1.20x for two engaged friends, on top of identical content
//! similarity and recency.

#[path = "../support/mod.rs"]
mod support;

use recsys_core::Strategy;
use support::{build, event, follows, going, interested, user};

#[tokio::test]
async fn friends_going_lifts_score_by_the_strategys_friend_step() {
    use recsys_core::connector::Fixture;

    let events = vec![
        event(1, "organizer", "music", &[], 3),
        event(2, "organizer", "music", &[], 5),
        event(3, "organizer", "food", &[], 7),
        event(4, "organizer", "art", &[], 9),
        event(5, "organizer", "sports", &[], 11),
    ];
    let fixture = Fixture {
        events,
        users: vec![user("viewer", &["music"]), user("f1", &[]), user("f2", &[])],
        interactions: vec![going("viewer", 1, 1), going("f1", 2, 1), interested("f2", 2, 1)],
        social_edges: vec![follows("viewer", "f1"), follows("viewer", "f2")],
    };
    let harness = build(fixture);

    let hybrid = harness.engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();
    let boosted = harness.engine.recommend("viewer", 5, Strategy::FriendsBoosted).await.unwrap();

    assert!(hybrid.items.iter().all(|i| i.event_id != 1), "viewer's own going event is excluded");

    let hybrid_item = hybrid.items.iter().find(|i| i.event_id == 2).expect("event 2 present in hybrid results");
    let boosted_item = boosted.items.iter().find(|i| i.event_id == 2).expect("event 2 present in boosted results");
    assert_eq!(hybrid_item.friend_count, 2);
    assert_eq!(boosted_item.friend_count, 2);

    let ratio = boosted_item.score / hybrid_item.score;
    assert!((ratio - (1.60 / 1.20)).abs() < 1e-6, "got ratio {ratio}");
}
