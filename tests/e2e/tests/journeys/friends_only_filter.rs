//! S3: `friends_only` drops every candidate with zero engaged friends
//! and ranks survivors purely by friend count (content similarity plays
//! no part — `base_sim_weight` is zero for this strategy).

#[path = "../support/mod.rs"]
mod support;

use recsys_core::{Source, Strategy};
use support::{build, event, follows, going, user};

#[tokio::test]
async fn friends_only_drops_zero_friend_candidates_and_ranks_by_friend_count() {
    use recsys_core::connector::Fixture;

    let events = vec![
        event(1, "organizer", "music", &[], 3),  // no friends engaged
        event(2, "organizer", "music", &[], 10), // one friend going
        event(3, "organizer", "music", &[], 5),  // two friends going
        event(4, "organizer", "music", &[], 20), // no friends engaged
        event(5, "organizer", "music", &[], 2),  // no friends engaged
    ];
    let fixture = Fixture {
        events,
        users: vec![user("viewer", &[]), user("f1", &[]), user("f2", &[]), user("f3", &[])],
        social_edges: vec![follows("viewer", "f1"), follows("viewer", "f2"), follows("viewer", "f3")],
        interactions: vec![going("f1", 2, 1), going("f1", 3, 1), going("f2", 3, 1)],
    };
    let harness = build(fixture);

    let result = harness.engine.recommend("viewer", 5, Strategy::FriendsOnly).await.unwrap();

    assert_eq!(result.items.len(), 2, "only events 2 and 3 have engaged friends");
    assert!(result.items.iter().all(|i| i.event_id == 2 || i.event_id == 3));
    assert!(result.items.iter().all(|i| i.source == Source::Social));

    assert_eq!(result.items[0].event_id, 3, "two engaged friends should outrank one");
    assert_eq!(result.items[0].friend_count, 2);
    assert_eq!(result.items[1].event_id, 2);
    assert_eq!(result.items[1].friend_count, 1);
}
