//! S1: a brand-new individual user with no interaction history gets
//! ranked purely off their profile vector and the recency multiplier —
//! no friend boost, no fallback.

#[path = "../support/mod.rs"]
mod support;

use recsys_core::{Source, Strategy};
use support::{build, event, user};

#[tokio::test]
async fn cold_start_individual_ranks_by_profile_similarity_and_recency() {
    use recsys_core::connector::Fixture;

    let events = vec![
        event(1, "organizer", "music", &["live"], 3),
        event(2, "organizer", "food", &["truck"], 5),
        event(3, "organizer", "art", &["gallery"], 10),
        event(4, "organizer", "sports", &["running"], 20),
        event(5, "organizer", "tech", &["meetup"], 2),
    ];
    let fixture = Fixture { events, users: vec![user("newcomer", &["music", "live"])], ..Default::default() };
    let harness = build(fixture);

    let result = harness.engine.recommend("newcomer", 5, Strategy::Hybrid).await.unwrap();

    assert_eq!(result.items.len(), 5);
    assert!(result.items.iter().all(|i| i.friend_count == 0), "a brand-new user has no friends engaged");
    assert!(result.items.iter().all(|i| i.source != Source::Fallback));
    for pair in result.items.windows(2) {
        assert!(pair[0].score >= pair[1].score, "items must be ranked by descending score");
    }
}
