//! S4: a corrupted `events` collection (checksum mismatch) makes the
//! Engine fall back to the popularity ordering — soonest `start_time`
//! first, zero score, `source = fallback` — rather than surfacing the
//! integrity error to the caller.

#[path = "../support/mod.rs"]
mod support;

use recsys_core::{Source, Strategy};
use support::{build, event, user};

#[tokio::test]
async fn corrupted_events_matrix_triggers_popularity_fallback() {
    use recsys_core::connector::Fixture;

    let events = vec![
        event(1, "organizer", "music", &[], 10),
        event(2, "organizer", "food", &[], 2),
        event(3, "organizer", "art", &[], 6),
        event(4, "organizer", "sports", &[], 20),
        event(5, "organizer", "tech", &[], 1),
    ];
    let fixture = Fixture { events, users: vec![user("viewer", &["music"])], ..Default::default() };
    let harness = build(fixture);

    let matrix_path = harness.store.current_dir("events").unwrap().join("matrix.bin");
    let mut bytes = std::fs::read(&matrix_path).unwrap();
    bytes[0] ^= 0xFF;
    std::fs::write(&matrix_path, bytes).unwrap();

    let result = harness.engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();

    assert_eq!(result.items.len(), 5);
    assert!(result.items.iter().all(|i| i.source == Source::Fallback && i.score == 0.0));
    let ids: Vec<_> = result.items.iter().map(|i| i.event_id).collect();
    assert_eq!(ids, vec![5, 2, 3, 1, 4], "fallback must order by soonest start_time");
}
