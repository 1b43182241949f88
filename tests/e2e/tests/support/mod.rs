//! Shared fixture builders and a full-pipeline harness for the journey
//! tests. Builds real `MockConnector` fixtures, runs the actual
//! `ModelBuilder` against them (not hand-assembled snapshots), and hands
//! back a `RecommendationEngine` wired to the result — exercising the
//! same path an operator's `build`/`serve` pair would.

use chrono::{Duration, Utc};
use recsys_core::connector::{Fixture, MockConnector};
use recsys_core::domain::{AccountKind, Event, EventId, Interaction, InteractionKind, SocialEdge, User};
use recsys_core::embeddings::DummyEmbedder;
use recsys_core::{
    BuildReport, BuilderConfig, Connector, EmbeddingGenerator, EngineConfig, ModelBuilder, RecommendationEngine,
    VectorStore,
};
use std::sync::Arc;

pub const EMBED_DIM: usize = 32;

pub fn event(id: EventId, organizer: &str, category: &str, tags: &[&str], offset_days: i64) -> Event {
    let now = Utc::now();
    Event {
        event_id: id,
        title: format!("Event {id}"),
        description: Some(format!("A gathering about {category}")),
        category: category.to_string(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        location: Some("Downtown".into()),
        start_time: now + Duration::days(offset_days),
        end_time: now + Duration::days(offset_days) + Duration::hours(2),
        max_attendees: None,
        organizer_id: organizer.to_string(),
        organization_id: None,
        archived: false,
        archived_at: None,
    }
}

pub fn user(id: &str, interests: &[&str]) -> User {
    User {
        user_id: id.to_string(),
        username: id.to_string(),
        bio: Some(format!("Enjoys {}", interests.join(" and "))),
        location: Some("Downtown".into()),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        kind: AccountKind::Individual,
    }
}

pub fn going(user_id: &str, event_id: EventId, days_ago: i64) -> Interaction {
    Interaction { user_id: user_id.into(), event_id, kind: InteractionKind::Going, created_at: Utc::now() - Duration::days(days_ago) }
}

pub fn interested(user_id: &str, event_id: EventId, days_ago: i64) -> Interaction {
    Interaction {
        user_id: user_id.into(),
        event_id,
        kind: InteractionKind::Interested,
        created_at: Utc::now() - Duration::days(days_ago),
    }
}

pub fn follows(follower: &str, followee: &str) -> SocialEdge {
    SocialEdge { follower: follower.into(), followee: followee.into(), created_at: Utc::now() }
}

/// A fully built model plus the collaborators that built it, so a test
/// can both call `engine.recommend` and reach back into the store/
/// connector to mutate state mid-scenario (corruption, republish).
pub struct Harness {
    pub store: Arc<VectorStore>,
    pub dir: tempfile::TempDir,
    pub connector: Arc<dyn Connector>,
    pub embedder: Arc<dyn EmbeddingGenerator>,
    pub engine: RecommendationEngine,
    pub report: BuildReport,
}

pub fn build(fixture: Fixture) -> Harness {
    build_with_engine_config(fixture, EngineConfig::default())
}

pub fn build_with_engine_config(fixture: Fixture, engine_config: EngineConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = VectorStore::new(dir.path());
    let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).expect("fixture must be valid"));
    let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(EMBED_DIM));
    let builder = ModelBuilder::new(BuilderConfig::default());
    let report = builder
        .run(connector.as_ref(), embedder.as_ref(), &store, Utc::now())
        .expect("fixture has enough events/users to build");

    let store = Arc::new(store);
    let engine =
        RecommendationEngine::new(Arc::clone(&store), Arc::clone(&connector), Arc::clone(&embedder), engine_config);

    Harness { store, dir, connector, embedder, engine, report }
}
