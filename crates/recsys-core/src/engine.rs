//! Recommendation Engine (§4.6)
//!
//! Synthesizes a per-request user vector, retrieves candidates via the
//! Vector Store, applies social and recency adjustments per the active
//! [`Strategy`], and emits a ranked, provenance-tagged result. The
//! per-request state machine is `Init -> Synthesize -> Retrieve -> Boost
//! -> Rank -> Emit`, with any step able to divert to `Fallback` (§4.6);
//! that is modeled here as ordinary `?`-propagation out of
//! [`RecommendationEngine::try_recommend`], caught by
//! [`RecommendationEngine::recommend`] and turned into a fallback
//! result rather than surfaced to the caller, per the error policy in
//! §7 ("the engine never returns an empty success").
//!
//! The Engine holds no long-lived cache of the Vector Store: each
//! request opens its own [`ModelHandle`] at the start of `Retrieve`
//! (§5's "vector-store read (snapshot acquisition)" blocking point) and
//! uses only that handle for the rest of the request. A concurrent
//! Model Builder publish is invisible to an in-flight request because
//! [`crate::vectorstore::VectorStore::publish`] is an atomic rename —
//! the request's already-open snapshot keeps reading the bytes it
//! opened (§5 snapshot isolation, §8 S6).

use crate::connector::Connector;
use crate::domain::{EventId, InteractionKind};
use crate::embeddings::{normalize, EmbeddingGenerator};
use crate::error::{EngineError, Result};
use crate::strategy::{weights_for, Strategy, StrategyWeights};
use crate::text::canonical_user_text;
use crate::vectorstore::{Snapshot, VectorStore};
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Minimum non-trivial contribution a scoring component must make to be
/// reflected in the `source` tag (§4.6 step 6).
const SOURCE_THRESHOLD: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Content,
    #[serde(rename = "content+social")]
    ContentSocial,
    Social,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationItem {
    pub event_id: EventId,
    pub score: f64,
    pub friend_count: usize,
    pub source: Source,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResult {
    pub items: Vec<RecommendationItem>,
    pub model_version: String,
    pub strategy: Strategy,
    pub generated_at: DateTime<Utc>,
}

impl Serialize for Strategy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// An immutable view of one published model version, loaded fresh by
/// each request (see module docs on why the Engine does not cache this
/// across requests).
pub struct ModelHandle {
    pub version: String,
    pub events: Snapshot,
    pub users: Snapshot,
    pub user_sim: Option<Snapshot>,
}

impl ModelHandle {
    pub fn load(store: &VectorStore) -> std::result::Result<Self, crate::vectorstore::IntegrityError> {
        let events = store.open("events")?;
        let users = store.open("users")?;
        let user_sim = store.open("user_sim").ok();
        let version = events.manifest.created_at.to_rfc3339();
        Ok(Self { version, events, users, user_sim })
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// §6 `recency_horizon_days`: window for interactions pulled into
    /// user-vector synthesis and the exclusion filter.
    pub recency_horizon_days: i64,
    /// §6 `cold_start_blend`: weight given to the stored user-vector
    /// when blending it against an interaction-derived vector.
    pub cold_start_blend: f64,
    /// Floor for `k_search` (§4.6 step 2: `max(100, 4k)`).
    pub k_search_floor: usize,
    pub connector_timeout: Duration,
    pub vectorstore_timeout: Duration,
    pub embed_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recency_horizon_days: 30,
            cold_start_blend: 0.25,
            k_search_floor: 100,
            connector_timeout: Duration::from_millis(500),
            vectorstore_timeout: Duration::from_millis(250),
            embed_timeout: Duration::from_millis(750),
        }
    }
}

pub struct RecommendationEngine {
    store: Arc<VectorStore>,
    connector: Arc<dyn Connector>,
    embedder: Arc<dyn EmbeddingGenerator>,
    config: EngineConfig,
    /// Cache for on-demand cold-start embeddings, keyed by canonical
    /// profile text, so a viewer with no stored or interaction-derived
    /// vector does not re-embed an unchanged profile on every request.
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<VectorStore>,
        connector: Arc<dyn Connector>,
        embedder: Arc<dyn EmbeddingGenerator>,
        config: EngineConfig,
    ) -> Self {
        let query_cache = Mutex::new(LruCache::new(NonZeroUsize::new(100).expect("100 is non-zero")));
        Self { store, connector, embedder, config, query_cache }
    }

    /// The version currently published, without performing a request's
    /// worth of reads. Used by the server's `/health` and `/refresh`
    /// responses, not by `recommend` itself.
    pub fn current_version(&self) -> std::result::Result<String, crate::vectorstore::IntegrityError> {
        Ok(self.store.stat("events")?.created_at.to_rfc3339())
    }

    pub async fn recommend(&self, viewer_id: &str, k: usize, strategy: Strategy) -> Result<RecommendResult> {
        if !(1..=50).contains(&k) {
            return Err(EngineError::InvalidArgument(format!(
                "k must be between 1 and 50, got {k}"
            )));
        }
        if viewer_id.trim().is_empty() {
            return Err(EngineError::InvalidArgument("viewer_id must not be empty".into()));
        }

        let now = Utc::now();

        match self.try_recommend(viewer_id, k, strategy, now).await {
            Ok(result) => Ok(result),
            Err(EngineError::InvalidArgument(m)) => Err(EngineError::InvalidArgument(m)),
            Err(EngineError::Internal(m)) => Err(EngineError::Internal(m)),
            Err(_) => self.fallback(strategy, k, now).await,
        }
    }

    async fn try_recommend(
        &self,
        viewer_id: &str,
        k: usize,
        strategy: Strategy,
        now: DateTime<Utc>,
    ) -> Result<RecommendResult> {
        let weights = weights_for(strategy);

        // "Retrieve" begins with snapshot acquisition (§5): everything
        // below reads only from this one handle.
        let store = Arc::clone(&self.store);
        let handle = with_timeout(self.config.vectorstore_timeout, move || ModelHandle::load(&store)).await?;

        let viewer = with_timeout(self.config.connector_timeout, || self.connector.get_user(viewer_id))
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("viewer {viewer_id} does not exist")))?;

        let since = now - chrono::Duration::days(self.config.recency_horizon_days);
        let interactions =
            with_timeout(self.config.connector_timeout, || self.connector.recent_interactions(viewer_id, since))
                .await?;

        let user_vec = self.synthesize_user_vector(&handle, &viewer, &interactions, now).await?;

        let excluded: HashSet<EventId> = interactions
            .iter()
            .filter(|i| matches!(i.kind, InteractionKind::Going | InteractionKind::Organized))
            .map(|i| i.event_id)
            .collect();

        let k_search = self.config.k_search_floor.max(4 * k);
        let filter: &dyn Fn(&str, &serde_json::Value) -> bool =
            &|id, meta| candidate_passes_filter(id, meta, now, viewer_id, &excluded);
        let candidates =
            with_timeout(self.config.vectorstore_timeout, || handle.events.search(&user_vec, k_search, Some(filter)))
                .await?;

        let followees = with_timeout(self.config.connector_timeout, || self.connector.followees(viewer_id)).await?;

        let mut scored = Vec::with_capacity(candidates.len());
        for row in candidates {
            let meta = handle
                .events
                .metadata_for(&row.id)
                .ok_or_else(|| EngineError::Internal(format!("events collection missing metadata for {}", row.id)))?;
            let event_id: EventId = row.id.parse().map_err(|_| {
                EngineError::Internal(format!("non-integer event id in vector store: {}", row.id))
            })?;

            let friend_ids = with_timeout(self.config.connector_timeout, || {
                self.connector.friends_engaged(event_id, &followees)
            })
            .await?;
            let friend_count = friend_ids.len();

            if weights.drop_no_friends && friend_count == 0 {
                continue;
            }

            let start_time = parse_start_time(meta)?;
            let recency_mult = recency_multiplier(start_time, now);
            let base_sim = row.score as f64;

            let (raw, source) = score_candidate(base_sim, friend_count, &weights);
            let score = raw * recency_mult;

            scored.push((event_id, score, friend_count, source, start_time));
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.4.cmp(&b.4))
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        let items = scored
            .into_iter()
            .enumerate()
            .map(|(i, (event_id, score, friend_count, source, _))| RecommendationItem {
                event_id,
                score,
                friend_count,
                source,
                rank: i + 1,
            })
            .collect();

        Ok(RecommendResult {
            items,
            model_version: handle.version.clone(),
            strategy,
            generated_at: now,
        })
    }

    /// §4.6 step 1. On cold start with no stored user-vector, attempts a
    /// bounded on-demand embedding of the viewer's profile (§5: one of
    /// the three permitted serving-path blocking points).
    async fn synthesize_user_vector(
        &self,
        handle: &ModelHandle,
        viewer: &crate::domain::User,
        interactions: &[crate::domain::Interaction],
        now: DateTime<Utc>,
    ) -> Result<Vec<f32>> {
        let stored = handle.users.vector_for(&viewer.user_id).map(<[f32]>::to_vec);

        let interaction_vec = if interactions.is_empty() {
            None
        } else {
            let dim = handle.events.dim();
            let mut acc = vec![0f64; dim];
            let mut total_weight = 0f64;
            for interaction in interactions {
                let Some(vector) = handle.events.vector_for(&interaction.event_id.to_string()) else {
                    continue;
                };
                let age_days = (now - interaction.created_at).num_seconds() as f64 / 86_400.0;
                let weight = interaction.kind.base_weight() * (-age_days / 14.0).exp();
                for (a, x) in acc.iter_mut().zip(vector) {
                    *a += weight * (*x as f64);
                }
                total_weight += weight;
            }
            if total_weight > 0.0 {
                let mut v: Vec<f32> = acc.iter().map(|x| (*x / total_weight) as f32).collect();
                normalize(&mut v);
                Some(v)
            } else {
                None
            }
        };

        let user_vec = match (interaction_vec, &stored) {
            (Some(iv), Some(sv)) => {
                let b = self.config.cold_start_blend as f32;
                let mut combined: Vec<f32> =
                    iv.iter().zip(sv.iter()).map(|(i, s)| (1.0 - b) * i + b * s).collect();
                normalize(&mut combined);
                Some(combined)
            }
            (Some(iv), None) => Some(iv),
            (None, Some(sv)) => Some(sv.clone()),
            (None, None) => None,
        };

        match user_vec {
            Some(v) => Ok(v),
            None => {
                let text = canonical_user_text(viewer.bio.as_deref(), &viewer.interests, viewer.location.as_deref());
                if text.is_empty() {
                    return Err(EngineError::NotFound(format!(
                        "viewer {} has no usable interactions, stored vector, or profile text",
                        viewer.user_id
                    )));
                }
                if let Some(cached) = self.query_cache.lock().unwrap().get(&text) {
                    return Ok(cached.clone());
                }
                let vector = with_timeout(self.config.embed_timeout, || self.embedder.embed_one(&text)).await?;
                self.query_cache.lock().unwrap().put(text, vector.clone());
                Ok(vector)
            }
        }
    }

    async fn fallback(&self, strategy: Strategy, k: usize, now: DateTime<Utc>) -> Result<RecommendResult> {
        let mut events = with_timeout(self.config.connector_timeout, || self.connector.future_events(now))
            .await
            .map_err(|e| EngineError::Internal(format!("fallback connector read failed: {e}")))?;

        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.event_id.cmp(&b.event_id)));
        events.truncate(k);

        let version = self.current_version().unwrap_or_else(|_| "unavailable".to_string());

        let items = events
            .into_iter()
            .enumerate()
            .map(|(i, e)| RecommendationItem {
                event_id: e.event_id,
                score: 0.0,
                friend_count: 0,
                source: Source::Fallback,
                rank: i + 1,
            })
            .collect();

        Ok(RecommendResult { items, model_version: version, strategy, generated_at: now })
    }
}

fn score_candidate(base_sim: f64, friend_count: usize, weights: &StrategyWeights) -> (f64, Source) {
    let capped = friend_count.min(weights.friend_cap as usize) as f64;
    if weights.drop_no_friends {
        return (weights.friend_step * capped, Source::Social);
    }

    let friend_mult = 1.0 + weights.friend_step * capped;
    let raw = weights.base_sim_weight * base_sim * friend_mult;
    let social_contribution = weights.base_sim_weight * base_sim * (friend_mult - 1.0);

    let content = base_sim.abs() > SOURCE_THRESHOLD;
    let social = social_contribution.abs() > SOURCE_THRESHOLD;
    let source = match (content, social) {
        (true, true) => Source::ContentSocial,
        (true, false) => Source::Content,
        (false, true) => Source::Social,
        (false, false) => Source::Content,
    };
    (raw, source)
}

fn recency_multiplier(start_time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days_until_start = (start_time - now).num_days();
    if days_until_start <= 7 {
        1.25
    } else if days_until_start <= 14 {
        1.10
    } else {
        1.00
    }
}

fn parse_start_time(meta: &serde_json::Value) -> Result<DateTime<Utc>> {
    meta.get("start_time")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EngineError::Internal("candidate metadata missing start_time".into()))
}

fn candidate_passes_filter(
    id: &str,
    meta: &serde_json::Value,
    now: DateTime<Utc>,
    viewer_id: &str,
    excluded: &HashSet<EventId>,
) -> bool {
    let Ok(event_id) = id.parse::<EventId>() else {
        return false;
    };
    if excluded.contains(&event_id) {
        return false;
    }
    let archived = meta.get("archived").and_then(|v| v.as_bool()).unwrap_or(false);
    if archived {
        return false;
    }
    let organizer_is_viewer = meta
        .get("organizer_id")
        .and_then(|v| v.as_str())
        .map(|o| o == viewer_id)
        .unwrap_or(false);
    if organizer_is_viewer {
        return false;
    }
    match parse_start_time(meta) {
        Ok(start) => start > now,
        Err(_) => false,
    }
}

/// Runs a synchronous connector/vector-store closure under a bounded
/// timeout (§5: "blocking may occur only in three places ... all three
/// must be bounded by timeouts"). `Connector` and `Snapshot::search` are
/// synchronous in this implementation (in-memory fixtures, a brute-force
/// scan) so the closure itself never actually suspends; wrapping it in
/// `tokio::time::timeout` still gives the structural guarantee the spec
/// asks for, and lets a slower real-database `Connector` impl plug in
/// later without changing the Engine.
async fn with_timeout<T, E, F>(duration: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, E>,
    EngineError: From<E>,
{
    match tokio::time::timeout(duration, async { f() }).await {
        Ok(inner) => inner.map_err(EngineError::from),
        Err(elapsed) => Err(EngineError::from(elapsed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{Fixture, MockConnector};
    use crate::domain::{AccountKind, Event, Interaction, SocialEdge, User};
    use crate::embeddings::DummyEmbedder;
    use crate::vectorstore::{PendingCollection, VectorStore};
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn event(id: EventId, organizer: &str, offset_days: i64) -> Event {
        let now = Utc::now();
        Event {
            event_id: id,
            title: format!("Event {id}"),
            description: Some("desc".into()),
            category: "music".into(),
            tags: vec![],
            location: None,
            start_time: now + ChronoDuration::days(offset_days),
            end_time: now + ChronoDuration::days(offset_days) + ChronoDuration::hours(2),
            max_attendees: None,
            organizer_id: organizer.to_string(),
            organization_id: None,
            archived: false,
            archived_at: None,
        }
    }

    fn user(id: &str, interests: &[&str]) -> User {
        User {
            user_id: id.into(),
            username: id.into(),
            bio: None,
            location: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            kind: AccountKind::Individual,
        }
    }

    fn build_store(
        events: Vec<Event>,
        event_vecs: Vec<Vec<f32>>,
        users: Vec<(String, Vec<f32>)>,
    ) -> (Arc<VectorStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let event_ids: Vec<String> = events.iter().map(|e| e.event_id.to_string()).collect();
        let event_meta: Vec<serde_json::Value> = events
            .iter()
            .map(|e| {
                json!({
                    "event_id": e.event_id,
                    "title": e.title,
                    "start_time": e.start_time,
                    "end_time": e.end_time,
                    "organizer_id": e.organizer_id,
                    "category": e.category,
                    "tags": e.tags,
                    "location": e.location,
                    "archived": e.archived,
                })
            })
            .collect();
        store
            .publish("events", PendingCollection { ids: event_ids, metadata: Some(event_meta), vectors: event_vecs })
            .unwrap();

        let user_ids: Vec<String> = users.iter().map(|(id, _)| id.clone()).collect();
        let user_vecs: Vec<Vec<f32>> = users.iter().map(|(_, v)| v.clone()).collect();
        let user_meta: Vec<serde_json::Value> = users.iter().map(|_| json!({})).collect();
        store
            .publish("users", PendingCollection { ids: user_ids, metadata: Some(user_meta), vectors: user_vecs })
            .unwrap();

        (Arc::new(store), dir)
    }

    #[tokio::test]
    async fn cold_start_uses_stored_user_vector() {
        let events = vec![event(1, "organizer", 3), event(2, "organizer", 10)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let users = vec![("viewer".to_string(), vec![1.0, 0.0])];
        let (store, _dir) = build_store(events, event_vecs, users);

        let fixture = Fixture { users: vec![user("viewer", &["music"])], ..Default::default() };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();
        assert!(!result.items.is_empty());
        assert!(result.items.iter().all(|i| i.source != Source::Fallback));
    }

    #[tokio::test]
    async fn single_going_interaction_synthesizes_to_event_vector() {
        // §8: a viewer with exactly one `going` interaction inside the
        // recency horizon and nothing else (no stored vector) should
        // synthesize to that event's own vector, up to 1e-4.
        let events = vec![event(1, "organizer", 3)];
        let event_vecs = vec![vec![1.0, 0.0]];
        let (store, _dir) = build_store(events, event_vecs, vec![]);

        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(Fixture::default()).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(Arc::clone(&store), connector, embedder, EngineConfig::default());

        let handle = ModelHandle::load(&store).unwrap();
        let viewer = user("viewer", &[]);
        let interactions = vec![Interaction {
            user_id: "viewer".into(),
            event_id: 1,
            kind: InteractionKind::Going,
            created_at: Utc::now() - ChronoDuration::days(5),
        }];

        let vector = engine
            .synthesize_user_vector(&handle, &viewer, &interactions, Utc::now())
            .await
            .unwrap();
        let expected = handle.events.vector_for("1").unwrap();
        assert_eq!(vector.len(), expected.len());
        for (a, b) in vector.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-4, "synthesized {vector:?} != event vector {expected:?}");
        }
    }

    #[tokio::test]
    async fn unknown_viewer_falls_back() {
        let events = vec![event(1, "organizer", 3), event(2, "organizer", 1)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let (store, _dir) = build_store(events, event_vecs, vec![]);

        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(Fixture::default()).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("ghost", 5, Strategy::Hybrid).await.unwrap();
        assert!(!result.items.is_empty());
        assert!(result.items.iter().all(|i| i.source == Source::Fallback));
        assert!(result.items.iter().all(|i| i.score == 0.0));
        assert_eq!(result.items[0].event_id, 2);
        assert_eq!(result.items[1].event_id, 1);
    }

    #[tokio::test]
    async fn invalid_k_is_surfaced_not_fallback() {
        let (store, _dir) = build_store(vec![event(1, "organizer", 3)], vec![vec![1.0, 0.0]], vec![]);
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(Fixture::default()).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("viewer", 0, Strategy::Hybrid).await;
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn organized_event_is_excluded() {
        let events = vec![event(7, "viewer", 3), event(8, "organizer", 5)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let users = vec![("viewer".to_string(), vec![1.0, 0.0])];
        let (store, _dir) = build_store(events, event_vecs, users);

        let fixture = Fixture { users: vec![user("viewer", &["music"])], ..Default::default() };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("viewer", 50, Strategy::Hybrid).await.unwrap();
        assert!(result.items.iter().all(|i| i.event_id != 7));
    }

    #[tokio::test]
    async fn friends_only_drops_candidates_with_no_friends() {
        let events = vec![event(1, "organizer", 3), event(2, "organizer", 5)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let users = vec![("viewer".to_string(), vec![1.0, 0.0])];
        let (store, _dir) = build_store(events, event_vecs, users);

        let fixture = Fixture {
            users: vec![user("viewer", &["music"]), user("friend", &[])],
            social_edges: vec![SocialEdge {
                follower: "viewer".into(),
                followee: "friend".into(),
                created_at: Utc::now(),
            }],
            interactions: vec![Interaction {
                user_id: "friend".into(),
                event_id: 2,
                kind: InteractionKind::Going,
                created_at: Utc::now(),
            }],
            ..Default::default()
        };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("viewer", 50, Strategy::FriendsOnly).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].event_id, 2);
        assert_eq!(result.items[0].friend_count, 1);
        assert_eq!(result.items[0].source, Source::Social);
    }

    #[tokio::test]
    async fn friends_boosted_applies_triple_the_hybrid_boost() {
        let events = vec![event(1, "organizer", 3)];
        let event_vecs = vec![vec![1.0, 0.0]];
        let users = vec![("viewer".to_string(), vec![1.0, 0.0])];
        let (store, _dir) = build_store(events, event_vecs, users);

        let fixture = Fixture {
            users: vec![user("viewer", &["music"]), user("f1", &[]), user("f2", &[])],
            social_edges: vec![
                SocialEdge { follower: "viewer".into(), followee: "f1".into(), created_at: Utc::now() },
                SocialEdge { follower: "viewer".into(), followee: "f2".into(), created_at: Utc::now() },
            ],
            interactions: vec![
                Interaction { user_id: "f1".into(), event_id: 1, kind: InteractionKind::Going, created_at: Utc::now() },
                Interaction {
                    user_id: "f2".into(),
                    event_id: 1,
                    kind: InteractionKind::Interested,
                    created_at: Utc::now(),
                },
            ],
            ..Default::default()
        };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine =
            RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let hybrid = engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();
        let boosted = engine.recommend("viewer", 5, Strategy::FriendsBoosted).await.unwrap();

        assert_eq!(hybrid.items[0].friend_count, 2);
        assert_eq!(boosted.items[0].friend_count, 2);
        // hybrid multiplier: 1 + 0.10*2 = 1.20; boosted: 1 + 0.30*2 = 1.60
        let ratio = boosted.items[0].score / hybrid.items[0].score;
        assert!((ratio - (1.60 / 1.20)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn viewer_with_no_stored_vector_embeds_profile_on_demand() {
        let events = vec![event(1, "organizer", 3), event(2, "organizer", 10)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        // no per-user vector published, so `stored` is None and there are
        // no interactions either: the engine must fall through to an
        // on-demand embed of the profile text.
        let (store, _dir) = build_store(events, event_vecs, vec![]);

        let fixture = Fixture { users: vec![user("viewer", &["music"])], ..Default::default() };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let first = engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();
        let second = engine.recommend("viewer", 5, Strategy::Hybrid).await.unwrap();

        assert!(!first.items.is_empty());
        assert!(first.items.iter().all(|i| i.source != Source::Fallback));
        // the cached embedding must rank candidates identically on a
        // repeat call for the same unchanged profile text.
        let first_ids: Vec<_> = first.items.iter().map(|i| i.event_id).collect();
        let second_ids: Vec<_> = second.items.iter().map(|i| i.event_id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn corrupted_events_collection_falls_back() {
        let events = vec![event(1, "organizer", 2), event(2, "organizer", 1)];
        let event_vecs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let (store, _dir) = build_store(events, event_vecs, vec![]);

        let matrix_path = store.current_dir("events").unwrap().join("matrix.bin");
        let mut bytes = std::fs::read(&matrix_path).unwrap();
        bytes[0] ^= 0xFF;
        std::fs::write(&matrix_path, bytes).unwrap();

        let fixture = Fixture { users: vec![user("viewer", &["music"])], ..Default::default() };
        let connector: Arc<dyn Connector> = Arc::new(MockConnector::new(fixture).unwrap());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(DummyEmbedder::new(2));
        let engine = RecommendationEngine::new(store, connector, embedder, EngineConfig::default());

        let result = engine.recommend("viewer", 3, Strategy::Hybrid).await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|i| i.source == Source::Fallback && i.score == 0.0));
        assert_eq!(result.items[0].event_id, 2);
        assert_eq!(result.items[1].event_id, 1);
    }
}
