//! Model Builder (§4.5)
//!
//! A batch job, stateless between runs: read everything from the
//! Connector, compose canonical text, embed, publish three vector-store
//! collections, and emit quality metrics. Orchestration only — the
//! actual text/embedding/storage logic lives in [`crate::text`],
//! [`crate::embeddings`], and [`crate::vectorstore`].
//!
//! Single logical thread of control (§5): embedding batches may use
//! data-parallel hardware internally, but `ModelBuilder::run` itself
//! never spawns concurrent work, matching the teacher's batch-job
//! phase-at-a-time logging style in `consolidation`.

use crate::connector::{Connector, ConnectorError};
use crate::domain::{Event, EventId, User, UserId};
use crate::embeddings::{cosine_similarity, EmbeddingError, EmbeddingGenerator};
use crate::text::{canonical_event_text, canonical_user_text};
use crate::vectorstore::{top_k, IntegrityError, Manifest, PendingCollection, VectorStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuilderError {
    #[error("only {found} future non-archived events, need at least {required}")]
    InsufficientEvents { found: usize, required: usize },
    #[error("only {found} active users, need at least {required}")]
    InsufficientUsers { found: usize, required: usize },
    #[error("connector error during build: {0}")]
    Connector(#[from] ConnectorError),
    #[error("embedding error during build: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("vector store error during build: {0}")]
    Store(#[from] IntegrityError),
    #[error("event and user embeddings disagree on dimension: {events} vs {users}")]
    DimensionMismatch { events: usize, users: usize },
    #[error("io error writing model artifacts: {0}")]
    Io(String),
}

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub min_events: usize,
    pub min_users: usize,
    pub embed_batch_size: usize,
    pub user_sim_top_k: usize,
    /// Size of the deterministic sample used for the diversity and
    /// determinism quality checks (§4.5 step 7). Sampling the first N
    /// events by id, rather than a random draw, keeps the metric itself
    /// reproducible across runs of the same snapshot.
    pub quality_sample_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            min_events: 5,
            min_users: 1,
            embed_batch_size: 64,
            user_sim_top_k: 20,
            quality_sample_size: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetrics {
    pub event_coverage: f64,
    pub user_coverage: f64,
    pub embedding_determinism_ok: bool,
    pub mean_pairwise_diversity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub version: String,
    pub event_count: usize,
    pub user_count: usize,
    pub metrics: QualityMetrics,
}

pub struct ModelBuilder {
    config: BuilderConfig,
}

impl ModelBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        connector: &dyn Connector,
        embedder: &dyn EmbeddingGenerator,
        store: &VectorStore,
        now: DateTime<Utc>,
    ) -> Result<BuildReport, BuilderError> {
        // Step 1: dictionaries, logged only — nothing downstream depends
        // on the vocabulary beyond what already flows through event/user
        // text.
        let categories = connector.category_dictionary()?;
        let tags = connector.tag_dictionary()?;
        tracing::info!(
            categories = categories.len(),
            tags = tags.len(),
            "model builder: loaded vocabulary"
        );

        // Step 2
        let events = connector.future_events(now)?;
        if events.len() < self.config.min_events {
            return Err(BuilderError::InsufficientEvents {
                found: events.len(),
                required: self.config.min_events,
            });
        }
        tracing::info!(count = events.len(), "model builder: loaded future events");

        // Step 3
        let (event_ids, event_vectors, event_metadata, event_texts) =
            self.embed_events(embedder, &events)?;

        // Step 4
        let users = connector.active_users()?;
        if users.len() < self.config.min_users {
            return Err(BuilderError::InsufficientUsers {
                found: users.len(),
                required: self.config.min_users,
            });
        }
        tracing::info!(count = users.len(), "model builder: loaded active users");
        let (user_ids, user_vectors, user_metadata, _user_texts) =
            self.embed_users(embedder, &users)?;

        if let (Some(e), Some(u)) = (event_vectors.first(), user_vectors.first()) {
            if e.len() != u.len() {
                return Err(BuilderError::DimensionMismatch {
                    events: e.len(),
                    users: u.len(),
                });
            }
        }

        // Step 5
        let user_sim_vectors = self.build_user_similarity(&user_ids, &user_vectors);

        // Step 6
        let events_manifest = store.publish(
            "events",
            PendingCollection {
                ids: event_ids.clone(),
                metadata: Some(event_metadata),
                vectors: event_vectors.clone(),
            },
        )?;
        let users_manifest = store.publish(
            "users",
            PendingCollection {
                ids: user_ids.clone(),
                metadata: Some(user_metadata),
                vectors: user_vectors.clone(),
            },
        )?;
        // `user_sim` rows carry no per-row metadata (spec §6 on-disk
        // layout: just matrix.bin/ids.json/manifest.json), so no sidecar
        // file is published for it.
        let user_sim_manifest = store.publish(
            "user_sim",
            PendingCollection { ids: user_ids.clone(), metadata: None, vectors: user_sim_vectors },
        )?;

        // Step 7
        let metrics = self.quality_metrics(embedder, &events, &users, &event_texts);
        let version = events_manifest.created_at.to_rfc3339();
        self.write_artifacts(
            store,
            &version,
            events.len(),
            users.len(),
            &metrics,
            &[&events_manifest, &users_manifest, &user_sim_manifest],
        )?;

        Ok(BuildReport {
            version,
            event_count: events.len(),
            user_count: users.len(),
            metrics,
        })
    }

    fn embed_events(
        &self,
        embedder: &dyn EmbeddingGenerator,
        events: &[Event],
    ) -> Result<(Vec<String>, Vec<Vec<f32>>, Vec<Value>, Vec<String>), BuilderError> {
        let texts: Vec<String> = events
            .iter()
            .map(|e| {
                canonical_event_text(
                    &e.title,
                    &e.category,
                    &e.tags,
                    e.description.as_deref(),
                    e.location.as_deref(),
                )
            })
            .collect();

        let mut vectors = Vec::with_capacity(events.len());
        for chunk in texts.chunks(self.config.embed_batch_size) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            vectors.extend(embedder.embed_batch(&refs)?);
        }

        let ids: Vec<String> = events.iter().map(|e| e.event_id.to_string()).collect();
        let metadata: Vec<Value> = events
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

        Ok((ids, vectors, metadata, texts))
    }

    fn embed_users(
        &self,
        embedder: &dyn EmbeddingGenerator,
        users: &[User],
    ) -> Result<(Vec<String>, Vec<Vec<f32>>, Vec<Value>, Vec<String>), BuilderError> {
        let texts: Vec<String> = users
            .iter()
            .map(|u| canonical_user_text(u.bio.as_deref(), &u.interests, u.location.as_deref()))
            .collect();

        let mut vectors = Vec::with_capacity(users.len());
        for chunk in texts.chunks(self.config.embed_batch_size) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            vectors.extend(embedder.embed_batch(&refs)?);
        }

        let ids: Vec<UserId> = users.iter().map(|u| u.user_id.clone()).collect();
        let metadata: Vec<Value> = users
            .iter()
            .map(|u| {
                json!({
                    "user_id": u.user_id,
                    "username": u.username,
                    "bio": u.bio,
                    "interests": u.interests,
                    "location": u.location,
                    "kind": u.kind.to_string(),
                })
            })
            .collect();

        Ok((ids, vectors, metadata, texts))
    }

    /// Top-`user_sim_top_k` neighbors per user, encoded as `matrix.bin`
    /// rows of `(neighbor_row_index, score)` pairs (§6: the `user_sim`
    /// collection has no `metadata.json` in the on-disk layout, so the
    /// neighbor table itself has to live in the float matrix). Rows with
    /// fewer than `top_k` neighbors (small user populations) are padded
    /// with `(-1.0, 0.0)` sentinels.
    fn build_user_similarity(&self, user_ids: &[UserId], user_vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let k = self.config.user_sim_top_k;
        let flat: Vec<f32> = user_vectors.iter().flatten().copied().collect();
        let dim = user_vectors.first().map(Vec::len).unwrap_or(0);

        user_vectors
            .iter()
            .enumerate()
            .map(|(row, query)| {
                let filter: &dyn Fn(usize) -> bool = &|r| r != row;
                let neighbors = top_k(query, dim, user_ids, &flat, k, Some(filter));
                let mut encoded = Vec::with_capacity(k * 2);
                for n in &neighbors {
                    encoded.push(n.row as f32);
                    encoded.push(n.score);
                }
                while encoded.len() < k * 2 {
                    encoded.push(-1.0);
                    encoded.push(0.0);
                }
                encoded
            })
            .collect()
    }

    fn quality_metrics(
        &self,
        embedder: &dyn EmbeddingGenerator,
        events: &[Event],
        users: &[User],
        event_texts: &[String],
    ) -> QualityMetrics {
        let event_coverage = if events.is_empty() {
            0.0
        } else {
            events.iter().filter(|e| event_has_content(e)).count() as f64 / events.len() as f64
        };
        let user_coverage = if users.is_empty() {
            0.0
        } else {
            users.iter().filter(|u| user_has_content(u)).count() as f64 / users.len() as f64
        };

        let sample_size = self.config.quality_sample_size.min(event_texts.len());
        let sample_texts = &event_texts[..sample_size];
        let sample_refs: Vec<&str> = sample_texts.iter().map(String::as_str).collect();

        let embedding_determinism_ok = sample_size > 0
            && match (embedder.embed_batch(&sample_refs), embedder.embed_batch(&sample_refs)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };

        let sample_vectors: Vec<Vec<f32>> = sample_refs
            .iter()
            .filter_map(|t| embedder.embed_one(t).ok())
            .collect();
        let mean_pairwise_diversity = mean_diversity(&sample_vectors);

        QualityMetrics {
            event_coverage,
            user_coverage,
            embedding_determinism_ok,
            mean_pairwise_diversity,
        }
    }

    fn write_artifacts(
        &self,
        store: &VectorStore,
        version: &str,
        event_count: usize,
        user_count: usize,
        metrics: &QualityMetrics,
        manifests: &[&Manifest],
    ) -> Result<(), BuilderError> {
        let dir = store.root().join("model_artifacts");
        fs::create_dir_all(&dir).map_err(|e| BuilderError::Io(e.to_string()))?;

        fs::write(
            dir.join("metrics.json"),
            serde_json::to_vec_pretty(metrics).map_err(|e| BuilderError::Io(e.to_string()))?,
        )
        .map_err(|e| BuilderError::Io(e.to_string()))?;

        let versions_path = dir.join("versions.json");
        let mut versions: Vec<Value> = if versions_path.is_file() {
            let bytes = fs::read(&versions_path).map_err(|e| BuilderError::Io(e.to_string()))?;
            serde_json::from_slice(&bytes).unwrap_or_default()
        } else {
            Vec::new()
        };
        versions.push(json!({
            "version": version,
            "created_at": Utc::now(),
            "event_count": event_count,
            "user_count": user_count,
            "checksums": manifests.iter().map(|m| json!({"name": m.name, "sha256_hex": m.sha256_hex})).collect::<Vec<_>>(),
        }));
        fs::write(
            &versions_path,
            serde_json::to_vec_pretty(&versions).map_err(|e| BuilderError::Io(e.to_string()))?,
        )
        .map_err(|e| BuilderError::Io(e.to_string()))?;

        Ok(())
    }
}

fn event_has_content(e: &Event) -> bool {
    e.description.as_ref().is_some_and(|d| !d.trim().is_empty())
        || !e.tags.is_empty()
        || e.location.as_ref().is_some_and(|l| !l.trim().is_empty())
}

fn user_has_content(u: &User) -> bool {
    !u.interests.is_empty() || u.bio.as_ref().is_some_and(|b| !b.trim().is_empty())
}

fn mean_diversity(vectors: &[Vec<f32>]) -> f64 {
    if vectors.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0_f64;
    let mut pairs = 0usize;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += 1.0 - cosine_similarity(&vectors[i], &vectors[j]) as f64;
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}
