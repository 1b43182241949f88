//! Shared server state: the engine handle plus the refresh-coalescing
//! guard (spec §6 "Refresh endpoint contract ... concurrent refresh
//! calls coalesce; only one build runs at a time"), grounded on the
//! teacher's `dashboard::state::AppState` shared-`Arc`-behind-`Clone`
//! pattern.

use crate::config::RecsysConfig;
use recsys_core::{BuilderConfig, Connector, EmbeddingGenerator, ModelBuilder, RecommendationEngine, VectorStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Ok,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub status: RefreshStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub version: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    store: Arc<VectorStore>,
    connector: Arc<dyn Connector>,
    embedder: Arc<dyn EmbeddingGenerator>,
    builder_config: BuilderConfig,
    /// Guards the single in-flight build. A refresh call that finds this
    /// already locked waits on the lock and then reports `skipped`
    /// rather than running a second build concurrently ("only one build
    /// runs at a time").
    refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<VectorStore>,
        connector: Arc<dyn Connector>,
        embedder: Arc<dyn EmbeddingGenerator>,
        config: &RecsysConfig,
    ) -> Self {
        let engine = Arc::new(RecommendationEngine::new(
            Arc::clone(&store),
            Arc::clone(&connector),
            Arc::clone(&embedder),
            config.engine_config(),
        ));
        Self {
            engine,
            store,
            connector,
            embedder,
            builder_config: config.builder_config(),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn current_version(&self) -> Option<String> {
        self.engine.current_version().ok()
    }

    /// Runs the Model Builder under the coalescing lock. If another
    /// refresh is already in flight, this call blocks until it finishes
    /// and reports `skipped` with that run's outcome rather than
    /// triggering its own build (spec §6 idempotence).
    pub async fn refresh(&self) -> RefreshResult {
        let started_at = chrono::Utc::now();

        let guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // Another refresh holds the lock; wait for it to finish
                // rather than double-building, then report `skipped`.
                let _ = self.refresh_lock.lock().await;
                return RefreshResult {
                    status: RefreshStatus::Skipped,
                    started_at,
                    finished_at: chrono::Utc::now(),
                    version: self.current_version(),
                };
            }
        };

        let builder = ModelBuilder::new(self.builder_config.clone());
        let store = Arc::clone(&self.store);
        let connector = Arc::clone(&self.connector);
        let embedder = Arc::clone(&self.embedder);
        let now = chrono::Utc::now();

        let result = tokio::task::spawn_blocking(move || builder.run(connector.as_ref(), embedder.as_ref(), &store, now))
            .await;

        drop(guard);
        let finished_at = chrono::Utc::now();

        match result {
            Ok(Ok(report)) => {
                tracing::info!(version = %report.version, events = report.event_count, users = report.user_count, "refresh complete");
                RefreshResult { status: RefreshStatus::Ok, started_at, finished_at, version: Some(report.version) }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "refresh failed; previous model left intact");
                RefreshResult { status: RefreshStatus::Failed, started_at, finished_at, version: self.current_version() }
            }
            Err(e) => {
                tracing::error!(error = %e, "refresh task panicked");
                RefreshResult { status: RefreshStatus::Failed, started_at, finished_at, version: self.current_version() }
            }
        }
    }
}
