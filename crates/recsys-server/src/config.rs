//! Configuration surface (spec §6 "Configuration surface (enumerated)").
//!
//! Loaded once at startup by layering, lowest priority first: built-in
//! defaults, an optional TOML file, then environment variables prefixed
//! `RECSYS_`. This mirrors the teacher's `--data-dir`-with-fallback
//! pattern in `main.rs`, generalized to the rest of the enumerated keys.

use recsys_core::{BuilderConfig, EngineConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingDevice {
    Cpu,
    Gpu,
}

impl Default for EmbeddingDevice {
    fn default() -> Self {
        EmbeddingDevice::Cpu
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// File-deserializable shape; every field optional so a config file only
/// needs to override what it cares about. [`RecsysConfig::load`] merges
/// this over [`RecsysConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    embedding_dim: Option<usize>,
    embedding_device: Option<EmbeddingDevice>,
    strict_embedding: Option<bool>,
    min_events: Option<usize>,
    min_users: Option<usize>,
    retrain_interval_days: Option<i64>,
    retrain_delta_fraction: Option<f64>,
    recency_horizon_days: Option<i64>,
    cold_start_blend: Option<f64>,
    data_dir: Option<PathBuf>,
    fixture_path: Option<PathBuf>,
    bind_addr: Option<String>,
    connector_timeout_ms: Option<u64>,
    vectorstore_timeout_ms: Option<u64>,
    embed_timeout_ms: Option<u64>,
}

/// The full configuration surface spec §6 enumerates, plus the serving
/// shell's own bind address and fixture path (the Connector trait has no
/// live-database implementation in this crate, per spec §1 — only the
/// fixture-backed `MockConnector` ships, see DESIGN.md).
#[derive(Debug, Clone)]
pub struct RecsysConfig {
    pub embedding_dim: usize,
    pub embedding_device: EmbeddingDevice,
    pub strict_embedding: bool,
    pub min_events: usize,
    pub min_users: usize,
    pub retrain_interval_days: i64,
    pub retrain_delta_fraction: f64,
    pub recency_horizon_days: i64,
    pub cold_start_blend: f64,
    pub data_dir: PathBuf,
    pub fixture_path: Option<PathBuf>,
    pub bind_addr: String,
    pub connector_timeout: Duration,
    pub vectorstore_timeout: Duration,
    pub embed_timeout: Duration,
}

impl Default for RecsysConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        let builder = BuilderConfig::default();
        Self {
            embedding_dim: recsys_core::embeddings::DEFAULT_EMBEDDING_DIM,
            embedding_device: EmbeddingDevice::Cpu,
            strict_embedding: false,
            min_events: builder.min_events,
            min_users: builder.min_users,
            retrain_interval_days: 7,
            retrain_delta_fraction: 0.10,
            recency_horizon_days: engine.recency_horizon_days,
            cold_start_blend: engine.cold_start_blend,
            data_dir: default_data_dir(),
            fixture_path: None,
            bind_addr: "127.0.0.1:8080".to_string(),
            connector_timeout: engine.connector_timeout,
            vectorstore_timeout: engine.vectorstore_timeout,
            embed_timeout: engine.embed_timeout,
        }
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "recsys", "core") {
        return proj_dirs.data_dir().join("vector_store");
    }
    PathBuf::from("./vector_store")
}

impl RecsysConfig {
    /// Layer defaults -> optional TOML file -> `RECSYS_*` environment
    /// variables. `path = None` skips the file layer entirely (fine;
    /// every key has a spec-mandated default).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            let file: FileConfig = toml::from_str(&text)
                .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
            config.apply_file(file);
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.embedding_dim {
            self.embedding_dim = v;
        }
        if let Some(v) = file.embedding_device {
            self.embedding_device = v;
        }
        if let Some(v) = file.strict_embedding {
            self.strict_embedding = v;
        }
        if let Some(v) = file.min_events {
            self.min_events = v;
        }
        if let Some(v) = file.min_users {
            self.min_users = v;
        }
        if let Some(v) = file.retrain_interval_days {
            self.retrain_interval_days = v;
        }
        if let Some(v) = file.retrain_delta_fraction {
            self.retrain_delta_fraction = v;
        }
        if let Some(v) = file.recency_horizon_days {
            self.recency_horizon_days = v;
        }
        if let Some(v) = file.cold_start_blend {
            self.cold_start_blend = v;
        }
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.fixture_path {
            self.fixture_path = Some(v);
        }
        if let Some(v) = file.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = file.connector_timeout_ms {
            self.connector_timeout = Duration::from_millis(v);
        }
        if let Some(v) = file.vectorstore_timeout_ms {
            self.vectorstore_timeout = Duration::from_millis(v);
        }
        if let Some(v) = file.embed_timeout_ms {
            self.embed_timeout = Duration::from_millis(v);
        }
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        macro_rules! env_parse {
            ($key:literal, $field:expr, $parse:expr) => {
                if let Ok(raw) = std::env::var(concat!("RECSYS_", $key)) {
                    $field = $parse(&raw).map_err(|reason| ConfigError::Invalid { key: $key, reason })?;
                }
            };
        }

        env_parse!("EMBEDDING_DIM", self.embedding_dim, |s: &str| s
            .parse::<usize>()
            .map_err(|e| e.to_string()));
        env_parse!("STRICT_EMBEDDING", self.strict_embedding, |s: &str| s
            .parse::<bool>()
            .map_err(|e| e.to_string()));
        env_parse!("MIN_EVENTS", self.min_events, |s: &str| s
            .parse::<usize>()
            .map_err(|e| e.to_string()));
        env_parse!("MIN_USERS", self.min_users, |s: &str| s
            .parse::<usize>()
            .map_err(|e| e.to_string()));
        env_parse!("RETRAIN_INTERVAL_DAYS", self.retrain_interval_days, |s: &str| s
            .parse::<i64>()
            .map_err(|e| e.to_string()));
        env_parse!("RETRAIN_DELTA_FRACTION", self.retrain_delta_fraction, |s: &str| s
            .parse::<f64>()
            .map_err(|e| e.to_string()));
        env_parse!("RECENCY_HORIZON_DAYS", self.recency_horizon_days, |s: &str| s
            .parse::<i64>()
            .map_err(|e| e.to_string()));
        env_parse!("COLD_START_BLEND", self.cold_start_blend, |s: &str| s
            .parse::<f64>()
            .map_err(|e| e.to_string()));

        if let Ok(raw) = std::env::var("RECSYS_EMBEDDING_DEVICE") {
            self.embedding_device = match raw.as_str() {
                "cpu" => EmbeddingDevice::Cpu,
                "gpu" => EmbeddingDevice::Gpu,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "EMBEDDING_DEVICE",
                        reason: format!("expected cpu|gpu, got {other}"),
                    })
                }
            };
        }
        if let Ok(raw) = std::env::var("RECSYS_DATA_DIR") {
            self.data_dir = PathBuf::from(raw);
        }
        if let Ok(raw) = std::env::var("RECSYS_FIXTURE_PATH") {
            self.fixture_path = Some(PathBuf::from(raw));
        }
        if let Ok(raw) = std::env::var("RECSYS_BIND_ADDR") {
            self.bind_addr = raw;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::Invalid { key: "embedding_dim", reason: "must be > 0".into() });
        }
        if !(0.0..=1.0).contains(&self.cold_start_blend) {
            return Err(ConfigError::Invalid {
                key: "cold_start_blend",
                reason: "must be between 0.0 and 1.0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.retrain_delta_fraction) {
            return Err(ConfigError::Invalid {
                key: "retrain_delta_fraction",
                reason: "must be between 0.0 and 1.0".into(),
            });
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            recency_horizon_days: self.recency_horizon_days,
            cold_start_blend: self.cold_start_blend,
            connector_timeout: self.connector_timeout,
            vectorstore_timeout: self.vectorstore_timeout,
            embed_timeout: self.embed_timeout,
            ..EngineConfig::default()
        }
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            min_events: self.min_events,
            min_users: self.min_users,
            ..BuilderConfig::default()
        }
    }
}
