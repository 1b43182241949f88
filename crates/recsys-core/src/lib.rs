//! # recsys-core
//!
//! Hybrid content + social event recommendation engine.
//!
//! A personalized feed is built from two offline-trained signals —
//! dense text embeddings of events and user profiles, and a top-K
//! user-user similarity table — combined at request time with the
//! viewer's social graph and recency. The pipeline is split into the
//! stages the spec names as distinct components, each its own module:
//!
//! - [`text`]: canonicalizes event/user records into embeddable strings.
//! - [`embeddings`]: maps canonical text to L2-normalized vectors, either
//!   via a deterministic hash-based fallback ([`embeddings::DummyEmbedder`])
//!   or local ONNX inference behind the `embeddings` feature.
//! - [`vectorstore`]: a directory-per-collection, checksum-verified,
//!   atomically-published store of `(ids, vectors, metadata)` with exact
//!   brute-force cosine search.
//! - [`connector`]: the read-only view of the domain schema (events,
//!   users, interactions, social graph) the rest of the crate depends on.
//! - [`builder`]: the offline batch job that reads the connector, embeds
//!   everything, and publishes a new model version.
//! - [`strategy`]: the closed set of named ranking strategies and the
//!   weight tables they resolve to.
//! - [`engine`]: the request-time orchestrator — synthesize, retrieve,
//!   boost, rank, emit — with a popularity fallback on any non-programmer
//!   error.
//!
//! `domain` holds the plain data types shared across all of the above;
//! `error` holds the top-level [`error::EngineError`] every public
//! operation resolves down to.

pub mod builder;
pub mod connector;
pub mod domain;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod strategy;
pub mod text;
pub mod vectorstore;

pub use builder::{BuildReport, BuilderConfig, BuilderError, ModelBuilder, QualityMetrics};
pub use connector::{Connector, ConnectorError};
pub use domain::{AccountKind, Event, EventId, Interaction, InteractionKind, SocialEdge, User, UserId};
pub use embeddings::{EmbeddingError, EmbeddingGenerator};
pub use engine::{EngineConfig, ModelHandle, RecommendResult, RecommendationEngine, RecommendationItem, Source};
pub use error::{EngineError, Result};
pub use strategy::{weights_for, Strategy, StrategyWeights};
pub use vectorstore::{IntegrityError, Manifest, PendingCollection, Snapshot, VectorStore};
