//! `recsys-server` — the application shell around `recsys-core`.
//!
//! Plays the same role relative to `recsys-core` that the teacher's
//! `vestige-mcp` binary plays relative to `vestige-core`: tracing/config/
//! CLI conventions around the library, carrying none of the hard
//! engineering itself. Three subcommands:
//!
//! - `serve`   — runs the HTTP surface (`POST /recommend`, `POST
//!   /refresh`, `GET /health`).
//! - `build`   — runs the Model Builder once and exits, for operators
//!   or cron (analogous to the teacher's `vestige consolidate`).
//! - `refresh` — same build, reported in the `/refresh` response shape,
//!   for scripts that want that exact JSON without standing up a server.

mod config;
mod http;
mod state;

use clap::{Parser, Subcommand};
use config::RecsysConfig;
use recsys_core::connector::{Fixture, MockConnector};
use recsys_core::embeddings::DummyEmbedder;
use recsys_core::{BuilderConfig, Connector, EmbeddingGenerator, ModelBuilder, VectorStore};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recsys-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personalized event recommendation engine: serving shell and build CLI")]
struct Cli {
    /// Path to a `recsys.toml` config file. Every key has a spec-mandated
    /// default, so this is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the vector store (overrides the config file and
    /// `RECSYS_DATA_DIR`).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON fixture backing the `MockConnector` (overrides the config
    /// file and `RECSYS_FIXTURE_PATH`). Required for `build`/`refresh`;
    /// `serve` will run with an empty fixture (every request falls back)
    /// if omitted, since there is no live-database `Connector` in this
    /// crate (spec §1: the domain schema is an external collaborator).
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Address to bind (overrides config/`RECSYS_BIND_ADDR`).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the Model Builder once and exit.
    Build,
    /// Run the Model Builder once, printing the `/refresh` response shape.
    Refresh,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> RecsysConfig {
    let mut config = match RecsysConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(fixture) = &cli.fixture {
        config.fixture_path = Some(fixture.clone());
    }
    config
}

fn build_connector(config: &RecsysConfig) -> Arc<dyn Connector> {
    match &config.fixture_path {
        Some(path) => match MockConnector::from_file(path) {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                error!("failed to load fixture {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => {
            warn!("no --fixture given; running against an empty MockConnector (every request falls back)");
            Arc::new(MockConnector::new(Fixture::default()).expect("empty fixture is always valid"))
        }
    }
}

/// §4.2: `strict_embedding = true` aborts on model load failure;
/// `false` falls back to the deterministic [`DummyEmbedder`] with a
/// warning.
fn build_embedder(config: &RecsysConfig) -> Arc<dyn EmbeddingGenerator> {
    #[cfg(feature = "embeddings")]
    {
        let candidate = recsys_core::embeddings::FastEmbedder::new(config.embedding_dim);
        match candidate.check_ready() {
            Ok(()) => return Arc::new(candidate),
            Err(e) if config.strict_embedding => {
                error!("strict_embedding is set and the local model failed to load: {e}");
                std::process::exit(1);
            }
            Err(e) => {
                warn!("local embedding model unavailable ({e}); falling back to the deterministic dummy embedder");
            }
        }
    }
    #[cfg(not(feature = "embeddings"))]
    {
        if config.strict_embedding {
            error!("strict_embedding is set but this binary was built without the `embeddings` feature");
            std::process::exit(1);
        }
    }
    Arc::new(DummyEmbedder::new(config.embedding_dim))
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Commands::Serve { bind } => run_serve(config, bind).await,
        Commands::Build => run_build(config),
        Commands::Refresh => run_refresh(config).await,
    }
}

async fn run_serve(config: RecsysConfig, bind_override: Option<String>) {
    let store = Arc::new(VectorStore::new(&config.data_dir));
    let connector = build_connector(&config);
    let embedder = build_embedder(&config);

    if !store.exists("events") || !store.exists("users") {
        warn!(
            "vector store at {} has no published model yet; every request will use the popularity fallback until a build runs",
            config.data_dir.display()
        );
    }

    let bind_addr = bind_override.unwrap_or_else(|| config.bind_addr.clone());
    let state = AppState::new(store, connector, embedder, &config);
    let app = http::build_router(state);

    info!("recsys-server listening on {bind_addr}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {bind_addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}

fn run_build(config: RecsysConfig) {
    let store = VectorStore::new(&config.data_dir);
    let connector = build_connector(&config);
    let embedder = build_embedder(&config);
    let builder_config: BuilderConfig = config.builder_config();
    let builder = ModelBuilder::new(builder_config);

    match builder.run(connector.as_ref(), embedder.as_ref(), &store, chrono::Utc::now()) {
        Ok(report) => {
            info!(
                version = %report.version,
                events = report.event_count,
                users = report.user_count,
                event_coverage = report.metrics.event_coverage,
                user_coverage = report.metrics.user_coverage,
                "build complete"
            );
            println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
        }
        Err(e) => {
            error!("build failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_refresh(config: RecsysConfig) {
    let store = Arc::new(VectorStore::new(&config.data_dir));
    let connector = build_connector(&config);
    let embedder = build_embedder(&config);
    let state = AppState::new(store, connector, embedder, &config);

    let result = state.refresh().await;
    println!("{}", serde_json::to_string_pretty(&result).expect("refresh result serializes"));
    if matches!(result.status, state::RefreshStatus::Failed) {
        std::process::exit(1);
    }
}
