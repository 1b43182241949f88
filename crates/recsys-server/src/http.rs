//! HTTP surface (spec §6). Two contracts the core defines, plus a
//! health check the teacher always ships alongside its dashboard API
//! (`dashboard::handlers::health_check`): `POST /recommend`, `POST
//! /refresh`, `GET /health`.
//!
//! Per spec §1 the HTTP surface and its auth middleware are external
//! collaborators — this router is deliberately thin, carrying none of
//! the session/auth machinery a real deployment would put in front of
//! it.

use crate::state::AppState;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use recsys_core::{EngineError, Strategy};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST]).allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/recommend", post(recommend))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    viewer_id: String,
    #[serde(default = "default_k")]
    k: usize,
    #[serde(default = "default_strategy")]
    strategy: String,
}

fn default_k() -> usize {
    10
}

fn default_strategy() -> String {
    "hybrid".to_string()
}

/// `EngineError` -> HTTP status, per spec §7: `InvalidArgument` is
/// surfaced (400); `NotFound`/`IntegrityError`/`Degraded` never reach
/// here because the Engine already converts them into a fallback
/// result before returning `Ok`; `Internal` is a programmer error (500).
/// A free function rather than a local `IntoResponse` impl, since both
/// `EngineError` and the trait live outside this crate.
fn engine_error_response(err: &EngineError) -> Response {
    let status = match err {
        EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::NotFound(_) | EngineError::IntegrityError(_) | EngineError::Degraded(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn recommend(State(state): State<AppState>, Json(req): Json<RecommendRequest>) -> Response {
    let strategy = match req.strategy.parse::<Strategy>() {
        Ok(s) => s,
        Err(e) => return engine_error_response(&e),
    };

    match state.engine.recommend(&req.viewer_id, req.k, strategy).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => engine_error_response(&e),
    }
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.refresh().await)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_version: Option<String>,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse { status: "ok", model_version: state.current_version() })
}
