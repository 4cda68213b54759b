use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::enrich::{enrich_hotspot, DetailEnricher};
use crate::ingest::scheduler::SchedulerStatus;
use crate::ingest::AggregationRunner;
use crate::store::{HotspotRecord, HotspotStore};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HotspotStore>,
    pub runner: Arc<AggregationRunner>,
    pub enricher: Arc<DetailEnricher>,
    pub scheduler: SchedulerStatus,
    /// Served under `/static` (screenshots live in its `screenshots/` child).
    pub static_dir: PathBuf,
}

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/crawl", post(trigger_crawl))
        .route("/hotspots", get(list_hotspots).delete(delete_hotspots_batch))
        .route("/hotspots/{id}", delete(delete_hotspot))
        .route("/hotspots/{id}/fetch_details", post(fetch_details))
        .route("/sources", get(list_sources))
        .route("/scheduler/status", get(scheduler_status))
        .nest_service("/static", static_files)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Store failures become 500s; unknown ids become 404s.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Hotspot not found" })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": format!("{e:#}") })),
                )
                    .into_response()
            }
        }
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hotspot Crawler API is running" }))
}

async fn trigger_crawl(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let summary = state.runner.run_once().await?;
    Ok(Json(json!({
        "message": "Crawl task completed",
        "total": summary.total_persisted,
        "sources": summary.sources,
    })))
}

#[derive(serde::Deserialize)]
struct ListQuery {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

async fn list_hotspots(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<HotspotRecord>>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let source = q.source.as_deref().filter(|s| !s.is_empty());
    Ok(Json(state.store.list(source, limit).await?))
}

async fn list_sources(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.sources().await?))
}

async fn delete_hotspot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "message": "Hotspot deleted successfully", "id": id })))
}

async fn delete_hotspots_batch(
    State(state): State<AppState>,
    Json(ids): Json<Vec<i64>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.store.delete_many(&ids).await?;
    Ok(Json(json!({
        "message": format!("Deleted {count} hotspots"),
        "count": count,
    })))
}

async fn fetch_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<HotspotRecord>, ApiError> {
    enrich_hotspot(state.store.as_ref(), &state.enricher, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.clone())
}
