//! JSON HTTP server.
//!
//! Thin shell over the core operations: every handler calls [`Indexer`] or
//! [`search`] and shapes the result. Background ingests are tracked in a
//! [`JobStore`] owned by the server state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/ingest` | Full or filtered ingest, inline or as a background job |
//! | `GET`  | `/jobs` | All background jobs |
//! | `GET`  | `/jobs/{id}` | One background job |
//! | `POST` | `/search` | Ranked chunks for a query |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::BackendChoice;
use crate::error::{EmbedError, SearchError};
use crate::ingest::Indexer;
use crate::jobs::{JobStatus, JobStore};
use crate::models::{IndexMeta, SearchResponse};
use crate::search::search;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    indexer: Indexer,
    jobs: JobStore,
}

impl AppState {
    pub fn new(config: Arc<Config>, jobs: JobStore) -> Self {
        Self {
            indexer: Indexer::new(config.clone()),
            config,
            jobs,
        }
    }
}

/// Builds the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/ingest", post(handle_ingest))
        .route("/jobs", get(handle_list_jobs))
        .route("/jobs/{id}", get(handle_get_job))
        .route("/search", post(handle_search))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(Arc::new(config.clone()), JobStore::new());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("doc-index server listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server started");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

/// A missing remote credential is the caller's configuration problem; every
/// other ingest failure is internal.
fn classify_ingest_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<EmbedError>() {
        Some(EmbedError::MissingCredentials(_)) => bad_request(err.to_string()),
        _ => internal(format!("{:#}", err)),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ingest ============

#[derive(Debug, Default, Deserialize)]
struct IngestRequest {
    #[serde(default)]
    only_file: Option<String>,
    #[serde(default)]
    backend: Option<BackendChoice>,
    #[serde(default)]
    background: bool,
}

#[derive(Serialize)]
struct JobAccepted {
    job_id: String,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Response, AppError> {
    if req.background {
        let job_id = state
            .indexer
            .spawn_ingest(&state.jobs, req.only_file, req.backend);
        return Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })).into_response());
    }

    let meta: IndexMeta = state
        .indexer
        .ingest(req.only_file.as_deref(), req.backend)
        .await
        .map_err(classify_ingest_error)?;
    Ok(Json(meta).into_response())
}

// ============ GET /jobs ============

#[derive(Serialize)]
struct JobListResponse {
    jobs: Vec<JobStatus>,
}

async fn handle_list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.jobs.list(),
    })
}

async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, AppError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| not_found(format!("no job with id: {}", id)))
}

// ============ POST /search ============

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let top_k = req.top_k.unwrap_or(state.config.retrieval.top_k);
    search(&state.config, &req.query, top_k)
        .await
        .map(Json)
        .map_err(|e| match e {
            SearchError::EmptyQuery => bad_request(e.to_string()),
        })
}
