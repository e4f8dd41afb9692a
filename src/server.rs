//! HTTP API consumed by the dashboard frontend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/index-repo` | Index one repository over a date window |
//! | `POST` | `/api/index-all-repos` | Index every configured repository concurrently |
//! | `GET`  | `/api/dashboard` | Team metrics for the last 7 days (mock fallback) |
//! | `GET`  | `/api/pr-count` | Number of stored pull requests |
//! | `GET`  | `/api/debug/prs` | First 10 stored pull requests, diffs truncated |
//! | `GET`  | `/health` | Liveness plus a storage ping |
//!
//! # Error Contract
//!
//! ```json
//! { "status": "error", "code": "bad_request", "message": "invalid date 'x': ..." }
//! ```
//!
//! Error codes: `bad_request` (400), `index_error` (500), `storage_error` (500).
//! Malformed or incomplete JSON bodies are reported as `bad_request` too.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the frontend is served
//! from a different port.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::{is_repo_name, Config};
use crate::error::{StorageError, WindowError};
use crate::indexer::Indexer;
use crate::models::{DashboardSnapshot, DateWindow, PullRequest};
use crate::query::{QueryService, DEFAULT_RECENT_LIMIT};
use crate::store::PullRequestStore;
use crate::upstream::{GitHubClient, Upstream};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: PullRequestStore,
    indexer: Indexer,
    queries: QueryService,
}

/// Starts the HTTP server against the real GitHub API.
///
/// Binds to `[server].bind` and runs until Ctrl-C, then closes the database.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let upstream = GitHubClient::new(&config.github)?;
    run_server_with_upstream(config, Arc::new(upstream)).await
}

/// Starts the HTTP server with a caller-supplied [`Upstream`].
///
/// Used by tests and by embedders that front a different hosting API.
pub async fn run_server_with_upstream(
    config: &Config,
    upstream: Arc<dyn Upstream>,
) -> anyhow::Result<()> {
    let store = PullRequestStore::open(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        indexer: Indexer::new(upstream, store.clone(), config.indexer.page_size),
        queries: QueryService::new(store.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/index-repo", post(handle_index_repo))
        .route("/api/index-all-repos", post(handle_index_all_repos))
        .route("/api/dashboard", get(handle_dashboard))
        .route("/api/pr-count", get(handle_pr_count))
        .route("/api/debug/prs", get(handle_debug_prs))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    store.close().await;
    info!("server stopped");
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: code.to_string(),
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<WindowError> for AppError {
    fn from(err: WindowError) -> Self {
        bad_request(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, "storage read failed");
        internal("storage_error", err.to_string())
    }
}

// ============ POST /api/index-repo ============

#[derive(Deserialize)]
struct IndexRepoRequest {
    repo: String,
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: String,
}

async fn handle_index_repo(
    State(state): State<AppState>,
    body: Result<Json<IndexRepoRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(req) = body?;
    let repo = req.repo.trim();
    if repo.is_empty() {
        return Err(bad_request("repo must not be empty"));
    }
    if !is_repo_name(repo) {
        return Err(bad_request(format!("invalid repository name: {}", repo)));
    }
    let window = DateWindow::parse(&req.start_date, &req.end_date)?;

    let outcome = state
        .indexer
        .index_repository(repo, &window)
        .await
        .map_err(|e| internal("index_error", format!("Error indexing {}: {}", repo, e)))?;

    Ok(Json(StatusResponse {
        status: "success",
        message: format!(
            "Indexed {} pull requests from {} ({} pages)",
            outcome.upserted, repo, outcome.pages_fetched
        ),
    }))
}

// ============ POST /api/index-all-repos ============

#[derive(Deserialize)]
struct IndexAllRequest {
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct IndexAllResponse {
    status: &'static str,
    message: String,
    indexed_repos: Vec<String>,
    failed_repos: Vec<FailedRepo>,
    date_range: DateWindow,
}

#[derive(Serialize)]
struct FailedRepo {
    repo: String,
    error: String,
}

async fn handle_index_all_repos(
    State(state): State<AppState>,
    body: Result<Json<IndexAllRequest>, JsonRejection>,
) -> Result<Json<IndexAllResponse>, AppError> {
    let Json(req) = body?;
    let window = DateWindow::parse(&req.start_date, &req.end_date)?;
    let results = state
        .indexer
        .index_all_repositories(&state.config.indexer.repos, &window)
        .await;

    let mut indexed_repos = Vec::new();
    let mut failed_repos = Vec::new();
    let mut upserted = 0u64;
    for r in results {
        match r.result {
            Ok(outcome) => {
                upserted += outcome.upserted;
                indexed_repos.push(r.repo);
            }
            Err(e) => failed_repos.push(FailedRepo {
                repo: r.repo,
                error: e.to_string(),
            }),
        }
    }

    Ok(Json(IndexAllResponse {
        status: if failed_repos.is_empty() {
            "success"
        } else {
            "partial"
        },
        message: format!(
            "Indexed {} pull requests across {} repositories ({} failed)",
            upserted,
            indexed_repos.len(),
            failed_repos.len()
        ),
        indexed_repos,
        failed_repos,
        date_range: window,
    }))
}

// ============ GET /api/dashboard ============

async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.queries.dashboard_snapshot(Utc::now()).await)
}

// ============ GET /api/pr-count ============

#[derive(Serialize)]
struct PrCountResponse {
    pr_count: i64,
}

async fn handle_pr_count(State(state): State<AppState>) -> Result<Json<PrCountResponse>, AppError> {
    let pr_count = state.queries.total_count().await?;
    Ok(Json(PrCountResponse { pr_count }))
}

// ============ GET /api/debug/prs ============

#[derive(Serialize)]
struct DebugPrsResponse {
    total_prs: i64,
    prs: Vec<PullRequest>,
}

async fn handle_debug_prs(State(state): State<AppState>) -> Result<Json<DebugPrsResponse>, AppError> {
    let total_prs = state.queries.total_count().await?;
    let prs = state.queries.list_recent(DEFAULT_RECENT_LIMIT).await?;
    Ok(Json(DebugPrsResponse { total_prs, prs }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            error!(error = %e, "database ping failed");
            "unavailable"
        }
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
