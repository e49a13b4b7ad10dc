//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Answer one message: `{ message }` → `{ reply }` or `{ html }` |
//! | `GET`  | `/api/courses?q=..&limit=..` | Title search over the course index |
//! | `GET`  | `/api/courses/{code}` | One course with its prerequisites and what it unlocks |
//! | `GET`  | `/health` | Health check (version and course count) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no course with code COMP 999" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//!
//! `/api/chat` never answers with an error status: a missing or malformed
//! body is treated as an empty message and gets the usual prompt.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front end
//! on another origin can call the API directly.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::ask;
use crate::assistant::Assistant;
use crate::config::Config;
use crate::extract;
use crate::models::CourseRecord;
use crate::upstream::first_text;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    /// Send the rich payload when one exists and the request does not opt out.
    pub rich_replies: bool,
}

/// Loads the index, wires the HTTP adapters and serves until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let assistant = ask::build_assistant(config)?;

    let state = AppState {
        assistant: Arc::new(assistant),
        rich_replies: config.server.rich_replies,
    };

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        addr = %bind_addr,
        courses = state.assistant.index().len(),
        "server listening"
    );
    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/courses", get(handle_search))
        .route("/api/courses/{code}", get(handle_course))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
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
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
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

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    courses: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        courses: state.assistant.index().len(),
    })
}

// ============ POST /api/chat ============

/// Accepts `message` (or `q` / `text`) and an optional `format` of
/// `"plain"` or `"rich"`.
async fn handle_chat(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let message = first_text(&request, &["message", "q", "text"]).unwrap_or_default();
    let format = request.get("format").and_then(Value::as_str);

    let wants_rich = match format {
        Some("rich") | Some("html") => true,
        Some("plain") | Some("text") => false,
        _ => state.rich_replies,
    };

    let reply = state.assistant.respond(&message).await;
    match reply.answer.html().filter(|_| wants_rich) {
        Some(html) => Json(json!({ "html": html })),
        None => Json(json!({ "reply": reply.answer.plain() })),
    }
}

// ============ GET /api/courses ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchHit {
    code: String,
    title: String,
    credits: Option<f64>,
    score: f64,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, AppError> {
    let q = params.q.unwrap_or_default();
    if q.trim().is_empty() {
        return Err(bad_request("q must not be empty"));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let results: Vec<SearchHit> = state
        .assistant
        .index()
        .search_titles(&q, limit)
        .into_iter()
        .map(|(r, score)| SearchHit {
            code: r.code(),
            title: r.title.clone(),
            credits: r.credits,
            score,
        })
        .collect();

    Ok(Json(json!({ "results": results })))
}

// ============ GET /api/courses/{code} ============

#[derive(Serialize)]
struct CourseResponse<'a> {
    course: &'a CourseRecord,
    prerequisites: Vec<String>,
    unlocks: Vec<String>,
}

async fn handle_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let key = extract::course_code(&code)
        .ok_or_else(|| bad_request(format!("not a course code: {}", code)))?;

    let index = state.assistant.index();
    let record = index
        .get(&key)
        .ok_or_else(|| not_found(format!("no course with code {}", key)))?;

    let body = CourseResponse {
        course: record,
        prerequisites: index.prerequisites_of(&key),
        unlocks: index.unlocked_by(&key).iter().map(|r| r.code()).collect(),
    };
    Ok(Json(body).into_response())
}
