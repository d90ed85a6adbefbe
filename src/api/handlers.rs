//! HTTP request handlers

use super::sse::{sse_stream, ThreadEvent};
use super::types::{
    CancelResponse, ErrorResponse, SubmitRequest, SubmitResponse, ThreadListResponse,
    ThreadResponse, ViewQuery,
};
use super::AppState;
use crate::conversation::ConversationThread;
use crate::projector::{project, GraphView, SelectionState};
use crate::session::{SessionError, SubmitError};
use crate::topology::GraphTopology;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Threads
        .route("/api/threads", get(list_threads).post(submit_turn))
        .route("/api/threads/:id", get(get_thread))
        .route("/api/threads/:id/cancel", post(cancel_thread))
        .route("/api/threads/:id/view", get(get_view))
        // Real-time streaming
        .route("/api/threads/:id/stream", get(stream_thread))
        // Workflow graph
        .route("/api/graph", get(get_graph))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Threads
// ============================================================

async fn submit_turn(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let thread_id = req
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    state
        .sessions
        .submit(&thread_id, req.content, req.settings)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { thread_id })))
}

async fn list_threads(State(state): State<AppState>) -> Json<ThreadListResponse> {
    let mut threads = Vec::new();
    for thread in state.store().all() {
        let status = state.sessions.status(&thread.id).await;
        threads.push(ThreadResponse { thread, status });
    }
    Json(ThreadListResponse { threads })
}

async fn get_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ThreadResponse>, AppError> {
    let thread = find_thread(&state, &id)?;
    let status = state.sessions.status(&id).await;
    Ok(Json(ThreadResponse { thread, status }))
}

async fn cancel_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let status = state.sessions.cancel(&id).await?;
    Ok(Json(CancelResponse { ok: true, status }))
}

async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<GraphView>, AppError> {
    let thread = find_thread(&state, &id)?;
    let status = state.sessions.status(&id).await;
    let selection = SelectionState {
        selected_thread_id: Some(id),
        selected_agent_name: query.agent,
    };
    Ok(Json(project(&thread, &status, &selection, &state.topology)))
}

fn find_thread(state: &AppState, id: &str) -> Result<Arc<ConversationThread>, AppError> {
    state
        .store()
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Thread not found: {id}")))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Subscribe before the snapshot so no update falls in between
    let updates = state.store().subscribe();
    let status_updates = state.sessions.subscribe_status();
    let thread = find_thread(&state, &id)?;
    let status = state.sessions.status(&id).await;

    let init_event = ThreadEvent::Init { thread, status };
    Ok(sse_stream(init_event, id, updates, status_updates))
}

// ============================================================
// Workflow graph
// ============================================================

async fn get_graph(State(state): State<AppState>) -> Json<GraphTopology> {
    Json(state.topology.as_ref().clone())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("workflow-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<SubmitError> for AppError {
    fn from(error: SubmitError) -> Self {
        match error {
            SubmitError::AlreadyStreaming(_) => AppError::Conflict(error.to_string()),
            SubmitError::EmptyThreadId => AppError::BadRequest(error.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(_) => AppError::NotFound(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
