use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use courtside_common::api::chat::{ChatRequest, ChatResponse, TranscriptResponse};
use courtside_common::SessionId;

use crate::chat::turn::TurnError;
use crate::chat::{ChatEngine, SessionManager};
use crate::llm::LlmError;

/// Shared application state accessible from axum handlers.
pub struct AppState {
    pub engine: ChatEngine,
    pub sessions: SessionManager,
    pub metrics_handle: PrometheusHandle,
}

/// Build the full HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/chat", post(chat_handler))
        .route("/transcript/{session_id}", get(transcript_handler))
        .route("/session/{session_id}", delete(delete_session_handler))
        .with_state(state)
}

/// POST /chat — run one user turn to completion.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if request.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message must not be empty".into()));
    }

    let (session_id, session) = state.sessions.get_or_create(request.session_id).await;

    // Per-session mutex: turns within a session are strictly serial.
    let mut session = session.lock().await;

    tracing::info!(session_id = %session_id, "Chat turn started");

    let report = state
        .engine
        .run(&mut session, &request.message)
        .await
        .map_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "Chat turn failed");
            turn_error_response(e)
        })?;

    Ok(Json(ChatResponse {
        session_id,
        answer: report.outcome.answer().map(String::from),
        outcome: report.outcome.label().to_string(),
        used_tools: report.used_tools,
        rounds: report.stats.rounds,
        tool_calls: report.stats.tool_calls,
        input_tokens: report.stats.input_tokens,
        output_tokens: report.stats.output_tokens,
        turn_cost_usd: report.cost.total_usd(),
        session_cost_usd: session.total_cost_usd,
    }))
}

/// GET /transcript/{session_id} — raw transcript dump for debugging.
pub async fn transcript_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<TranscriptResponse>, (StatusCode, String)> {
    let session = state
        .sessions
        .get(session_id)
        .await
        .ok_or((StatusCode::NOT_FOUND, format!("no session {}", session_id)))?;

    let session = session.lock().await;

    Ok(Json(TranscriptResponse {
        session_id,
        created_at: session.created_at,
        session_cost_usd: session.total_cost_usd,
        messages: session.transcript.to_json(),
    }))
}

/// DELETE /session/{session_id} — session reset.
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("no session {}", session_id)))
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "active_sessions": state.sessions.active_count().await,
        })),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

fn turn_error_response(e: TurnError) -> (StatusCode, String) {
    let status = match &e {
        TurnError::Provider(LlmError::RateLimited { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        TurnError::Provider(_) => StatusCode::BAD_GATEWAY,
        TurnError::Tool(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, courtside_common::CourtsideError::from(e).to_string())
}
