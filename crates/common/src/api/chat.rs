use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SessionId;

/// POST /chat request — one user question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Session to continue; omit to start a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub message: String,
}

/// POST /chat response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: SessionId,
    /// Final natural-language answer. Absent when the model produced no text
    /// where one was expected ("no answer available").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Turn outcome label ("answered", "no_answer", "round_limit",
    /// "malformed_limit").
    pub outcome: String,
    pub used_tools: bool,
    pub rounds: u32,
    pub tool_calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Estimated cost of this turn across all LLM calls, in USD.
    pub turn_cost_usd: f64,
    /// Running cost total for the session, in USD.
    pub session_cost_usd: f64,
}

/// GET /transcript/{session_id} response — raw transcript dump for debugging.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub session_cost_usd: f64,
    /// The stored conversation messages, serialized verbatim.
    pub messages: Value,
}
