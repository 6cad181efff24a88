use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub limits: TurnLimits,
    pub llm: LlmConfig,
    pub stats: StatsProviderConfig,
    pub tool_results: ToolResultLimits,
}

/// Safety limits for a single user turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnLimits {
    /// Max LLM round-trips per user turn before giving up.
    pub max_rounds_per_turn: u32,
    /// Consecutive malformed tool calls before ending the turn.
    pub max_consecutive_malformed_tool_calls: u32,
}

/// LLM provider and model configuration per role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Tool-calling model that drives the conversation.
    pub chat: LlmRoleConfig,
    /// Higher-capability model for the deterministic formatting pass.
    pub formatter: LlmRoleConfig,
}

/// Configuration for a single LLM role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmRoleConfig {
    /// Provider name ("anthropic").
    pub provider: String,
    /// Model identifier (e.g. "claude-3-haiku-20240307").
    pub model: String,
    /// Max tokens in the response.
    pub max_tokens: u32,
    /// Temperature (0.0–2.0). The formatter role pins this to 0.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Sports-statistics provider endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsProviderConfig {
    /// Base URL of the stats API (e.g. "https://stats.nba.com/stats").
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Season passed to the player directory endpoint (e.g. "2025-26").
    pub season: String,
}

/// Tool result size limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResultLimits {
    /// Max table rows placed into a single tool_result block.
    pub max_rows: u32,
}
