use thiserror::Error;

/// Top-level error type for Courtside operations.
#[derive(Debug, Error)]
pub enum CourtsideError {
    // --- Turn-fatal errors (the current user turn fails) ---
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Unrecognized tool: {0}")]
    UnrecognizedTool(String),

    // --- External collaborator errors ---
    #[error("Stats provider error: {0}")]
    StatsProvider(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl CourtsideError {
    /// Whether this error aborts the user turn it occurred in.
    /// Lookup misses are not errors at all — they flow back to the model as
    /// empty results.
    pub fn is_turn_fatal(&self) -> bool {
        matches!(self, Self::LlmApi(_) | Self::UnrecognizedTool(_))
    }
}

/// Result type alias for Courtside operations.
pub type Result<T> = std::result::Result<T, CourtsideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_fatal_taxonomy() {
        assert!(CourtsideError::LlmApi("timeout".into()).is_turn_fatal());
        assert!(CourtsideError::UnrecognizedTool("get_coach_info".into()).is_turn_fatal());
        assert!(!CourtsideError::Config("bad toml".into()).is_turn_fatal());
        assert!(!CourtsideError::NotFound("session".into()).is_turn_fatal());
    }
}
