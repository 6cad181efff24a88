use super::loader::{ConfigError, EngineConfig};

/// Tools the chat role must carry a schema for.
const REQUIRED_CHAT_TOOLS: &[&str] = &[
    "get_player_info",
    "get_player_statistics",
    "get_league_titles",
];

/// Validate the complete engine configuration.
///
/// Checks sane ranges on numeric parameters and that required tool schemas
/// and prompts exist. The engine refuses to start on validation failure.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_limits(config, &mut errors);
    validate_llm(config, &mut errors);
    validate_stats(config, &mut errors);
    validate_tool_schemas(config, &mut errors);
    validate_prompts(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_limits(config: &EngineConfig, errors: &mut Vec<String>) {
    let l = &config.system.limits;

    if l.max_rounds_per_turn == 0 {
        errors.push("limits.max_rounds_per_turn must be > 0".into());
    }
    if l.max_consecutive_malformed_tool_calls == 0 {
        errors.push("limits.max_consecutive_malformed_tool_calls must be > 0".into());
    }

    if config.system.tool_results.max_rows == 0 {
        errors.push("tool_results.max_rows must be > 0".into());
    }
}

fn validate_llm(config: &EngineConfig, errors: &mut Vec<String>) {
    let validate_role =
        |role: &courtside_common::config::LlmRoleConfig, name: &str, errors: &mut Vec<String>| {
            if role.provider.is_empty() {
                errors.push(format!("llm.{}.provider must not be empty", name));
            }
            if role.model.is_empty() {
                errors.push(format!("llm.{}.model must not be empty", name));
            }
            if role.max_tokens == 0 {
                errors.push(format!("llm.{}.max_tokens must be > 0", name));
            }
            if let Some(temp) = role.temperature {
                if !(0.0..=2.0).contains(&temp) {
                    errors.push(format!(
                        "llm.{}.temperature must be between 0.0 and 2.0",
                        name
                    ));
                }
            }
        };

    validate_role(&config.system.llm.chat, "chat", errors);
    validate_role(&config.system.llm.formatter, "formatter", errors);
}

fn validate_stats(config: &EngineConfig, errors: &mut Vec<String>) {
    let s = &config.system.stats;

    if s.base_url.is_empty() {
        errors.push("stats.base_url must not be empty".into());
    }
    if s.timeout_seconds == 0 {
        errors.push("stats.timeout_seconds must be > 0".into());
    }
    if s.season.is_empty() {
        errors.push("stats.season must not be empty".into());
    }
}

fn validate_tool_schemas(config: &EngineConfig, errors: &mut Vec<String>) {
    for tool in REQUIRED_CHAT_TOOLS {
        let key = format!("chat/{}", tool);
        match config.tool_schemas.get(&key) {
            None => errors.push(format!("missing tool schema '{}'", key)),
            Some(schema) => {
                for field in ["name", "description", "input_schema"] {
                    if schema.get(field).is_none() {
                        errors.push(format!("tool schema '{}' missing '{}' field", key, field));
                    }
                }
            }
        }
    }
}

fn validate_prompts(config: &EngineConfig, errors: &mut Vec<String>) {
    if !config.prompts.contains_key("chat") {
        errors.push("missing prompt template 'chat'".into());
    }
}
