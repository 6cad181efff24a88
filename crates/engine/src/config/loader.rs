use std::collections::HashMap;
use std::path::{Path, PathBuf};

use courtside_common::config::SystemConfig;
use serde_json::Value;

use super::validation;

/// Complete engine configuration loaded from the config directory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parsed system.toml.
    pub system: SystemConfig,
    /// Tool schemas keyed by "{role}/{tool_name}" (e.g. "chat/get_player_info").
    pub tool_schemas: HashMap<String, Value>,
    /// Prompt templates keyed by filename stem (e.g. "chat").
    pub prompts: HashMap<String, String>,
    /// Base config directory path (used for future config reload).
    #[allow(dead_code)]
    pub config_dir: PathBuf,
}

/// Load all configuration from the given config directory.
///
/// Fails loudly with clear error messages if anything is misconfigured.
/// The engine refuses to start on validation failure.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    let system = load_system_config(&config_dir.join("system.toml"))?;
    let tool_schemas = load_tool_schemas(&config_dir.join("tools"))?;
    let prompts = load_prompts(&config_dir.join("prompts"))?;

    let config = EngineConfig {
        system,
        tool_schemas,
        prompts,
        config_dir: config_dir.to_path_buf(),
    };

    validation::validate(&config)?;

    tracing::info!(
        tool_schemas = config.tool_schemas.len(),
        prompts = config.prompts.len(),
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn load_system_config(path: &Path) -> Result<SystemConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Load tool schemas from config/tools/{role}/*.json, keyed "{role}/{stem}".
fn load_tool_schemas(tools_dir: &Path) -> Result<HashMap<String, Value>, ConfigError> {
    let mut schemas = HashMap::new();

    if !tools_dir.exists() {
        tracing::warn!(
            path = %tools_dir.display(),
            "Tools directory does not exist, no tool schemas loaded"
        );
        return Ok(schemas);
    }

    for entry in read_dir(tools_dir)? {
        let role_path = entry;
        if !role_path.is_dir() {
            continue;
        }

        let role_name = role_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        for file_path in read_dir(&role_path)? {
            if !file_path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            let tool_name = file_path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");

            let content =
                std::fs::read_to_string(&file_path).map_err(|e| ConfigError::FileRead {
                    path: file_path.clone(),
                    source: e,
                })?;

            let schema: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: file_path.clone(),
                detail: e.to_string(),
            })?;

            let key = format!("{}/{}", role_name, tool_name);
            tracing::debug!(tool = %key, "Loaded tool schema");
            schemas.insert(key, schema);
        }
    }

    Ok(schemas)
}

/// Load prompt templates from config/prompts/*.md (or .txt), keyed by stem.
fn load_prompts(prompts_dir: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let mut prompts = HashMap::new();

    if !prompts_dir.exists() {
        tracing::warn!(
            path = %prompts_dir.display(),
            "Prompts directory does not exist, no prompts loaded"
        );
        return Ok(prompts);
    }

    for path in read_dir(prompts_dir)? {
        if !path
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "txt")
        {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(prompt = %name, "Loaded prompt template");
        prompts.insert(name, content);
    }

    Ok(prompts)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::FileRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::FileRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        paths.push(entry.path());
    }
    Ok(paths)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}
