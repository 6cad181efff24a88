use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use courtside_common::config::ToolResultLimits;

use crate::chat::turn::{ToolExecutionResult, ToolExecutor};
use crate::llm::types::ToolDefinition;
use crate::stats::StatsSource;

/// Shared context available to all tool handlers.
pub struct ToolHandlerContext {
    pub stats: Arc<dyn StatsSource>,
    pub result_limits: ToolResultLimits,
}

/// Handler function signature — takes the model-supplied input and the
/// context, returns JSON or an error string for the model.
pub type ToolHandler = Arc<
    dyn Fn(
            Value,
            Arc<ToolHandlerContext>,
        ) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>
        + Send
        + Sync,
>;

/// Dispatch failures that abort the turn (as opposed to handler errors,
/// which are fed back to the model as error tool results).
#[derive(Debug, thiserror::Error)]
pub enum ToolDispatchError {
    #[error("unrecognized tool: '{0}'")]
    Unrecognized(String),
}

impl From<ToolDispatchError> for courtside_common::CourtsideError {
    fn from(e: ToolDispatchError) -> Self {
        match e {
            ToolDispatchError::Unrecognized(name) => {
                courtside_common::CourtsideError::UnrecognizedTool(name)
            }
        }
    }
}

/// Registry of tool handlers with their schema definitions.
pub struct ToolRegistry {
    handlers: HashMap<String, ToolHandler>,
    definitions: Vec<ToolDefinition>,
    context: Arc<ToolHandlerContext>,
}

impl ToolRegistry {
    pub fn new(context: ToolHandlerContext) -> Self {
        Self {
            handlers: HashMap::new(),
            definitions: Vec::new(),
            context: Arc::new(context),
        }
    }

    /// Register a tool handler by name.
    pub fn register(&mut self, name: &str, handler: ToolHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Load tool definitions from the config-loaded schemas.
    /// Filters to schemas matching the given role prefix (e.g. "chat").
    pub fn load_definitions(
        &mut self,
        tool_schemas: &HashMap<String, Value>,
        role: &str,
    ) -> Result<(), String> {
        let prefix = format!("{}/", role);

        for (key, schema) in tool_schemas {
            if !key.starts_with(&prefix) {
                continue;
            }

            let name = schema
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("Tool schema '{}' missing 'name' field", key))?
                .to_string();

            let description = schema
                .get("description")
                .and_then(|v| v.as_str())
                .ok_or_else(|| format!("Tool schema '{}' missing 'description' field", key))?
                .to_string();

            let input_schema = schema
                .get("input_schema")
                .cloned()
                .ok_or_else(|| format!("Tool schema '{}' missing 'input_schema' field", key))?;

            self.definitions.push(ToolDefinition {
                name,
                description,
                input_schema,
            });
        }

        tracing::info!(
            role = role,
            tools = self.definitions.len(),
            "Loaded tool definitions"
        );

        Ok(())
    }

    /// Get the tool definitions for sending to the LLM.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Execute a tool call by name.
    ///
    /// An unrecognized name is a dispatch failure (fatal to the turn);
    /// everything a handler reports — bad input, provider trouble, lookup
    /// misses — comes back as a ToolExecutionResult for the model.
    pub async fn execute(
        &self,
        tool_name: &str,
        args: Value,
    ) -> Result<ToolExecutionResult, ToolDispatchError> {
        let start = std::time::Instant::now();

        let handler = match self.handlers.get(tool_name) {
            Some(h) => h,
            None => {
                tracing::warn!(tool = %tool_name, "Unrecognized tool requested");
                metrics::counter!("tools.execution.errors", "tool" => tool_name.to_string())
                    .increment(1);
                return Err(ToolDispatchError::Unrecognized(tool_name.to_string()));
            }
        };

        tracing::info!(tool = %tool_name, "Tool call started");

        let result = handler(args, Arc::clone(&self.context)).await;

        let latency = start.elapsed().as_secs_f64();
        metrics::histogram!("tools.execution.latency", "tool" => tool_name.to_string())
            .record(latency);
        metrics::counter!("tools.execution.count", "tool" => tool_name.to_string()).increment(1);

        match result {
            Ok(value) => {
                let content = serde_json::to_string(&value).unwrap_or_else(|e| {
                    format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
                });
                tracing::info!(
                    tool = %tool_name,
                    latency_s = latency,
                    result_len = content.len(),
                    "Tool call succeeded"
                );
                Ok(ToolExecutionResult {
                    content,
                    is_error: false,
                    is_malformed: false,
                })
            }
            Err(msg) => {
                tracing::warn!(
                    tool = %tool_name,
                    latency_s = latency,
                    error = %msg,
                    "Tool call failed"
                );
                metrics::counter!("tools.execution.errors", "tool" => tool_name.to_string())
                    .increment(1);
                // Serde-style phrasing marks args the model got wrong.
                let is_malformed = msg.contains("invalid type")
                    || msg.contains("missing field")
                    || msg.contains("expected");
                Ok(ToolExecutionResult {
                    content: msg,
                    is_error: true,
                    is_malformed,
                })
            }
        }
    }

    /// Create a ToolExecutor closure for use with `run_turn`.
    pub fn executor(self: &Arc<Self>) -> ToolExecutor {
        let registry = Arc::clone(self);
        Box::new(move |name: String, args: Value| {
            let registry = Arc::clone(&registry);
            Box::pin(async move { registry.execute(&name, args).await })
        })
    }
}
