use std::sync::Arc;

use courtside_common::CourtsideError;

use crate::config::EngineConfig;
use crate::llm::LlmClient;
use crate::stats::StatsSource;
use crate::tools::handlers::register_chat_tools;
use crate::tools::{ToolHandlerContext, ToolRegistry};

use super::session::ChatSession;
use super::turn::{run_turn, TurnConfig, TurnError, TurnReport};

/// The conversation engine — wires the two LLM roles, the system prompt and
/// the tool registry together, and drives turns against a session.
pub struct ChatEngine {
    chat_llm: Arc<LlmClient>,
    formatter_llm: Arc<LlmClient>,
    system_prompt: String,
    registry: Arc<ToolRegistry>,
    turn_config: TurnConfig,
}

impl ChatEngine {
    pub fn new(config: &EngineConfig, stats: Arc<dyn StatsSource>) -> Result<Self, CourtsideError> {
        let chat_llm = LlmClient::new(config.system.llm.chat.clone()).ok_or_else(|| {
            CourtsideError::Config("Failed to create chat LLM client — API key not set".into())
        })?;
        let formatter_llm = LlmClient::new(config.system.llm.formatter.clone()).ok_or_else(|| {
            CourtsideError::Config("Failed to create formatter LLM client — API key not set".into())
        })?;

        let context = ToolHandlerContext {
            stats,
            result_limits: config.system.tool_results.clone(),
        };

        let mut registry = ToolRegistry::new(context);
        register_chat_tools(&mut registry);
        registry
            .load_definitions(&config.tool_schemas, "chat")
            .map_err(CourtsideError::Config)?;

        let system_prompt = config
            .prompts
            .get("chat")
            .ok_or_else(|| CourtsideError::Config("Prompt template 'chat' not found".into()))?
            .clone();

        let turn_config = TurnConfig {
            max_rounds: config.system.limits.max_rounds_per_turn,
            max_consecutive_malformed: config.system.limits.max_consecutive_malformed_tool_calls,
        };

        Ok(Self {
            chat_llm: Arc::new(chat_llm),
            formatter_llm: Arc::new(formatter_llm),
            system_prompt,
            registry: Arc::new(registry),
            turn_config,
        })
    }

    /// Run one user turn against a session. The session's cost total picks
    /// up whatever the turn spent.
    pub async fn run(
        &self,
        session: &mut ChatSession,
        user_text: &str,
    ) -> Result<TurnReport, TurnError> {
        let start = std::time::Instant::now();
        let executor = self.registry.executor();

        let report = run_turn(
            self.chat_llm.as_ref(),
            self.formatter_llm.as_ref(),
            &self.system_prompt,
            self.registry.definitions(),
            &executor,
            &self.turn_config,
            &mut session.transcript,
            user_text,
        )
        .await?;

        session.total_cost_usd += report.cost.total_usd();

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("chat.turn.duration").record(duration);
        metrics::histogram!("chat.turn.tool_calls").record(report.stats.tool_calls as f64);
        metrics::histogram!("chat.turn.cost_usd").record(report.cost.total_usd());
        metrics::counter!("chat.turn.outcome", "outcome" => report.outcome.label()).increment(1);

        tracing::info!(
            duration_s = duration,
            rounds = report.stats.rounds,
            tool_calls = report.stats.tool_calls,
            input_tokens = report.stats.input_tokens,
            output_tokens = report.stats.output_tokens,
            cost_usd = report.cost.total_usd(),
            outcome = report.outcome.label(),
            "Chat turn completed"
        );

        Ok(report)
    }
}
