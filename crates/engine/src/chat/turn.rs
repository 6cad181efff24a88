use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::llm::types::{ContentBlock, Message, ToolDefinition};
use crate::llm::{LlmCaller, LlmError};
use crate::tools::registry::ToolDispatchError;

use super::cost::TurnCost;
use super::transcript::Transcript;

/// Configuration for one orchestrated turn.
pub struct TurnConfig {
    pub max_rounds: u32,
    pub max_consecutive_malformed: u32,
}

/// Result from executing a single tool call.
#[derive(Debug)]
pub struct ToolExecutionResult {
    pub content: String,
    pub is_error: bool,
    /// Only malformed calls count toward the consecutive limit.
    pub is_malformed: bool,
}

/// Closure type for the tool executor passed to `run_turn`. An `Err` is a
/// dispatch failure (unrecognized tool) and aborts the turn.
pub type ToolExecutor = Box<
    dyn Fn(
            String,
            Value,
        ) -> Pin<
            Box<dyn Future<Output = Result<ToolExecutionResult, ToolDispatchError>> + Send>,
        > + Send
        + Sync,
>;

/// Accumulated statistics for one turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct TurnStats {
    pub rounds: u32,
    pub tool_calls: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// How a turn ended.
#[derive(Clone, Debug)]
pub enum TurnOutcome {
    /// Final user-facing text produced.
    Answered { text: String },
    /// The model produced no text where one was expected.
    NoAnswer,
    /// Hit the configured round limit while the model kept calling tools.
    RoundLimitReached,
    /// Too many consecutive malformed tool calls.
    MalformedToolCallLimit,
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Answered { .. } => "answered",
            Self::NoAnswer => "no_answer",
            Self::RoundLimitReached => "round_limit",
            Self::MalformedToolCallLimit => "malformed_limit",
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { text } => Some(text),
            _ => None,
        }
    }
}

/// Everything a completed turn reports back to the caller.
#[derive(Debug)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub used_tools: bool,
    pub stats: TurnStats,
    pub cost: TurnCost,
}

/// Errors that abort a turn. Surfaced to the user, never retried.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("LLM provider call failed: {0}")]
    Provider(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolDispatchError),
}

impl From<TurnError> for courtside_common::CourtsideError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::Provider(p) => p.into(),
            TurnError::Tool(t) => t.into(),
        }
    }
}

/// Drive one user turn to completion.
///
/// Appends the user text, round-trips with the chat model executing every
/// requested tool call, and — when tools were involved — normalizes the
/// tool-informed draft through a content-isolated formatting call against
/// the formatter model. The final answer lands in the transcript as the
/// last assistant message.
#[allow(clippy::too_many_arguments)]
pub async fn run_turn(
    chat_llm: &dyn LlmCaller,
    formatter_llm: &dyn LlmCaller,
    system_prompt: &str,
    tools: &[ToolDefinition],
    executor: &ToolExecutor,
    config: &TurnConfig,
    transcript: &mut Transcript,
    user_text: &str,
) -> Result<TurnReport, TurnError> {
    transcript.push_user_text(user_text);

    let mut stats = TurnStats::default();
    let mut cost = TurnCost::default();
    let mut used_tools = false;
    let mut consecutive_malformed: u32 = 0;

    let outcome = loop {
        if stats.rounds >= config.max_rounds {
            tracing::warn!(rounds = stats.rounds, "Turn hit round limit");
            break TurnOutcome::RoundLimitReached;
        }
        stats.rounds += 1;

        let response = chat_llm
            .chat(system_prompt, &transcript.wire_messages(), tools)
            .await?;

        cost.record(&response.model, &response.usage);
        stats.input_tokens += response.usage.input_tokens;
        stats.output_tokens += response.usage.output_tokens;

        let tool_uses: Vec<(String, String, Value)> = response
            .tool_uses()
            .into_iter()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        transcript.push_assistant(response.content.clone());

        if tool_uses.is_empty() {
            let draft = match response.text() {
                Some(text) => text,
                None => break TurnOutcome::NoAnswer,
            };

            if !used_tools {
                // No tool involved — the raw text is already the answer and
                // already sits in the transcript.
                break TurnOutcome::Answered { text: draft };
            }

            match reformat(formatter_llm, &draft, &mut stats, &mut cost).await? {
                Some(text) => {
                    transcript.push_assistant_text(text.clone());
                    break TurnOutcome::Answered { text };
                }
                None => break TurnOutcome::NoAnswer,
            }
        }

        used_tools = true;

        let mut results = Vec::with_capacity(tool_uses.len());
        for (id, name, input) in tool_uses {
            stats.tool_calls += 1;
            let result = executor(name, input).await?;

            if result.is_malformed {
                consecutive_malformed += 1;
            } else {
                consecutive_malformed = 0;
            }

            results.push(ContentBlock::ToolResult {
                tool_use_id: id,
                content: result.content,
                is_error: if result.is_error { Some(true) } else { None },
            });
        }

        transcript.push_tool_results(results);

        if consecutive_malformed >= config.max_consecutive_malformed {
            tracing::warn!(
                consecutive = consecutive_malformed,
                "Turn hit malformed tool call limit"
            );
            break TurnOutcome::MalformedToolCallLimit;
        }
    };

    Ok(TurnReport {
        outcome,
        used_tools,
        stats,
        cost,
    })
}

/// The second, content-isolated pass: rewrite the tool-informed draft as
/// user-facing prose against the formatter model. Returns None when the
/// formatter produced no text.
async fn reformat(
    formatter_llm: &dyn LlmCaller,
    draft: &str,
    stats: &mut TurnStats,
    cost: &mut TurnCost,
) -> Result<Option<String>, TurnError> {
    let request = vec![Message::user_text(formatting_prompt(draft))];

    let response = formatter_llm.chat("", &request, &[]).await?;

    cost.record(&response.model, &response.usage);
    stats.input_tokens += response.usage.input_tokens;
    stats.output_tokens += response.usage.output_tokens;

    Ok(response.text())
}

/// Instructional template for the formatting pass. The draft mixes data and
/// scaffolding; the rules pin the output to plain prose with no trace of the
/// tool machinery.
fn formatting_prompt(draft: &str) -> String {
    format!(
        "Rewrite the draft below as the final reply to the user.\n\n\
         Draft:\n\n{}\n\n\
         Rules:\n\n\
         - Respond with plain prose, as a single string.\n\
         - Answer the user's question directly.\n\
         - Do not mention any tool, lookup, or data source.\n\
         - Do not include XML-like tags in the response.\n\
         - Match the register of the examples below.\n\n\
         Examples:\n\n\
         \"Draymond Green currently plays for the Golden State Warriors.\"\n\n\
         \"Here are some statistics regarding Draymond Green:\n\
         1. The most points he scored in a season was 100, during the 2020-2021 season.\n\
         2. His free throw percentage was 100% that season.\n\
         3. For the season he scored the most points, he played for the Golden State Warriors.\"\n\n\
         \"The Golden State Warriors have won 6 league titles.\"",
        draft
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, StopReason, TokenUsage};
    use std::sync::atomic::{AtomicU32, Ordering};

    const CHAT_MODEL: &str = "claude-3-haiku-20240307";
    const FORMATTER_MODEL: &str = "claude-3-opus-20240229";

    /// Mock LLM returning pre-configured responses in sequence.
    struct MockLlm {
        responses: std::sync::Mutex<Vec<Result<LlmResponse, LlmError>>>,
        calls: AtomicU32,
    }

    impl MockLlm {
        fn new(responses: Vec<Result<LlmResponse, LlmError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: std::sync::Mutex::new(responses),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LlmCaller for MockLlm {
        fn chat<'a>(
            &'a self,
            _system: &'a str,
            _messages: &'a [Message],
            _tools: &'a [ToolDefinition],
        ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("MockLlm ran out of responses");
            Box::pin(async move { result })
        }
    }

    fn text_response(model: &str, text: &str) -> LlmResponse {
        LlmResponse {
            model: model.into(),
            content: vec![ContentBlock::Text { text: text.into() }],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 40,
            },
        }
    }

    fn tool_use_response(name: &str, input: Value) -> LlmResponse {
        LlmResponse {
            model: CHAT_MODEL.into(),
            content: vec![ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: name.into(),
                input,
            }],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage {
                input_tokens: 200,
                output_tokens: 60,
            },
        }
    }

    fn ok_executor(content: &'static str) -> ToolExecutor {
        Box::new(move |_name, _input| {
            Box::pin(async move {
                Ok(ToolExecutionResult {
                    content: content.into(),
                    is_error: false,
                    is_malformed: false,
                })
            })
        })
    }

    fn config() -> TurnConfig {
        TurnConfig {
            max_rounds: 5,
            max_consecutive_malformed: 3,
        }
    }

    #[tokio::test]
    async fn test_plain_answer_skips_formatter() {
        let chat = MockLlm::new(vec![Ok(text_response(CHAT_MODEL, "Hello there."))]);
        let formatter = MockLlm::new(vec![]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "hi",
        )
        .await
        .unwrap();

        assert_eq!(report.outcome.answer(), Some("Hello there."));
        assert!(!report.used_tools);
        assert_eq!(report.stats.rounds, 1);
        assert_eq!(formatter.call_count(), 0);
        assert_eq!(transcript.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_roundtrip_runs_formatter() {
        let chat = MockLlm::new(vec![
            Ok(tool_use_response(
                "get_player_info",
                serde_json::json!({"DISPLAY_FIRST_LAST": "Klay Thompson"}),
            )),
            Ok(text_response(CHAT_MODEL, "Klay plays for GSW per the data.")),
        ]);
        let formatter = MockLlm::new(vec![Ok(text_response(
            FORMATTER_MODEL,
            "Klay Thompson plays for the Golden State Warriors.",
        ))]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor(r#"{"rows": [{"TEAM_ABBREVIATION": "GSW"}]}"#),
            &config(),
            &mut transcript,
            "What team does Klay Thompson play for?",
        )
        .await
        .unwrap();

        assert_eq!(
            report.outcome.answer(),
            Some("Klay Thompson plays for the Golden State Warriors.")
        );
        assert!(report.used_tools);
        assert_eq!(report.stats.rounds, 2);
        assert_eq!(report.stats.tool_calls, 1);
        assert_eq!(formatter.call_count(), 1);

        // user, assistant(tool_use), user(tool_result), assistant(draft),
        // assistant(formatted answer)
        assert_eq!(transcript.messages().len(), 5);
        assert!(transcript.tool_results_paired());
    }

    #[tokio::test]
    async fn test_all_tool_uses_in_one_response_are_executed() {
        let response = LlmResponse {
            model: CHAT_MODEL.into(),
            content: vec![
                ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_player_info".into(),
                    input: serde_json::json!({"DISPLAY_FIRST_LAST": "Klay Thompson"}),
                },
                ContentBlock::ToolUse {
                    id: "toolu_2".into(),
                    name: "get_league_titles".into(),
                    input: serde_json::json!({"TEAM_ID": "1610612744"}),
                },
            ],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        };

        let chat = MockLlm::new(vec![
            Ok(response),
            Ok(text_response(CHAT_MODEL, "draft")),
        ]);
        let formatter = MockLlm::new(vec![Ok(text_response(FORMATTER_MODEL, "final"))]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "question",
        )
        .await
        .unwrap();

        assert_eq!(report.stats.tool_calls, 2);
        assert!(transcript.tool_results_paired());
    }

    #[tokio::test]
    async fn test_provider_error_is_fatal() {
        let chat = MockLlm::new(vec![Err(LlmError::Auth("invalid key".into()))]);
        let formatter = MockLlm::new(vec![]);
        let mut transcript = Transcript::new();

        let err = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "question",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TurnError::Provider(LlmError::Auth(_))));
    }

    #[tokio::test]
    async fn test_unrecognized_tool_is_fatal() {
        let chat = MockLlm::new(vec![Ok(tool_use_response(
            "not_a_tool",
            serde_json::json!({}),
        ))]);
        let formatter = MockLlm::new(vec![]);
        let executor: ToolExecutor = Box::new(|name, _input| {
            Box::pin(async move { Err(ToolDispatchError::Unrecognized(name)) })
        });
        let mut transcript = Transcript::new();

        let err = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &executor,
            &config(),
            &mut transcript,
            "question",
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            TurnError::Tool(ToolDispatchError::Unrecognized(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_response_yields_no_answer() {
        let chat = MockLlm::new(vec![Ok(LlmResponse {
            model: CHAT_MODEL.into(),
            content: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })]);
        let formatter = MockLlm::new(vec![]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "question",
        )
        .await
        .unwrap();

        assert!(matches!(report.outcome, TurnOutcome::NoAnswer));
        assert!(report.outcome.answer().is_none());
    }

    #[tokio::test]
    async fn test_round_limit_enforced() {
        let responses: Vec<_> = (0..5)
            .map(|_| {
                Ok(tool_use_response(
                    "get_player_info",
                    serde_json::json!({"DISPLAY_FIRST_LAST": "Klay Thompson"}),
                ))
            })
            .collect();
        let chat = MockLlm::new(responses);
        let formatter = MockLlm::new(vec![]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &TurnConfig {
                max_rounds: 3,
                max_consecutive_malformed: 10,
            },
            &mut transcript,
            "question",
        )
        .await
        .unwrap();

        assert!(matches!(report.outcome, TurnOutcome::RoundLimitReached));
        assert_eq!(report.stats.rounds, 3);
    }

    #[tokio::test]
    async fn test_malformed_limit_enforced() {
        let responses: Vec<_> = (0..5)
            .map(|_| Ok(tool_use_response("get_league_titles", serde_json::json!({}))))
            .collect();
        let chat = MockLlm::new(responses);
        let formatter = MockLlm::new(vec![]);
        let executor: ToolExecutor = Box::new(|_name, _input| {
            Box::pin(async {
                Ok(ToolExecutionResult {
                    content: "Invalid arguments: missing field `TEAM_ID`".into(),
                    is_error: true,
                    is_malformed: true,
                })
            })
        });
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &executor,
            &TurnConfig {
                max_rounds: 10,
                max_consecutive_malformed: 2,
            },
            &mut transcript,
            "question",
        )
        .await
        .unwrap();

        assert!(matches!(report.outcome, TurnOutcome::MalformedToolCallLimit));
        // Results were still appended before the turn ended.
        assert!(transcript.tool_results_paired());
    }

    #[tokio::test]
    async fn test_cost_accumulates_across_calls_and_passes() {
        let chat = MockLlm::new(vec![
            Ok(tool_use_response(
                "get_player_info",
                serde_json::json!({"DISPLAY_FIRST_LAST": "Klay Thompson"}),
            )),
            Ok(text_response(CHAT_MODEL, "draft")),
        ]);
        let formatter = MockLlm::new(vec![Ok(text_response(FORMATTER_MODEL, "final"))]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "question",
        )
        .await
        .unwrap();

        assert_eq!(report.cost.calls().len(), 3);
        assert!(report.cost.total_usd() > 0.0);
        assert!(report.cost.calls().iter().all(|c| c.cost_usd.is_some()));
    }

    #[tokio::test]
    async fn test_unknown_model_id_does_not_fail_the_turn() {
        let chat = MockLlm::new(vec![Ok(text_response("mystery-model-v9", "Hello."))]);
        let formatter = MockLlm::new(vec![]);
        let mut transcript = Transcript::new();

        let report = run_turn(
            &chat,
            &formatter,
            "system",
            &[],
            &ok_executor("{}"),
            &config(),
            &mut transcript,
            "hi",
        )
        .await
        .unwrap();

        assert_eq!(report.outcome.answer(), Some("Hello."));
        assert!(report.cost.calls()[0].cost_usd.is_none());
        assert_eq!(report.cost.total_usd(), 0.0);
    }
}
