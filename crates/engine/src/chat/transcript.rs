use serde_json::Value;

use crate::llm::types::{ContentBlock, Message, Role};

/// The conversation transcript for one session.
///
/// An explicit context object: the orchestrator appends to it during a turn,
/// the session manager owns its lifecycle (created with the session, dropped
/// on session reset). Append-only — messages are never edited or removed.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user_text(text));
    }

    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) {
        self.messages.push(Message {
            role: Role::Assistant,
            content,
        });
    }

    pub fn push_assistant_text(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant_text(text));
    }

    /// Append one user message answering tool calls, one tool_result block
    /// per tool_use of the preceding assistant message.
    pub fn push_tool_results(&mut self, results: Vec<ContentBlock>) {
        self.messages.push(Message {
            role: Role::User,
            content: results,
        });
    }

    /// Render for the provider API: adjacent same-role messages are merged,
    /// since the stored transcript may carry a draft and a formatted answer
    /// as two consecutive assistant messages while the wire format requires
    /// strict role alternation.
    pub fn wire_messages(&self) -> Vec<Message> {
        let mut wire: Vec<Message> = Vec::with_capacity(self.messages.len());

        for msg in &self.messages {
            match wire.last_mut() {
                Some(prev) if prev.role == msg.role => {
                    prev.content.extend(msg.content.iter().cloned());
                }
                _ => wire.push(msg.clone()),
            }
        }

        wire
    }

    /// Whether every tool_use block is answered by exactly one tool_result
    /// (matching id) in the immediately following user-role message.
    pub fn tool_results_paired(&self) -> bool {
        for (i, msg) in self.messages.iter().enumerate() {
            if msg.role != Role::Assistant {
                continue;
            }

            let mut pending: Vec<&str> = msg
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                    _ => None,
                })
                .collect();

            if pending.is_empty() {
                continue;
            }

            let Some(next) = self.messages.get(i + 1) else {
                // Trailing unanswered tool_use: legal only because nothing
                // follows it yet (a turn that aborted mid-flight).
                return true;
            };

            if next.role != Role::User {
                return false;
            }

            for block in &next.content {
                let ContentBlock::ToolResult { tool_use_id, .. } = block else {
                    return false;
                };
                let Some(pos) = pending.iter().position(|id| *id == tool_use_id) else {
                    return false;
                };
                pending.remove(pos);
            }

            if !pending.is_empty() {
                return false;
            }
        }

        true
    }

    /// Serialize the stored messages verbatim (debug transcript dump).
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.messages).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.into(),
            name: "get_player_info".into(),
            input: json!({"DISPLAY_FIRST_LAST": "Klay Thompson"}),
        }
    }

    fn tool_result(id: &str) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: id.into(),
            content: r#"{"rows": []}"#.into(),
            is_error: None,
        }
    }

    #[test]
    fn test_paired_transcript_is_well_formed() {
        let mut t = Transcript::new();
        t.push_user_text("What team does Klay Thompson play for?");
        t.push_assistant(vec![tool_use("toolu_1")]);
        t.push_tool_results(vec![tool_result("toolu_1")]);
        t.push_assistant(vec![ContentBlock::Text {
            text: "He plays for the Warriors.".into(),
        }]);

        assert!(t.tool_results_paired());
    }

    #[test]
    fn test_missing_tool_result_is_detected() {
        let mut t = Transcript::new();
        t.push_user_text("question");
        t.push_assistant(vec![tool_use("toolu_1"), tool_use("toolu_2")]);
        t.push_tool_results(vec![tool_result("toolu_1")]);
        t.push_assistant(vec![ContentBlock::Text { text: "answer".into() }]);

        assert!(!t.tool_results_paired());
    }

    #[test]
    fn test_duplicate_tool_result_is_detected() {
        let mut t = Transcript::new();
        t.push_user_text("question");
        t.push_assistant(vec![tool_use("toolu_1")]);
        t.push_tool_results(vec![tool_result("toolu_1"), tool_result("toolu_1")]);

        assert!(!t.tool_results_paired());
    }

    #[test]
    fn test_wire_messages_coalesce_adjacent_assistant_messages() {
        let mut t = Transcript::new();
        t.push_user_text("question");
        t.push_assistant(vec![ContentBlock::Text { text: "draft".into() }]);
        t.push_assistant_text("formatted answer");

        let wire = t.wire_messages();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1].role, Role::Assistant);
        assert_eq!(wire[1].content.len(), 2);

        // The stored transcript keeps both messages distinct.
        assert_eq!(t.messages().len(), 3);
    }

    #[test]
    fn test_wire_messages_keep_alternating_transcript_as_is() {
        let mut t = Transcript::new();
        t.push_user_text("question");
        t.push_assistant(vec![tool_use("toolu_1")]);
        t.push_tool_results(vec![tool_result("toolu_1")]);

        assert_eq!(t.wire_messages().len(), 3);
    }
}
