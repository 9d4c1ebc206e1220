// src/agents/critic.rs

use super::Critic;
use super::llm::{ChatMessage, LlmClient, LlmError};
use crate::protocol::Value;
use std::collections::BTreeMap;

/// Audits one step's output. Replies either "Correct." or "Incorrect:"
/// followed by specific feedback; the step runner judges acceptance purely
/// by that leading token.
pub struct LlmCritic {
    client: LlmClient,
}

impl LlmCritic {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl Critic for LlmCritic {
    fn review(
        &self,
        step_description: &str,
        output: &str,
        original_query: &str,
        expected_values: &BTreeMap<String, Value>,
        code: &str,
    ) -> Result<String, LlmError> {
        let expected_context = if expected_values.is_empty() {
            String::new()
        } else {
            let serialized = serde_json::to_string(expected_values)
                .map_err(|err| LlmError::Malformed(err.to_string()))?;
            format!("\nExpected intermediate values from context: {}", serialized)
        };
        let code_context = if code.is_empty() {
            String::new()
        } else {
            format!("\nGenerated Code: {}", code)
        };

        let messages = [
            ChatMessage::system(
                "You are an AI auditor. Given a problem step, its output, the \
                 original query, any expected intermediate values, and the generated code, judge correctness. \
                 For numerical results: If the output is numerically incorrect, you MUST respond with 'Incorrect:' followed by the correct numerical value. \
                 For non-numerical results: If the logic or reasoning is flawed, respond with 'Incorrect:' followed by specific feedback. \
                 When code is provided, you can identify specific logical flaws in the implementation. \
                 Only respond 'Correct.' if the output is completely accurate. \
                 Be precise and unambiguous in your assessment.",
            ),
            ChatMessage::user(format!(
                "Original Query: {}\nStep: {}\nOutput: {}{}{}\n\nCritique:",
                original_query, step_description, output, code_context, expected_context
            )),
        ];

        self.client.chat(&messages, None)
    }
}
