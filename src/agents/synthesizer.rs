// src/agents/synthesizer.rs

use super::Synthesizer;
use super::llm::{ChatMessage, LlmClient, LlmError};
use crate::protocol::Value;
use std::collections::BTreeMap;

/// Turns the accumulated results into a final prose answer. Receives the
/// full snapshot, failure sentinels included — accounting for unresolved
/// steps is the synthesizer's job, not the driver's.
pub struct LlmSynthesizer {
    client: LlmClient,
}

impl LlmSynthesizer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl Synthesizer for LlmSynthesizer {
    fn synthesize(
        &self,
        original_query: &str,
        results: &BTreeMap<String, Value>,
    ) -> Result<String, LlmError> {
        let serialized = serde_json::to_string(results)
            .map_err(|err| LlmError::Malformed(err.to_string()))?;

        let messages = [
            ChatMessage::system(
                "You are an expert communicator. Using the original query and a \
                 JSON dict of validated intermediate results, produce a clear, \
                 concise final answer.",
            ),
            ChatMessage::user(format!(
                "Original Query: {}\nFinal Results: {}\n\nFinal Answer:",
                original_query, serialized
            )),
        ];

        self.client.chat(&messages, None)
    }
}
