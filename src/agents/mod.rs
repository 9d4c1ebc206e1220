// src/agents/mod.rs

//! Remote collaborators.
//!
//! Plan decomposition, snippet generation, output critique and final-answer
//! synthesis are all opaque calls to a remote reasoning service. Each role is
//! a trait so the runner and driver stay testable without a network; the
//! LLM-backed implementations share one [`LlmClient`].

pub mod critic;
pub mod decomposer;
pub mod generator;
pub mod llm;
pub mod synthesizer;

pub use critic::LlmCritic;
pub use decomposer::LlmDecomposer;
pub use generator::LlmSnippetGenerator;
pub use llm::{ChatMessage, LlmClient, LlmError};
pub use synthesizer::LlmSynthesizer;

use crate::context::ContextStore;
use crate::protocol::{Plan, Value};
use std::collections::BTreeMap;

/// Breaks a query into an ordered plan. A failure here is fatal for the query.
pub trait Decomposer {
    fn decompose(&self, query: &str) -> Result<Plan, LlmError>;
}

/// Produces an arithmetic snippet for one step. No contract on correctness —
/// the sandbox validates whatever comes back.
pub trait SnippetGenerator {
    fn generate(&self, step_description: &str, context: &ContextStore) -> Result<String, LlmError>;
}

/// Judges one step's output. The contract is purely textual: a reply whose
/// first word is "correct" (any case) is an acceptance, anything else is a
/// rejection.
pub trait Critic {
    fn review(
        &self,
        step_description: &str,
        output: &str,
        original_query: &str,
        expected_values: &BTreeMap<String, Value>,
        code: &str,
    ) -> Result<String, LlmError>;
}

/// Produces the final answer from the accumulated results, unresolved steps
/// included. A failure here is fatal for the query.
pub trait Synthesizer {
    fn synthesize(
        &self,
        original_query: &str,
        results: &BTreeMap<String, Value>,
    ) -> Result<String, LlmError>;
}
