// src/runner/mod.rs

//! Bounded refine loop for a single plan step.
//!
//! Each attempt is one generate → execute → critique cycle. Execution errors
//! from the sandbox short-circuit the critique call (they are self-evidently
//! incorrect, so spending a remote call on them is wasted). Rejection
//! feedback is folded back into the context as retry hints for the next
//! generation call. A step that survives no attempt is recorded under the
//! `FAILED_TO_REFINE` sentinel and the plan moves on.

use crate::agents::{Critic, SnippetGenerator};
use crate::context::ContextStore;
use crate::protocol::{AttemptRecord, Outcome, Step};
use crate::sandbox;
use regex::Regex;

/// Maximum generate/execute/critique cycles per step.
pub const MAX_CRITIQUE_ATTEMPTS: u32 = 3;

/// Critique replies opening with this marker carry a numeric correction at
/// the end of the sentence.
const REJECTION_MARKER: &str = "Incorrect:";

pub struct StepRunner<'a, G, C> {
    generator: &'a G,
    critic: &'a C,
    query: &'a str,
}

impl<'a, G: SnippetGenerator, C: Critic> StepRunner<'a, G, C> {
    pub fn new(generator: &'a G, critic: &'a C, query: &'a str) -> Self {
        Self {
            generator,
            critic,
            query,
        }
    }

    /// Run the refine loop for `step`, reporting each attempt through
    /// `on_attempt` as it completes. On acceptance the step's value lands in
    /// `ctx`; on exhaustion the failure sentinel does. Returns the full
    /// attempt history either way.
    pub fn run(
        &self,
        step: &Step,
        ctx: &mut ContextStore,
        on_attempt: &mut dyn FnMut(&Step, &AttemptRecord),
    ) -> Vec<AttemptRecord> {
        let mut attempts = Vec::new();

        for attempt in 1..=MAX_CRITIQUE_ATTEMPTS {
            let code = match self.generator.generate(&step.description, ctx) {
                Ok(code) => code,
                Err(err) => {
                    // Inconclusive, not a rejection: retry without judging.
                    tracing::warn!(step = step.step_num, attempt, error = %err, "snippet generation failed");
                    let record = AttemptRecord {
                        attempt,
                        code: String::new(),
                        output: String::new(),
                        feedback: format!("Generation failed: {}", err),
                        accepted: false,
                    };
                    on_attempt(step, &record);
                    attempts.push(record);
                    continue;
                }
            };

            let outcome = sandbox::evaluate(&code, &ctx.snapshot());

            let feedback = if outcome.is_error() {
                format!("Execution failed: {}", outcome)
            } else {
                match self.critic.review(
                    &step.description,
                    &outcome.to_string(),
                    self.query,
                    &ctx.expected_values(),
                    &code,
                ) {
                    Ok(feedback) => feedback,
                    Err(err) => {
                        tracing::warn!(step = step.step_num, attempt, error = %err, "critique call failed");
                        format!("Critique failed: {}", err)
                    }
                }
            };

            let accepted = is_accepted(&feedback);
            let record = AttemptRecord {
                attempt,
                code,
                output: outcome.to_string(),
                feedback: feedback.clone(),
                accepted,
            };
            on_attempt(step, &record);
            attempts.push(record);

            if accepted {
                if let Outcome::Value(value) = outcome {
                    ctx.set_result(step.step_num, value);
                }
                return attempts;
            }

            ctx.set_feedback(feedback.clone());
            if feedback.starts_with(REJECTION_MARKER) {
                // Number-free feedback leaves any earlier correction in
                // place; the hint may then be stale.
                if let Some(correction) = extract_correction(&feedback) {
                    ctx.set_expected_correction(correction);
                }
            }
        }

        tracing::warn!(
            step = step.step_num,
            "failed to refine after {} attempts",
            MAX_CRITIQUE_ATTEMPTS
        );
        ctx.mark_failed(step.step_num);
        attempts
    }
}

/// Acceptance is judged purely by the leading token, case-insensitively.
fn is_accepted(feedback: &str) -> bool {
    feedback.to_lowercase().starts_with("correct")
}

/// Last decimal-or-integer token anywhere in the feedback — the critique
/// convention places the corrected value at the end of the sentence.
fn extract_correction(feedback: &str) -> Option<f64> {
    Regex::new(r"\d+(?:\.\d+)?")
        .unwrap()
        .find_iter(feedback)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::LlmError;
    use crate::protocol::{FAILED_TO_REFINE, StepKind, Value};
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, VecDeque};

    struct ScriptedGenerator {
        snippets: RefCell<VecDeque<&'static str>>,
    }

    impl ScriptedGenerator {
        fn new(snippets: &[&'static str]) -> Self {
            Self {
                snippets: RefCell::new(snippets.iter().copied().collect()),
            }
        }
    }

    impl SnippetGenerator for ScriptedGenerator {
        fn generate(&self, _desc: &str, _ctx: &ContextStore) -> Result<String, LlmError> {
            let snippet = self
                .snippets
                .borrow_mut()
                .pop_front()
                .expect("generator called more times than scripted");
            Ok(snippet.to_string())
        }
    }

    struct ScriptedCritic {
        replies: RefCell<VecDeque<&'static str>>,
        calls: Cell<u32>,
    }

    impl ScriptedCritic {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().copied().collect()),
                calls: Cell::new(0),
            }
        }
    }

    impl Critic for ScriptedCritic {
        fn review(
            &self,
            _desc: &str,
            _output: &str,
            _query: &str,
            _expected: &BTreeMap<String, Value>,
            _code: &str,
        ) -> Result<String, LlmError> {
            self.calls.set(self.calls.get() + 1);
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .expect("critic called more times than scripted");
            Ok(reply.to_string())
        }
    }

    fn step(num: u32) -> Step {
        Step {
            step_num: num,
            kind: StepKind::Calculation,
            description: "compute".into(),
        }
    }

    fn run(
        generator: &ScriptedGenerator,
        critic: &ScriptedCritic,
        ctx: &mut ContextStore,
    ) -> Vec<AttemptRecord> {
        StepRunner::new(generator, critic, "test query").run(&step(1), ctx, &mut |_, _| {})
    }

    #[test]
    fn acceptance_on_first_attempt_stops_the_loop() {
        let generator = ScriptedGenerator::new(&["result = 2 + 3 * 4"]);
        let critic = ScriptedCritic::new(&["Correct."]);
        let mut ctx = ContextStore::new();

        let attempts = run(&generator, &critic, &mut ctx);

        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].accepted);
        assert_eq!(ctx.result(1), Some(&Value::Number(14.0)));
        assert_eq!(critic.calls.get(), 1);
    }

    #[test]
    fn acceptance_is_case_insensitive() {
        let generator = ScriptedGenerator::new(&["result = 1"]);
        let critic = ScriptedCritic::new(&["correct, matches the query"]);
        let mut ctx = ContextStore::new();

        let attempts = run(&generator, &critic, &mut ctx);
        assert!(attempts[0].accepted);
    }

    #[test]
    fn exhaustion_records_the_sentinel() {
        let generator =
            ScriptedGenerator::new(&["result = 1", "result = 2", "result = 3"]);
        let critic = ScriptedCritic::new(&[
            "Incorrect: should be 10",
            "Incorrect: should be 10",
            "Incorrect: should be 10",
        ]);
        let mut ctx = ContextStore::new();

        let attempts = run(&generator, &critic, &mut ctx);

        assert_eq!(attempts.len(), 3);
        assert_eq!(ctx.result(1), Some(&Value::Text(FAILED_TO_REFINE.into())));
        assert_eq!(ctx.expected_correction(), Some(10.0));
    }

    #[test]
    fn execution_errors_bypass_the_critic() {
        let generator = ScriptedGenerator::new(&[
            "result = __import__('os').system('x')",
            "result = 1 / 0",
            "result = undefined_name",
        ]);
        let critic = ScriptedCritic::new(&[]);
        let mut ctx = ContextStore::new();

        let attempts = run(&generator, &critic, &mut ctx);

        assert_eq!(critic.calls.get(), 0);
        assert!(attempts.iter().all(|a| !a.accepted));
        assert!(attempts[0].feedback.starts_with("Execution failed:"));
        assert!(attempts[0].output.starts_with("EXECUTION_ERROR:"));
    }

    #[test]
    fn rejection_feedback_lands_in_context_for_the_next_attempt() {
        let generator = ScriptedGenerator::new(&["result = 11", "result = 12"]);
        let critic = ScriptedCritic::new(&["Incorrect: should be 12", "Correct."]);
        let mut ctx = ContextStore::new();

        run(&generator, &critic, &mut ctx);

        // Scratch hints keep the last rejection even after acceptance.
        assert_eq!(ctx.last_feedback(), Some("Incorrect: should be 12"));
        assert_eq!(ctx.expected_correction(), Some(12.0));
        assert_eq!(ctx.result(1), Some(&Value::Number(12.0)));
    }

    #[test]
    fn correction_takes_the_last_numeric_token() {
        assert_eq!(
            extract_correction("Incorrect: should be 42 not 41.5"),
            Some(41.5)
        );
        assert_eq!(extract_correction("Incorrect: no numbers here"), None);
    }

    #[test]
    fn number_free_rejection_keeps_the_previous_correction() {
        let generator = ScriptedGenerator::new(&["result = 1", "result = 2", "result = 3"]);
        let critic = ScriptedCritic::new(&[
            "Incorrect: should be 7",
            "Incorrect: wrong operand order",
            "Incorrect: still wrong",
        ]);
        let mut ctx = ContextStore::new();

        run(&generator, &critic, &mut ctx);

        assert_eq!(ctx.expected_correction(), Some(7.0));
    }

    #[test]
    fn feedback_without_rejection_marker_sets_no_correction() {
        let generator = ScriptedGenerator::new(&["result = 1", "result = 2", "result = 3"]);
        let critic = ScriptedCritic::new(&[
            "The value 5 looks off",
            "The value 6 looks off",
            "The value 7 looks off",
        ]);
        let mut ctx = ContextStore::new();

        run(&generator, &critic, &mut ctx);

        assert_eq!(ctx.expected_correction(), None);
        assert_eq!(ctx.last_feedback(), Some("The value 7 looks off"));
    }

    #[test]
    fn failing_generator_consumes_the_attempt_without_critique() {
        struct FailingGenerator;
        impl SnippetGenerator for FailingGenerator {
            fn generate(&self, _: &str, _: &ContextStore) -> Result<String, LlmError> {
                Err(LlmError::Malformed("no content".into()))
            }
        }

        let critic = ScriptedCritic::new(&[]);
        let mut ctx = ContextStore::new();
        let runner = StepRunner::new(&FailingGenerator, &critic, "q");
        let attempts = runner.run(&step(1), &mut ctx, &mut |_, _| {});

        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.feedback.starts_with("Generation failed:")));
        assert_eq!(critic.calls.get(), 0);
        assert_eq!(ctx.result(1), Some(&Value::Text(FAILED_TO_REFINE.into())));
    }
}
