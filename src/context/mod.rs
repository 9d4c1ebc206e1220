// src/context/mod.rs

//! Shared context threaded across a query's step processing.
//!
//! Two kinds of entries with different lifecycles live here, kept in
//! separate storage so they cannot be conflated:
//!
//! - permanent `step_{n}_result` entries, written once a step is accepted
//!   (or exhausted) and never rolled back;
//! - scratch retry hints (`last_feedback`, `expected_correction`),
//!   overwritten on every rejected attempt. They are only meaningful to the
//!   step currently retrying, but — matching the original behavior — they
//!   are not cleared when a step finishes, so a later step may still see
//!   them in its snapshot.

use crate::protocol::{FAILED_TO_REFINE, Value};
use std::collections::BTreeMap;

pub const LAST_FEEDBACK_KEY: &str = "last_feedback";
pub const EXPECTED_CORRECTION_KEY: &str = "expected_correction";

#[derive(Debug, Default, Clone)]
pub struct ContextStore {
    results: BTreeMap<String, Value>,
    last_feedback: Option<String>,
    expected_correction: Option<f64>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn result_key(step_num: u32) -> String {
        format!("step_{}_result", step_num)
    }

    /// Record the accepted value for a step.
    pub fn set_result(&mut self, step_num: u32, value: Value) {
        self.results.insert(Self::result_key(step_num), value);
    }

    /// Record that a step exhausted all attempts without acceptance.
    pub fn mark_failed(&mut self, step_num: u32) {
        self.results.insert(
            Self::result_key(step_num),
            Value::Text(FAILED_TO_REFINE.into()),
        );
    }

    pub fn result(&self, step_num: u32) -> Option<&Value> {
        self.results.get(&Self::result_key(step_num))
    }

    pub fn set_feedback(&mut self, feedback: String) {
        self.last_feedback = Some(feedback);
    }

    pub fn last_feedback(&self) -> Option<&str> {
        self.last_feedback.as_deref()
    }

    pub fn set_expected_correction(&mut self, value: f64) {
        self.expected_correction = Some(value);
    }

    pub fn expected_correction(&self) -> Option<f64> {
        self.expected_correction
    }

    /// Merged view handed to the sandbox, the generator and the synthesizer:
    /// all permanent results plus any scratch hints under their well-known
    /// keys.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut snapshot = self.results.clone();
        if let Some(feedback) = &self.last_feedback {
            snapshot.insert(LAST_FEEDBACK_KEY.into(), Value::Text(feedback.clone()));
        }
        if let Some(correction) = self.expected_correction {
            snapshot.insert(EXPECTED_CORRECTION_KEY.into(), Value::Number(correction));
        }
        snapshot
    }

    /// Trustworthy ground truth for the critic: every `step_{n}_result`
    /// entry that is not the failure sentinel, re-keyed as `step_{n}`.
    pub fn expected_values(&self) -> BTreeMap<String, Value> {
        self.results
            .iter()
            .filter(|(key, value)| {
                key.starts_with("step_") && key.ends_with("_result") && !value.is_sentinel()
            })
            .map(|(key, value)| {
                (key.trim_end_matches("_result").to_string(), value.clone())
            })
            .collect()
    }
}
