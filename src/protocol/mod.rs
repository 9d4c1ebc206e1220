// src/protocol/mod.rs

//! Shared data contract between the sandbox, the step runner and the driver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel recorded for a step that exhausted all refine attempts.
pub const FAILED_TO_REFINE: &str = "FAILED_TO_REFINE";

/// A value held in the context or produced by the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Value::Text(s) if s == FAILED_TO_REFINE)
    }

    /// Human-readable type name, used in sandbox fault diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral results print without a fractional part, the way the
            // critique prompt expects them ("14", not "14.0").
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Result of one sandbox evaluation: a computed value or an execution error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Error(String),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => write!(f, "{}", v),
            Outcome::Error(msg) => write!(f, "EXECUTION_ERROR: {}", msg),
        }
    }
}

/// Kind of work a plan step asks for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Calculation,
    DataLookup,
    FinalSynthesis,
    /// Anything else the decomposition invents; skipped, never an error.
    #[serde(untagged)]
    Unknown(String),
}

impl StepKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "calculation" => StepKind::Calculation,
            "data_lookup" => StepKind::DataLookup,
            "final_synthesis" => StepKind::FinalSynthesis,
            other => StepKind::Unknown(other.to_string()),
        }
    }

    /// Only calculation and data-lookup steps enter the refine loop.
    pub fn is_executable(&self) -> bool {
        matches!(self, StepKind::Calculation | StepKind::DataLookup)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Calculation => write!(f, "calculation"),
            StepKind::DataLookup => write!(f, "data_lookup"),
            StepKind::FinalSynthesis => write!(f, "final_synthesis"),
            StepKind::Unknown(other) => write!(f, "{}", other),
        }
    }
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Unique within a plan; keys the step's context entry.
    pub step_num: u32,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub description: String,
}

/// Ordered decomposition of a query. Sequence order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

/// Audit record of one generate/execute/critique cycle.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    /// 1-based attempt number within the step.
    pub attempt: u32,
    pub code: String,
    /// Stringified outcome, or `EXECUTION_ERROR: ...` text.
    pub output: String,
    pub feedback: String,
    #[serde(rename = "success")]
    pub accepted: bool,
}

/// A step together with its full attempt history.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    #[serde(flatten)]
    pub step: Step,
    pub attempts: Vec<AttemptRecord>,
}

/// Buffered result of solving one query.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub query: String,
    pub plan: Plan,
    pub steps: Vec<StepReport>,
    /// Final context snapshot, sentinels and scratch hints included.
    pub results: BTreeMap<String, Value>,
    pub final_answer: String,
}

/// Ordered progress events emitted while solving, for incremental rendering.
///
/// Serializes as `{"type": ..., "data": ...}` so a streaming consumer can
/// forward each event as-is; a blocking consumer just buffers the sequence.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SolverEvent {
    Plan(Vec<Step>),
    Attempt(AttemptEvent),
    FinalAnswer(String),
    Error(String),
    /// Stream terminator; always the last event, even after an error.
    Done,
}

/// Payload of [`SolverEvent::Attempt`].
#[derive(Debug, Clone, Serialize)]
pub struct AttemptEvent {
    #[serde(flatten)]
    pub step: Step,
    #[serde(flatten)]
    pub record: AttemptRecord,
}
