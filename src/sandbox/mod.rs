// src/sandbox/mod.rs

//! Strict sandbox for generated arithmetic snippets.
//!
//! A snippet is untrusted text from the code-generation collaborator. The
//! sandbox parses it against a closed arithmetic grammar (assignments,
//! variable reads, numeric literals, unary negation, `+ - * / // % **`) and
//! rejects anything else before evaluating a single node. Evaluation runs
//! against a shallow snapshot of the caller's scope and must leave its answer
//! in the `result` binding.

mod error;
mod lexer;
mod parser;

pub use error::SandboxError;

use crate::protocol::{Outcome, Value};
use parser::{Assign, BinOp, Expr};
use std::collections::BTreeMap;

/// The binding a snippet must assign its answer to.
pub const OUTPUT_BINDING: &str = "result";

/// Validate and evaluate one snippet against `scope`.
///
/// Never panics and never returns a raw error: every lexer, parser or
/// runtime fault is folded into [`Outcome::Error`]. Mutations apply to a
/// shallow copy of `scope`, so prior results are readable but not writable.
/// If the snippet never assigns `result`, the outcome is [`Value::Null`] —
/// "computed nothing", which is not an execution error.
pub fn evaluate(snippet: &str, scope: &BTreeMap<String, Value>) -> Outcome {
    match run(snippet, scope) {
        Ok(value) => Outcome::Value(value),
        Err(err) => Outcome::Error(err.to_string()),
    }
}

fn run(snippet: &str, scope: &BTreeMap<String, Value>) -> Result<Value, SandboxError> {
    let tokens = lexer::tokenize(snippet)?;
    let statements = parser::parse(&tokens)?;

    let mut env = scope.clone();
    env.insert(OUTPUT_BINDING.to_string(), Value::Null);

    for Assign { target, value } in &statements {
        let computed = eval_expr(value, &env)?;
        env.insert(target.clone(), computed);
    }

    Ok(env.remove(OUTPUT_BINDING).unwrap_or(Value::Null))
}

fn eval_expr(expr: &Expr, env: &BTreeMap<String, Value>) -> Result<Value, SandboxError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| SandboxError::UndefinedName(name.clone())),
        Expr::Neg(inner) => {
            let n = numeric(eval_expr(inner, env)?, "-")?;
            Ok(Value::Number(-n))
        }
        Expr::Binary { op, lhs, rhs } => {
            let a = numeric(eval_expr(lhs, env)?, op_symbol(*op))?;
            let b = numeric(eval_expr(rhs, env)?, op_symbol(*op))?;
            apply(*op, a, b).map(Value::Number)
        }
    }
}

fn numeric(value: Value, op: &'static str) -> Result<f64, SandboxError> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(SandboxError::TypeMismatch {
            op,
            operand: other.type_name(),
        }),
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::FloorDiv => "//",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
    }
}

fn apply(op: BinOp, a: f64, b: f64) -> Result<f64, SandboxError> {
    match op {
        BinOp::Add => Ok(a + b),
        BinOp::Sub => Ok(a - b),
        BinOp::Mul => Ok(a * b),
        BinOp::Div => {
            if b == 0.0 {
                return Err(SandboxError::DivisionByZero);
            }
            Ok(a / b)
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(SandboxError::DivisionByZero);
            }
            Ok((a / b).floor())
        }
        // Sign follows the divisor, matching the arithmetic the generator
        // was prompted for.
        BinOp::Mod => {
            if b == 0.0 {
                return Err(SandboxError::DivisionByZero);
            }
            Ok(a - b * (a / b).floor())
        }
        BinOp::Pow => Ok(a.powf(b)),
    }
}
