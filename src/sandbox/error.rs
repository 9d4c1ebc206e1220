// src/sandbox/error.rs

/// Everything that can go wrong inside the sandbox. All variants are folded
/// into an execution-error [`Outcome`](crate::protocol::Outcome) by
/// [`evaluate`](super::evaluate); none escape to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    /// The snippet used syntax outside the arithmetic allow-list.
    #[error("disallowed syntax: {0}")]
    Disallowed(&'static str),

    /// The snippet is malformed even within the allowed grammar.
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name `{0}` is not defined")]
    UndefinedName(String),

    #[error("unsupported operand type for `{op}`: {operand}")]
    TypeMismatch { op: &'static str, operand: &'static str },

    #[error("division by zero")]
    DivisionByZero,
}
