//! Unified error model for the query front end and planner.
//! Every failure a statement can hit is one of a closed set of kinds; hooks and
//! planner phases return their error immediately and no partial recovery happens
//! within a statement. Store failures are surfaced unmodified, annotated with the
//! operation that hit them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognised rune sequence or unterminated string in the source text.
    #[error("lex error at {line}:{col}: {message}")]
    Lex { line: usize, col: usize, message: String },

    /// Grammar mismatch, not-left-factored grammar, or unexpected token.
    #[error("parse error at {line}:{col} near '{token}': {message}")]
    Parse { line: usize, col: usize, token: String, message: String },

    /// A semantic hook rejected the statement under construction.
    #[error("semantic error: {0}")]
    SemanticHook(String),

    /// Malformed node/predicate/literal/triple text.
    #[error("invalid primitive text: {0}")]
    PrimitiveParse(String),

    /// The expression builder could not produce an evaluator.
    #[error("cannot build evaluator: {0}")]
    ExprBuild(String),

    /// Row evaluation failed (missing binding, type-incompatible comparison).
    #[error("evaluation error: {0}")]
    ExprEval(String),

    /// Store failure, annotated with the operation that was in flight.
    #[error("store error during {op}: {source}")]
    Store {
        op: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    Timeout,
}

impl Error {
    pub fn semantic<S: Into<String>>(msg: S) -> Self { Error::SemanticHook(msg.into()) }
    pub fn primitive<S: Into<String>>(msg: S) -> Self { Error::PrimitiveParse(msg.into()) }
    pub fn expr_build<S: Into<String>>(msg: S) -> Self { Error::ExprBuild(msg.into()) }
    pub fn expr_eval<S: Into<String>>(msg: S) -> Self { Error::ExprEval(msg.into()) }

    pub fn store<S: Into<String>>(op: S, source: anyhow::Error) -> Self {
        Error::Store { op: op.into(), source }
    }

    /// Stable kind tag, mostly for logs and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Lex { .. } => "lex",
            Error::Parse { .. } => "parse",
            Error::SemanticHook(_) => "semantic_hook",
            Error::PrimitiveParse(_) => "primitive_parse",
            Error::ExprBuild(_) => "expr_build",
            Error::ExprEval(_) => "expr_eval",
            Error::Store { .. } => "store",
            Error::Cancelled => "cancelled",
            Error::Timeout => "timeout",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
