//! Error types for expression parsing and evaluation.

use thiserror::Error;

/// Expression error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Malformed expression source.
    #[error("parse error: {0}")]
    Parse(String),

    /// A named definition refers to itself, directly or through other definitions.
    #[error("invalid definition: {0}")]
    Definition(String),

    /// Evaluation referenced a symbol that is not bound.
    #[error("unbound symbol: '{0}'")]
    UnboundSymbol(String),

    /// Operation applied to a column of the wrong kind.
    #[error("type error: {0}")]
    Type(String),

    /// Two operands have incompatible lengths (neither is broadcastable).
    #[error("length mismatch: {left} vs {right}")]
    Length {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, ExprError>;
