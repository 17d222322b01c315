//! Error types for histogram construction, plan compilation and filling.

use hb_expr::ExprError;
use thiserror::Error;

/// Histogram engine error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A histogram was constructed without any axis.
    #[error("histogram must have at least one axis")]
    EmptyHistogram,

    /// Constructor options contained unknown keys.
    #[error("unrecognized option(s) for histogram: {0}")]
    UnrecognizedOption(String),

    /// The plan compiler could not trace a goal back to an allowed input.
    #[error("unresolved goal: {0}")]
    UnresolvedGoal(String),

    /// A fill batch lacks a column the plan needs.
    #[error("missing column: '{0}'")]
    MissingColumn(String),

    /// A book entry is neither a histogram nor a book.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A batch column does not match the batch length and is not broadcastable.
    #[error("length mismatch for column '{column}': expected {expected}, found {found}")]
    LengthMismatch {
        /// Column name.
        column: String,
        /// Batch length.
        expected: usize,
        /// Column length.
        found: usize,
    },

    /// Axis parameters are out of their valid domain.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// Expression parse or evaluation error.
    #[error(transparent)]
    Expression(#[from] ExprError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
