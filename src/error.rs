//! Error types for the assignment engine.

use thiserror::Error;

/// Failures that abort a solve. There is no partial result.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Raw cost input could not be turned into a cost matrix
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The score provider produced NaN or an infinity
    #[error("Score provider returned non-finite value {value} for pair ({row}, {col})")]
    ScoreProvider { row: usize, col: usize, value: f64 },

    /// The matrix reached a state the algorithm can never produce
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type Result<T> = std::result::Result<T, AssignmentError>;
