//! Error types for cubegraph-moves.

use thiserror::Error;

/// Result type for move parsing and permutation operations.
pub type Result<T> = std::result::Result<T, MoveError>;

/// Errors that can occur while parsing moves or building permutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// A character that does not start or continue a move token.
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    /// A wide marker on a layer that has no wide variant.
    #[error("layer {0} has no wide variant")]
    WideSlice(char),

    /// A repeat count that does not fit in memory.
    #[error("invalid repeat count {digits:?} at offset {offset}")]
    InvalidRepeat { digits: String, offset: usize },

    /// A single-token string whose turns cancel out.
    #[error("{0:?} reduces to the identity")]
    IdentityToken(String),

    /// A string expected to hold exactly one token held zero or several.
    #[error("{0:?} is not a single move token")]
    NotSingleToken(String),

    /// A facelet array that is not a permutation of 0..54.
    #[error("invalid facelet permutation: {0}")]
    InvalidPermutation(String),
}
