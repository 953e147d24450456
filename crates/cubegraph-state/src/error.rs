//! Error types for cubegraph-state.

use cubegraph_moves::MoveError;
use thiserror::Error;

use crate::edge::EdgeKey;
use crate::state::StateId;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while mutating or querying a state graph.
///
/// Every rejected operation leaves the graph untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid move token: {0}")]
    InvalidMoveToken(#[from] MoveError),

    #[error("unknown state {0}")]
    UnknownState(StateId),

    #[error("unknown edge {0}")]
    UnknownEdge(EdgeKey),

    #[error("state {0} is the root and cannot be deleted")]
    RootDeletionRejected(StateId),

    #[error("edge {0} is mid-transition")]
    ActiveTransitionConflict(EdgeKey),

    #[error("state {state} is not the required endpoint of edge {edge}")]
    WrongEndpoint { state: StateId, edge: EdgeKey },

    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),

    #[error("load failed: {0}")]
    LoadFormat(#[from] LoadError),
}

/// Reasons a persisted graph is rejected.
///
/// Node ids here are the ids of the persisted data, not live state ids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("invalid root permutation: {0}")]
    InvalidRootPermutation(#[source] MoveError),

    #[error("no node is marked as root")]
    MissingRoot,

    #[error("more than one node is marked as root")]
    MultipleRoots,

    #[error("node {0} is listed twice")]
    DuplicateNode(u64),

    #[error("link {from}-{to} references an unknown node")]
    DanglingLink { from: u64, to: u64 },

    #[error("link {from}-{to} is listed twice")]
    DuplicateLink { from: u64, to: u64 },

    #[error("link path {path:?} is not a single move: {error}")]
    InvalidPath {
        path: String,
        #[source]
        error: MoveError,
    },

    #[error("link {from}-{to} labelled {path:?} does not connect its endpoints")]
    ReplayMismatch { from: u64, to: u64, path: String },

    #[error("node {node} replays to a permutation already bound to another node")]
    DuplicatePermutation { node: u64 },

    #[error("node {0} is not reachable from the root")]
    UnreachableNode(u64),
}
