//! Cube states: one permutation snapshot plus root/distance bookkeeping.

use std::collections::BTreeSet;
use std::fmt;

use cubegraph_moves::{Facelets, MoveToken};
use serde::{Deserialize, Serialize};

use crate::edge::EdgeKey;

/// Stable state identifier. Monotonic within a graph, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the state graph.
///
/// Only `distance` and the root flag change after creation, and only the
/// owning graph changes them.
#[derive(Debug, Clone)]
pub struct CubeState {
    id: StateId,
    permutation: Facelets,
    is_root: bool,
    /// `None` while unreachable from the root
    distance: Option<u32>,
    /// Keys of incident edges
    pub(crate) edges: BTreeSet<EdgeKey>,
}

impl CubeState {
    pub(crate) fn new(id: StateId, permutation: Facelets, distance: Option<u32>) -> Self {
        Self {
            id,
            permutation,
            is_root: false,
            distance,
            edges: BTreeSet::new(),
        }
    }

    pub(crate) fn root(id: StateId, permutation: Facelets) -> Self {
        Self {
            is_root: true,
            ..Self::new(id, permutation, Some(0))
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn permutation(&self) -> &Facelets {
        &self.permutation
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Moves from the root, `None` if unreachable.
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Keys of the edges touching this state, in key order.
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.iter().copied()
    }

    /// Number of incident edges.
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// The permutation reached by turning `token` from here.
    pub fn apply(&self, token: MoveToken) -> Facelets {
        self.permutation.apply(token)
    }

    /// Dedup predicate: equal facelet arrays, regardless of id.
    pub fn same_permutation(&self, other: &CubeState) -> bool {
        self.permutation == other.permutation
    }

    pub(crate) fn set_root(&mut self, is_root: bool) {
        self.is_root = is_root;
    }

    pub(crate) fn set_distance(&mut self, distance: Option<u32>) {
        self.distance = distance;
    }
}
