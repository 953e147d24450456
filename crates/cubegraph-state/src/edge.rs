//! Move edges between cube states.

use std::fmt;

use cubegraph_moves::MoveToken;
use serde::{Deserialize, Serialize};

use crate::state::StateId;

/// Unordered pair of state ids. At most one edge exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    low: StateId,
    high: StateId,
}

impl EdgeKey {
    /// Key for the pair, in either order.
    pub fn new(a: StateId, b: StateId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> StateId {
        self.low
    }

    pub fn high(&self) -> StateId {
        self.high
    }

    /// Whether `id` is one of the two endpoints.
    pub fn contains(&self, id: StateId) -> bool {
        self.low == id || self.high == id
    }

    /// The endpoint opposite `id`.
    pub fn other(&self, id: StateId) -> Option<StateId> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// A directed, relabelable connection between two states.
///
/// `label` turned from `source` always yields `target`. Flipping swaps the
/// endpoints and inverts the label together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEdge {
    key: EdgeKey,
    label: MoveToken,
    source: StateId,
    target: StateId,
    active: bool,
    /// Signed percentage: positive while travelling source to target
    progress: f64,
}

impl MoveEdge {
    pub(crate) fn new(source: StateId, target: StateId, label: MoveToken) -> Self {
        Self {
            key: EdgeKey::new(source, target),
            label,
            source,
            target,
            active: false,
            progress: 0.0,
        }
    }

    pub fn key(&self) -> EdgeKey {
        self.key
    }

    pub fn label(&self) -> MoveToken {
        self.label
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn target(&self) -> StateId {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The move that travels this edge starting at `from`, if `from` is an endpoint.
    pub fn move_from(&self, from: StateId) -> Option<MoveToken> {
        if from == self.source {
            Some(self.label)
        } else if from == self.target {
            Some(self.label.inverse())
        } else {
            None
        }
    }

    /// Swap endpoints and invert the label.
    pub(crate) fn flip(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
        self.label = self.label.inverse();
        self.progress = -self.progress;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
        self.progress = 0.0;
    }

    pub(crate) fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(-100.0, 100.0);
    }
}
