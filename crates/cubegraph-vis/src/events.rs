//! Engine events and graph snapshots for the presentation layer.

use cubegraph_moves::{Facelets, MoveToken};
use cubegraph_state::{EdgeKey, StateGraph, StateId};
use serde::{Deserialize, Serialize};

/// Something the presentation layer should react to.
///
/// `frame` is the explorer's tick count when the event happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A new permutation was reached
    StateCreated {
        state: StateId,
        distance: Option<u32>,
        frame: u64,
    },

    /// A new edge was inserted, either to a new state or as a shortcut
    EdgeCreated {
        edge: EdgeKey,
        source: StateId,
        target: StateId,
        label: MoveToken,
        frame: u64,
    },

    /// Distance maintenance reversed an edge
    EdgeFlipped {
        edge: EdgeKey,
        source: StateId,
        label: MoveToken,
        frame: u64,
    },

    /// A move began animating
    TransitionStarted {
        edge: EdgeKey,
        from: StateId,
        to: StateId,
        token: MoveToken,
        frame: u64,
    },

    /// A move finished; `to` is now the current state
    TransitionCompleted {
        edge: EdgeKey,
        to: StateId,
        frame: u64,
    },

    /// A deletion removed these states and edges
    StatesRemoved {
        states: Vec<StateId>,
        edges: Vec<EdgeKey>,
        frame: u64,
    },

    RootChanged {
        from: StateId,
        to: StateId,
        frame: u64,
    },

    /// The whole graph was replaced from persisted data
    GraphLoaded {
        root: StateId,
        states: usize,
        edges: usize,
        frame: u64,
    },

    /// The graph was replaced by a fresh root
    GraphReset { root: StateId, frame: u64 },
}

impl EngineEvent {
    /// Get the frame number for this event.
    pub fn frame(&self) -> u64 {
        match self {
            EngineEvent::StateCreated { frame, .. }
            | EngineEvent::EdgeCreated { frame, .. }
            | EngineEvent::EdgeFlipped { frame, .. }
            | EngineEvent::TransitionStarted { frame, .. }
            | EngineEvent::TransitionCompleted { frame, .. }
            | EngineEvent::StatesRemoved { frame, .. }
            | EngineEvent::RootChanged { frame, .. }
            | EngineEvent::GraphLoaded { frame, .. }
            | EngineEvent::GraphReset { frame, .. } => *frame,
        }
    }
}

/// One state as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub id: StateId,
    pub distance: Option<u32>,
    pub is_root: bool,
    pub is_current: bool,
    pub permutation: Facelets,
}

/// One edge as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub key: EdgeKey,
    pub source: StateId,
    pub target: StateId,
    pub label: MoveToken,
    pub active: bool,
    pub progress: f64,
}

/// The graph at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub frame: u64,
    pub root: StateId,
    pub current: StateId,
    pub states: Vec<StateView>,
    pub edges: Vec<EdgeView>,
    pub state_count: usize,
    pub edge_count: usize,
    pub max_distance: u32,
}

impl GraphSnapshot {
    /// Capture every state and edge of `graph`.
    pub fn from_graph(graph: &StateGraph, current: StateId, frame: u64) -> Self {
        let states: Vec<StateView> = graph
            .states()
            .map(|state| StateView {
                id: state.id(),
                distance: state.distance(),
                is_root: state.is_root(),
                is_current: state.id() == current,
                permutation: *state.permutation(),
            })
            .collect();

        let edges: Vec<EdgeView> = graph
            .edges()
            .map(|edge| EdgeView {
                key: edge.key(),
                source: edge.source(),
                target: edge.target(),
                label: edge.label(),
                active: edge.is_active(),
                progress: edge.progress(),
            })
            .collect();

        let max_distance = states.iter().filter_map(|s| s.distance).max().unwrap_or(0);

        GraphSnapshot {
            frame,
            root: graph.root(),
            current,
            state_count: states.len(),
            edge_count: edges.len(),
            states,
            edges,
            max_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = EngineEvent::EdgeCreated {
            edge: EdgeKey::new(StateId(0), StateId(1)),
            source: StateId(0),
            target: StateId(1),
            label: "Rw'".parse().unwrap(),
            frame: 100,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("EdgeCreated"));
        assert!(json.contains("Rw'"));

        let parsed: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.frame(), 100);
    }

    #[test]
    fn snapshot_of_small_graph() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let first = graph.apply_notation(root, "U").unwrap();
        graph.apply_notation(first.to, "R").unwrap();

        let snap = GraphSnapshot::from_graph(&graph, first.to, 7);
        assert_eq!(snap.frame, 7);
        assert_eq!(snap.state_count, 3);
        assert_eq!(snap.edge_count, 2);
        assert_eq!(snap.max_distance, 2);
        assert!(snap.states.iter().any(|s| s.is_current && s.id == first.to));
        assert!(snap.states.iter().any(|s| s.is_root && s.permutation.is_identity()));
        assert_eq!(snap.edges[0].label.to_string(), "U");
    }
}
