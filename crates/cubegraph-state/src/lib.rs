//! Cubegraph State Graph
//!
//! A deduplicated graph of cube states. Each state is a facelet permutation
//! reached from a single root; each edge is labelled by the move that turns
//! its source into its target.
//!
//! # Maintenance
//!
//! Turning a move from a state either creates a new state, reuses the edge
//! already joining the two states, or inserts a shortcut edge closing a
//! cycle. Shortcuts can only shorten distances, so they are followed by a
//! decrease-only worklist relaxation. Deleting a state or moving the root
//! recomputes distances from the root breadth-first. Either way, edges that
//! end up pointing toward the root are flipped and relabelled.
//!
//! # Usage
//!
//! ```
//! use cubegraph_state::{StateGraph, DEFAULT_MAX_PATHS};
//!
//! let mut graph = StateGraph::new();
//! let root = graph.root();
//! let turned = graph.apply_notation(root, "U").unwrap();
//! assert!(turned.created);
//!
//! let back = graph.apply_notation(turned.to, "U'").unwrap();
//! assert!(back.reversed);
//! assert_eq!(graph.path_to_root(turned.to, DEFAULT_MAX_PATHS).unwrap(), vec!["U'"]);
//! ```

mod data;
mod edge;
mod error;
mod graph;
mod state;

pub use data::{GraphData, LinkData, NodeData};
pub use edge::{EdgeKey, MoveEdge};
pub use error::{GraphError, LoadError, Result};
pub use graph::{MoveOutcome, Removal, StateGraph, DEFAULT_MAX_PATHS};
pub use state::{CubeState, StateId};
