//! Persisted graph format.
//!
//! A graph is stored as its root permutation plus the node and link lists.
//! Loading replays every link label breadth-first from the root, so the
//! stored permutations of non-root states are never trusted.

use std::collections::{HashMap, HashSet, VecDeque};

use cubegraph_moves::{Facelets, MoveToken};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::edge::MoveEdge;
use crate::error::{LoadError, Result};
use crate::graph::StateGraph;
use crate::state::StateId;

/// Serializable snapshot of a whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub root_permutation: Vec<u8>,
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: u64,
    pub is_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub source: u64,
    pub target: u64,
    /// Single move token leading from source to target
    pub path: String,
}

/// Permutations bound to persisted node ids, in replay order.
struct Replay {
    nodes: Vec<(u64, Facelets)>,
    labels: Vec<MoveToken>,
}

impl StateGraph {
    /// Mirror the live graph into its persisted form.
    pub fn to_data(&self) -> GraphData {
        let root_permutation = self
            .state(self.root())
            .map(|root| root.permutation().as_slice().to_vec())
            .unwrap_or_default();

        GraphData {
            root_permutation,
            nodes: self
                .states()
                .map(|state| NodeData {
                    id: state.id().0,
                    is_root: state.is_root(),
                })
                .collect(),
            links: self
                .edges()
                .map(|edge| LinkData {
                    source: edge.source().0,
                    target: edge.target().0,
                    path: edge.label().to_string(),
                })
                .collect(),
        }
    }

    /// Rebuild a graph from persisted data, numbering states from `first_id`.
    ///
    /// Nothing is built unless every node and link replays cleanly.
    /// Distances and edge directions are recomputed rather than trusted.
    pub fn from_data(data: &GraphData, first_id: u64) -> Result<Self> {
        let replay = replay(data)?;

        let mut nodes = replay.nodes.into_iter();
        let Some((root_node, root_permutation)) = nodes.next() else {
            return Err(LoadError::MissingRoot.into());
        };

        let mut graph = StateGraph::with_root(root_permutation, first_id);
        let mut ids = HashMap::from([(root_node, graph.root())]);
        for (node, permutation) in nodes {
            ids.insert(node, graph.insert_state(permutation, None));
        }

        for (link, label) in data.links.iter().zip(replay.labels) {
            if let (Some(&source), Some(&target)) = (ids.get(&link.source), ids.get(&link.target)) {
                graph.insert_edge(MoveEdge::new(source, target, label));
            }
        }
        graph.reindex();

        info!(
            states = graph.state_count(),
            edges = graph.edge_count(),
            root = %graph.root(),
            "graph loaded"
        );
        Ok(graph)
    }
}

/// Validate `data` and derive every node's permutation from the root.
fn replay(data: &GraphData) -> std::result::Result<Replay, LoadError> {
    let root_permutation =
        Facelets::from_slice(&data.root_permutation).map_err(LoadError::InvalidRootPermutation)?;

    let mut known = HashSet::new();
    let mut root = None;
    for node in &data.nodes {
        if !known.insert(node.id) {
            return Err(LoadError::DuplicateNode(node.id));
        }
        if node.is_root && root.replace(node.id).is_some() {
            return Err(LoadError::MultipleRoots);
        }
    }
    let root = root.ok_or(LoadError::MissingRoot)?;

    let mut pairs = HashSet::new();
    let mut labels = Vec::with_capacity(data.links.len());
    let mut adjacency: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, link) in data.links.iter().enumerate() {
        let (from, to) = (link.source, link.target);
        if !known.contains(&from) || !known.contains(&to) {
            return Err(LoadError::DanglingLink { from, to });
        }
        if !pairs.insert((from.min(to), from.max(to))) {
            return Err(LoadError::DuplicateLink { from, to });
        }
        let label: MoveToken = link.path.parse().map_err(|error| LoadError::InvalidPath {
            path: link.path.clone(),
            error,
        })?;
        labels.push(label);
        adjacency.entry(from).or_default().push(i);
        adjacency.entry(to).or_default().push(i);
    }

    // Links are followed in either direction; the inverse label leads back.
    let mut bound = HashMap::from([(root, root_permutation)]);
    let mut owners = HashSet::from([root_permutation]);
    let mut order = vec![(root, root_permutation)];
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        let Some(&here) = bound.get(&node) else {
            continue;
        };
        for &i in adjacency.get(&node).map(Vec::as_slice).unwrap_or_default() {
            let (link, label) = (&data.links[i], labels[i]);
            let (other, reached) = if link.source == node {
                (link.target, here.apply(label))
            } else {
                (link.source, here.apply(label.inverse()))
            };

            match bound.get(&other) {
                Some(&existing) if existing != reached => {
                    return Err(LoadError::ReplayMismatch {
                        from: link.source,
                        to: link.target,
                        path: link.path.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    if !owners.insert(reached) {
                        return Err(LoadError::DuplicatePermutation { node: other });
                    }
                    bound.insert(other, reached);
                    order.push((other, reached));
                    queue.push_back(other);
                }
            }
        }
    }

    if let Some(node) = data.nodes.iter().find(|node| !bound.contains_key(&node.id)) {
        return Err(LoadError::UnreachableNode(node.id));
    }

    Ok(Replay {
        nodes: order,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    fn link(source: u64, target: u64, path: &str) -> LinkData {
        LinkData {
            source,
            target,
            path: path.to_string(),
        }
    }

    fn node(id: u64, is_root: bool) -> NodeData {
        NodeData { id, is_root }
    }

    fn chain() -> GraphData {
        GraphData {
            root_permutation: Facelets::IDENTITY.as_slice().to_vec(),
            nodes: vec![node(3, true), node(5, false), node(9, false)],
            links: vec![link(3, 5, "U"), link(5, 9, "R")],
        }
    }

    fn load_error(data: &GraphData) -> LoadError {
        match StateGraph::from_data(data, 0) {
            Err(GraphError::LoadFormat(error)) => error,
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn loads_and_renumbers() {
        let graph = StateGraph::from_data(&chain(), 100).unwrap();
        assert_eq!(graph.root(), StateId(100));
        assert_eq!(graph.state_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.next_id(), 103);
        let far = Facelets::IDENTITY.apply("U".parse().unwrap()).apply("R".parse().unwrap());
        let id = graph.find(&far).unwrap();
        assert_eq!(graph.state(id).unwrap().distance(), Some(2));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn links_replay_against_their_direction() {
        let mut data = chain();
        data.links[1] = link(9, 5, "R'");
        let graph = StateGraph::from_data(&data, 0).unwrap();
        assert_eq!(graph.state_count(), 3);
        // Reoriented away from the root with the label inverted
        let edge = graph.edge_between(StateId(1), StateId(2)).unwrap();
        assert_eq!(edge.source(), StateId(1));
        assert_eq!(edge.label().to_string(), "R");
        graph.check_invariants().unwrap();
    }

    #[test]
    fn non_identity_root_is_kept() {
        let root = Facelets::IDENTITY.apply("F".parse().unwrap());
        let mut data = chain();
        data.root_permutation = root.as_slice().to_vec();
        let graph = StateGraph::from_data(&data, 0).unwrap();
        assert_eq!(*graph.state(graph.root()).unwrap().permutation(), root);
    }

    #[test]
    fn rejects_bad_root_permutation() {
        let mut data = chain();
        data.root_permutation = vec![0; 54];
        assert!(matches!(load_error(&data), LoadError::InvalidRootPermutation(_)));
    }

    #[test]
    fn rejects_root_count_problems() {
        let mut data = chain();
        data.nodes[0].is_root = false;
        assert_eq!(load_error(&data), LoadError::MissingRoot);

        let mut data = chain();
        data.nodes[1].is_root = true;
        assert_eq!(load_error(&data), LoadError::MultipleRoots);
    }

    #[test]
    fn rejects_structural_problems() {
        let mut data = chain();
        data.nodes.push(node(5, false));
        assert_eq!(load_error(&data), LoadError::DuplicateNode(5));

        let mut data = chain();
        data.links.push(link(9, 42, "F"));
        assert_eq!(load_error(&data), LoadError::DanglingLink { from: 9, to: 42 });

        let mut data = chain();
        data.links.push(link(5, 3, "U'"));
        assert_eq!(load_error(&data), LoadError::DuplicateLink { from: 5, to: 3 });
    }

    #[test]
    fn rejects_bad_paths() {
        let mut data = chain();
        data.links[0].path = "UR".to_string();
        assert!(matches!(load_error(&data), LoadError::InvalidPath { .. }));
    }

    #[test]
    fn rejects_inconsistent_replay() {
        // 3 -U-> 5 -U'-> 9 would put 9 on the root's permutation.
        let mut data = chain();
        data.links[1].path = "U'".to_string();
        assert_eq!(load_error(&data), LoadError::DuplicatePermutation { node: 9 });

        // A cycle whose labels do not close
        let mut data = chain();
        data.links.push(link(3, 9, "F"));
        assert!(matches!(load_error(&data), LoadError::ReplayMismatch { .. }));
    }

    #[test]
    fn rejects_unreachable_nodes() {
        let mut data = chain();
        data.nodes.push(node(77, false));
        assert_eq!(load_error(&data), LoadError::UnreachableNode(77));
    }

    #[test]
    fn failed_load_builds_nothing() {
        let mut data = chain();
        data.links.push(link(3, 9, "F"));
        assert!(StateGraph::from_data(&data, 0).is_err());
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(chain()).unwrap();
        assert_eq!(json["nodes"][0]["is_root"], true);
        assert_eq!(json["links"][1]["path"], "R");
        assert_eq!(json["root_permutation"].as_array().unwrap().len(), 54);
    }
}
