//! The state graph.
//!
//! States live in an arena keyed by [`StateId`]; edges refer to their
//! endpoints by id and are keyed by the unordered pair. After every public
//! mutation the graph holds:
//!
//! - exactly one root, at distance 0
//! - no two states with the same permutation
//! - every distance equal to the BFS distance from the root
//! - `source.distance <= target.distance` for every edge, with the label
//!   leading from source to target

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use cubegraph_moves::{reverse, Facelets, MoveError, MoveSequence, MoveToken};
use tracing::{debug, info, warn};

use crate::edge::{EdgeKey, MoveEdge};
use crate::error::{GraphError, Result};
use crate::state::{CubeState, StateId};

/// Default cap on the number of shortest root paths enumerated per state.
pub const DEFAULT_MAX_PATHS: usize = 64;

/// What `apply_move` did.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// A new state was created for the resulting permutation
    pub created: bool,
    /// A new edge was inserted (always true when `created`)
    pub edge_created: bool,
    /// The edge to run the transition on
    pub edge: EdgeKey,
    pub from: StateId,
    pub to: StateId,
    /// The transition runs target to source
    pub reversed: bool,
    /// Edges reoriented by distance maintenance
    pub flipped: Vec<EdgeKey>,
}

/// What `delete_state` removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removal {
    /// The deleted state first, then the states pruned as unreachable
    pub states: Vec<StateId>,
    pub edges: Vec<EdgeKey>,
    pub flipped: Vec<EdgeKey>,
}

/// Deduplicated graph of cube states connected by move edges.
#[derive(Debug, Clone)]
pub struct StateGraph {
    states: BTreeMap<StateId, CubeState>,
    edges: BTreeMap<EdgeKey, MoveEdge>,
    /// Permutation to state, for dedup on insert
    index: HashMap<Facelets, StateId>,
    root: StateId,
    active: Option<EdgeKey>,
    next_id: u64,
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StateGraph {
    /// A graph holding only the solved root, with id 0.
    pub fn new() -> Self {
        Self::with_first_id(0)
    }

    /// A graph holding only the solved root, numbering states from `first`.
    pub fn with_first_id(first: u64) -> Self {
        Self::with_root(Facelets::IDENTITY, first)
    }

    /// A graph holding only a root with the given permutation.
    pub fn with_root(permutation: Facelets, first: u64) -> Self {
        let root = StateId(first);
        let mut states = BTreeMap::new();
        states.insert(root, CubeState::root(root, permutation));

        Self {
            states,
            edges: BTreeMap::new(),
            index: HashMap::from([(permutation, root)]),
            root,
            active: None,
            next_id: first + 1,
        }
    }

    // ---- queries ----

    pub fn root(&self) -> StateId {
        self.root
    }

    /// The id the next created state will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn state(&self, id: StateId) -> Option<&CubeState> {
        self.states.get(&id)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&MoveEdge> {
        self.edges.get(&key)
    }

    pub fn edge_between(&self, a: StateId, b: StateId) -> Option<&MoveEdge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    /// All states in id order.
    pub fn states(&self) -> impl Iterator<Item = &CubeState> {
        self.states.values()
    }

    /// All edges in key order.
    pub fn edges(&self) -> impl Iterator<Item = &MoveEdge> {
        self.edges.values()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The state holding `permutation`, if any.
    pub fn find(&self, permutation: &Facelets) -> Option<StateId> {
        self.index.get(permutation).copied()
    }

    /// Edges touching `id`, in key order.
    pub fn incident(&self, id: StateId) -> impl Iterator<Item = &MoveEdge> + '_ {
        self.states
            .get(&id)
            .into_iter()
            .flat_map(|state| state.edges.iter())
            .filter_map(|key| self.edges.get(key))
    }

    /// Edges pointing into `id`, in key order.
    pub fn incoming(&self, id: StateId) -> impl Iterator<Item = &MoveEdge> + '_ {
        self.incident(id).filter(move |edge| edge.target() == id)
    }

    /// Edges pointing out of `id`, in key order.
    pub fn outgoing(&self, id: StateId) -> impl Iterator<Item = &MoveEdge> + '_ {
        self.incident(id).filter(move |edge| edge.source() == id)
    }

    /// The edge currently running a transition.
    pub fn active_edge(&self) -> Option<&MoveEdge> {
        self.active.and_then(|key| self.edges.get(&key))
    }

    // ---- growth ----

    /// Parse `token` and apply it from `from`.
    pub fn apply_notation(&mut self, from: StateId, token: &str) -> Result<MoveOutcome> {
        let token: MoveToken = token.parse()?;
        self.apply_move(from, token)
    }

    /// Turn `token` from state `from`, deduplicating the result.
    ///
    /// Creates a state and edge for an unseen permutation, reuses the edge
    /// when the two states are already linked, and otherwise inserts a
    /// shortcut edge from the nearer to the farther endpoint before
    /// relaxing distances.
    pub fn apply_move(&mut self, from: StateId, token: MoveToken) -> Result<MoveOutcome> {
        let origin = self.states.get(&from).ok_or(GraphError::UnknownState(from))?;
        let candidate = origin.apply(token);
        let origin_distance = origin.distance();

        let Some(&to) = self.index.get(&candidate) else {
            let to = self.insert_state(candidate, origin_distance.map(|d| d + 1));
            let edge = self.insert_edge(MoveEdge::new(from, to, token));
            return Ok(MoveOutcome {
                created: true,
                edge_created: true,
                edge,
                from,
                to,
                reversed: false,
                flipped: Vec::new(),
            });
        };

        if to == from {
            return Err(MoveError::IdentityToken(token.to_string()).into());
        }

        let key = EdgeKey::new(from, to);
        if let Some(edge) = self.edges.get(&key) {
            return Ok(MoveOutcome {
                created: false,
                edge_created: false,
                edge: key,
                from,
                to,
                reversed: edge.source() != from,
                flipped: Vec::new(),
            });
        }

        let target_distance = self.states.get(&to).and_then(CubeState::distance);
        let edge = if rank(origin_distance, from) <= rank(target_distance, to) {
            MoveEdge::new(from, to, token)
        } else {
            MoveEdge::new(to, from, token.inverse())
        };
        let key = self.insert_edge(edge);

        let changed = self.relax(&[from, to]);
        let mut touched: BTreeSet<EdgeKey> = changed
            .iter()
            .filter_map(|id| self.states.get(id))
            .flat_map(|state| state.edges.iter().copied())
            .collect();
        touched.insert(key);
        let flipped = self.orient(touched);

        let reversed = self.edges.get(&key).is_some_and(|edge| edge.source() != from);
        debug!(edge = %key, relaxed = changed.len(), flipped = flipped.len(), "shortcut inserted");

        Ok(MoveOutcome {
            created: false,
            edge_created: true,
            edge: key,
            from,
            to,
            reversed,
            flipped,
        })
    }

    // ---- pruning and re-rooting ----

    /// Delete a state and everything that loses its connection to the root.
    ///
    /// Rejected for the root and while any transition is running.
    pub fn delete_state(&mut self, id: StateId) -> Result<Removal> {
        let state = self.states.get(&id).ok_or(GraphError::UnknownState(id))?;
        if state.is_root() {
            warn!(state = %id, "refusing to delete the root");
            return Err(GraphError::RootDeletionRejected(id));
        }
        if let Some(active) = self.active {
            warn!(state = %id, edge = %active, "refusing to delete during a transition");
            return Err(GraphError::ActiveTransitionConflict(active));
        }

        let mut removal = Removal {
            states: vec![id],
            edges: self.detach(id),
            flipped: Vec::new(),
        };

        for orphan in self.recompute_distances() {
            removal.edges.extend(self.detach(orphan));
            removal.states.push(orphan);
        }
        removal.flipped = self.orient_all();

        debug!(
            state = %id,
            states = removal.states.len(),
            edges = removal.edges.len(),
            flipped = removal.flipped.len(),
            "state deleted"
        );
        Ok(removal)
    }

    /// Make `id` the root and reorient the graph around it.
    ///
    /// Returns the flipped edges; a no-op when `id` is already the root.
    pub fn set_root(&mut self, id: StateId) -> Result<Vec<EdgeKey>> {
        if !self.states.contains_key(&id) {
            return Err(GraphError::UnknownState(id));
        }
        if id == self.root {
            return Ok(Vec::new());
        }

        if let Some(old) = self.states.get_mut(&self.root) {
            old.set_root(false);
        }
        if let Some(new) = self.states.get_mut(&id) {
            new.set_root(true);
        }
        let previous = std::mem::replace(&mut self.root, id);

        self.recompute_distances();
        let flipped = self.orient_all();

        info!(from = %previous, to = %id, flipped = flipped.len(), "root changed");
        Ok(flipped)
    }

    // ---- paths ----

    /// Shortest move paths from the root to `id`, normalized and deduplicated.
    ///
    /// At most `max_paths` are enumerated. The root yields one empty path.
    pub fn path_from_root(&self, id: StateId, max_paths: usize) -> Result<Vec<String>> {
        if !self.states.contains_key(&id) {
            return Err(GraphError::UnknownState(id));
        }
        let max_paths = max_paths.max(1);

        // Ancestors along shortest paths, nearest the root first
        let mut ancestors = vec![id];
        let mut seen = HashSet::from([id]);
        let mut next = 0;
        while let Some(&current) = ancestors.get(next) {
            next += 1;
            for edge in self.shortest_in_edges(current) {
                if seen.insert(edge.source()) {
                    ancestors.push(edge.source());
                }
            }
        }
        ancestors.sort_by_key(|&ancestor| self.distance_rank(ancestor));

        let mut routes: HashMap<StateId, Vec<MoveSequence>> = HashMap::new();
        for current in ancestors {
            let mut found = Vec::new();
            if current == self.root {
                found.push(MoveSequence::new());
            }
            'edges: for edge in self.shortest_in_edges(current) {
                for prefix in routes.get(&edge.source()).into_iter().flatten() {
                    if found.len() >= max_paths {
                        break 'edges;
                    }
                    let mut route = prefix.clone();
                    route.push(edge.label());
                    found.push(route);
                }
            }
            routes.insert(current, found);
        }

        let mut paths: Vec<String> = Vec::new();
        for route in routes.remove(&id).unwrap_or_default() {
            let path = route.normalized().to_string();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Shortest move paths from `id` back to the root.
    pub fn path_to_root(&self, id: StateId, max_paths: usize) -> Result<Vec<String>> {
        self.path_from_root(id, max_paths)?
            .iter()
            .map(|path| reverse(path).map_err(GraphError::from))
            .collect()
    }

    // ---- transitions ----

    /// Mark `key` as the running transition.
    ///
    /// Fails if a different edge is already running.
    pub fn activate_edge(&mut self, key: EdgeKey) -> Result<()> {
        if let Some(current) = self.active.filter(|&current| current != key) {
            return Err(GraphError::ActiveTransitionConflict(current));
        }
        let edge = self.edges.get_mut(&key).ok_or(GraphError::UnknownEdge(key))?;
        edge.set_active(true);
        self.active = Some(key);
        Ok(())
    }

    /// Stop the running transition, returning its edge.
    pub fn deactivate_edge(&mut self) -> Option<EdgeKey> {
        let key = self.active.take()?;
        if let Some(edge) = self.edges.get_mut(&key) {
            edge.set_active(false);
        }
        Some(key)
    }

    /// Record signed transition progress on an edge, clamped to [-100, 100].
    pub fn set_edge_progress(&mut self, key: EdgeKey, progress: f64) -> Result<()> {
        let edge = self.edges.get_mut(&key).ok_or(GraphError::UnknownEdge(key))?;
        edge.set_progress(progress);
        Ok(())
    }

    // ---- consistency ----

    /// Verify every structural invariant, reporting the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |message: String| Err(GraphError::InvariantViolation(message));

        match self.states.get(&self.root) {
            None => return violation(format!("root {} is missing", self.root)),
            Some(root) if !root.is_root() || root.distance() != Some(0) => {
                return violation(format!(
                    "root {} has flag {} and distance {:?}",
                    self.root,
                    root.is_root(),
                    root.distance()
                ))
            }
            Some(_) => {}
        }

        if self.index.len() != self.states.len() {
            return violation(format!(
                "{} states share {} permutations",
                self.states.len(),
                self.index.len()
            ));
        }

        let expected = self.bfs_distances();
        for state in self.states.values() {
            let id = state.id();
            if state.is_root() && id != self.root {
                return violation(format!("state {id} is also marked root"));
            }
            if self.index.get(state.permutation()) != Some(&id) {
                return violation(format!("permutation of state {id} is not indexed"));
            }
            if let Some(key) = state.edges.iter().find(|key| !self.edges.contains_key(*key)) {
                return violation(format!("state {id} lists missing edge {key}"));
            }
            if state.distance().is_none() || state.distance() != expected.get(&id).copied() {
                return violation(format!(
                    "state {id} has distance {:?}, expected {:?}",
                    state.distance(),
                    expected.get(&id)
                ));
            }
            if id != self.root {
                let nearest = self
                    .incoming(id)
                    .filter_map(|edge| self.states.get(&edge.source()))
                    .filter_map(CubeState::distance)
                    .min();
                if nearest.map(|d| d + 1) != state.distance() {
                    return violation(format!(
                        "state {id} at {:?} has nearest in-edge source at {nearest:?}",
                        state.distance()
                    ));
                }
            }
        }

        let mut running = 0;
        for (key, edge) in &self.edges {
            let (Some(source), Some(target)) =
                (self.states.get(&edge.source()), self.states.get(&edge.target()))
            else {
                return violation(format!("edge {key} has a missing endpoint"));
            };
            if !source.edges.contains(key) || !target.edges.contains(key) {
                return violation(format!("edge {key} is not listed by its endpoints"));
            }
            if source.apply(edge.label()) != *target.permutation() {
                return violation(format!(
                    "label {} of edge {key} does not lead from {} to {}",
                    edge.label(),
                    edge.source(),
                    edge.target()
                ));
            }
            if source.distance() > target.distance() {
                return violation(format!("edge {key} points toward the root"));
            }
            if edge.is_active() {
                running += 1;
                if self.active != Some(*key) {
                    return violation(format!("edge {key} is active but not tracked"));
                }
            }
        }
        if running > 1 {
            return violation(format!("{running} transitions are running"));
        }

        Ok(())
    }

    // ---- internals shared with loading ----

    pub(crate) fn insert_state(&mut self, permutation: Facelets, distance: Option<u32>) -> StateId {
        let id = StateId(self.next_id);
        self.next_id += 1;
        self.states.insert(id, CubeState::new(id, permutation, distance));
        self.index.insert(permutation, id);
        debug!(state = %id, ?distance, "state created");
        id
    }

    pub(crate) fn insert_edge(&mut self, edge: MoveEdge) -> EdgeKey {
        let key = edge.key();
        for id in [edge.source(), edge.target()] {
            if let Some(state) = self.states.get_mut(&id) {
                state.edges.insert(key);
            }
        }
        debug!(edge = %key, label = %edge.label(), source = %edge.source(), "edge created");
        self.edges.insert(key, edge);
        key
    }

    /// Recompute every distance from the root and reorient all edges.
    pub(crate) fn reindex(&mut self) -> Vec<EdgeKey> {
        self.recompute_distances();
        self.orient_all()
    }

    // ---- maintenance ----

    /// Remove a state with its edges.
    fn detach(&mut self, id: StateId) -> Vec<EdgeKey> {
        let Some(state) = self.states.remove(&id) else {
            return Vec::new();
        };
        self.index.remove(state.permutation());

        let mut removed = Vec::new();
        for key in state.edges {
            if self.edges.remove(&key).is_none() {
                continue;
            }
            if let Some(other) = key.other(id).and_then(|other| self.states.get_mut(&other)) {
                other.edges.remove(&key);
            }
            removed.push(key);
        }
        removed
    }

    /// Undirected BFS distances from the root.
    fn bfs_distances(&self) -> HashMap<StateId, u32> {
        let mut distances = HashMap::from([(self.root, 0)]);
        let mut queue = VecDeque::from([self.root]);

        while let Some(id) = queue.pop_front() {
            let (Some(&d), Some(state)) = (distances.get(&id), self.states.get(&id)) else {
                continue;
            };
            for neighbour in state.edges.iter().filter_map(|key| key.other(id)) {
                if let Entry::Vacant(slot) = distances.entry(neighbour) {
                    slot.insert(d + 1);
                    queue.push_back(neighbour);
                }
            }
        }
        distances
    }

    /// Overwrite all distances with BFS distances. Returns the unreachable states.
    fn recompute_distances(&mut self) -> Vec<StateId> {
        let distances = self.bfs_distances();
        let mut unreachable = Vec::new();
        for (id, state) in self.states.iter_mut() {
            let distance = distances.get(id).copied();
            if distance.is_none() {
                unreachable.push(*id);
            }
            state.set_distance(distance);
        }
        unreachable
    }

    /// Decrease-only FIFO relaxation from `seeds`. Returns the states whose
    /// distance dropped.
    fn relax(&mut self, seeds: &[StateId]) -> BTreeSet<StateId> {
        let mut changed = BTreeSet::new();
        let mut queue: VecDeque<StateId> = seeds.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            let Some(state) = self.states.get(&id) else {
                continue;
            };
            let Some(d) = state.distance() else {
                continue;
            };
            let neighbours: Vec<StateId> =
                state.edges.iter().filter_map(|key| key.other(id)).collect();

            for neighbour in neighbours {
                let Some(next) = self.states.get_mut(&neighbour) else {
                    continue;
                };
                if next.distance().map_or(true, |nd| d + 1 < nd) {
                    next.set_distance(Some(d + 1));
                    changed.insert(neighbour);
                    queue.push_back(neighbour);
                }
            }
        }
        changed
    }

    fn orient_all(&mut self) -> Vec<EdgeKey> {
        let keys: Vec<EdgeKey> = self.edges.keys().copied().collect();
        self.orient(keys)
    }

    /// Flip each edge whose source is farther from the root than its target.
    fn orient(&mut self, keys: impl IntoIterator<Item = EdgeKey>) -> Vec<EdgeKey> {
        let mut flipped = Vec::new();
        for key in keys {
            let Some(edge) = self.edges.get(&key) else {
                continue;
            };
            let backward =
                self.distance_rank(edge.source()) > self.distance_rank(edge.target());
            if backward {
                if let Some(edge) = self.edges.get_mut(&key) {
                    edge.flip();
                    debug!(edge = %key, label = %edge.label(), source = %edge.source(), "edge flipped");
                    flipped.push(key);
                }
            }
        }
        flipped
    }

    /// In-edges of `id` whose source is exactly one move closer to the root.
    fn shortest_in_edges(&self, id: StateId) -> impl Iterator<Item = &MoveEdge> + '_ {
        let wanted = self
            .states
            .get(&id)
            .and_then(CubeState::distance)
            .and_then(|d| d.checked_sub(1));
        self.incoming(id).filter(move |edge| {
            wanted.is_some() && self.states.get(&edge.source()).and_then(CubeState::distance) == wanted
        })
    }

    /// Distance with unreachable sorting last.
    fn distance_rank(&self, id: StateId) -> u32 {
        self.states
            .get(&id)
            .and_then(CubeState::distance)
            .unwrap_or(u32::MAX)
    }
}

/// Shortcut orientation order: nearer first, then lower id.
fn rank(distance: Option<u32>, id: StateId) -> (u32, StateId) {
    (distance.unwrap_or(u32::MAX), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn token(s: &str) -> MoveToken {
        s.parse().unwrap()
    }

    /// Apply a path from `from`, one token at a time, returning the last state.
    fn walk(graph: &mut StateGraph, from: StateId, path: &str) -> StateId {
        let moves: MoveSequence = path.parse().unwrap();
        moves.iter().fold(from, |at, &t| graph.apply_move(at, t).unwrap().to)
    }

    #[test]
    fn first_move_creates_state_and_edge() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let outcome = graph.apply_move(root, token("U")).unwrap();

        assert!(outcome.created);
        assert!(!outcome.reversed);
        let s1 = graph.state(outcome.to).unwrap();
        assert_eq!(s1.distance(), Some(1));
        assert!(!s1.is_root());

        let edge = graph.edge(outcome.edge).unwrap();
        assert_eq!(edge.source(), root);
        assert_eq!(edge.target(), outcome.to);
        assert_eq!(edge.label(), token("U"));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn inverse_move_reuses_edge_in_reverse() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let first = graph.apply_move(root, token("U")).unwrap();
        let back = graph.apply_move(first.to, token("U'")).unwrap();

        assert!(!back.created);
        assert!(!back.edge_created);
        assert!(back.reversed);
        assert_eq!(back.to, root);
        assert_eq!(back.edge, first.edge);
        assert_eq!(graph.state_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn repeated_move_reuses_edge_forward() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let first = graph.apply_move(root, token("R2")).unwrap();
        let again = graph.apply_move(root, token("R2")).unwrap();
        assert!(!again.created && !again.reversed);
        assert_eq!(again.to, first.to);

        // A double turn is its own inverse: from the far end it runs backward.
        let back = graph.apply_move(first.to, token("R2")).unwrap();
        assert!(back.reversed);
        assert_eq!(back.to, root);
    }

    #[test]
    fn shortcut_between_equal_distances_orders_by_id() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let a = graph.apply_move(root, token("U")).unwrap().to;
        let b = graph.apply_move(root, token("U2")).unwrap().to;

        let outcome = graph.apply_move(a, token("U")).unwrap();
        assert!(!outcome.created);
        assert!(outcome.edge_created);
        assert_eq!(outcome.to, b);

        let edge = graph.edge(outcome.edge).unwrap();
        assert_eq!((edge.source(), edge.target()), (a, b));
        assert_eq!(graph.state(b).unwrap().distance(), Some(1));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn shortcut_toward_nearer_state_is_labelled_inversely() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let s2 = walk(&mut graph, root, "UU");
        let s3 = walk(&mut graph, s2, "U");
        assert_eq!(graph.state(s3).unwrap().distance(), Some(3));

        // s3 is farther than the root, so the new edge points root -> s3.
        let shortcut = graph.apply_move(s3, token("U")).unwrap();
        assert_eq!(shortcut.to, root);
        assert!(!shortcut.created);
        assert!(shortcut.edge_created);
        assert!(shortcut.reversed);
        assert_eq!(shortcut.flipped, vec![EdgeKey::new(s2, s3)]);

        let edge = graph.edge(shortcut.edge).unwrap();
        assert_eq!((edge.source(), edge.label()), (root, token("U'")));
        assert_eq!(graph.state(s3).unwrap().distance(), Some(1));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn shortcut_shortens_distances_and_flips_edges() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let a = walk(&mut graph, root, "U");
        let b = walk(&mut graph, a, "R");
        let c = walk(&mut graph, b, "R");
        let d = walk(&mut graph, c, "R");
        assert_eq!(graph.state(d).unwrap().distance(), Some(4));

        let outcome = graph.apply_move(a, token("R'")).unwrap();
        assert_eq!(outcome.to, d);
        assert!(!outcome.reversed);
        assert_eq!(outcome.flipped, vec![EdgeKey::new(c, d)]);

        assert_eq!(graph.state(d).unwrap().distance(), Some(2));
        assert_eq!(graph.state(c).unwrap().distance(), Some(3));
        let flipped = graph.edge_between(c, d).unwrap();
        assert_eq!((flipped.source(), flipped.label()), (d, token("R'")));
        graph.check_invariants().unwrap();

        assert_eq!(graph.path_from_root(d, 8).unwrap(), vec!["UR'"]);
        // Both shortest routes to c normalize to the same path.
        assert_eq!(graph.path_from_root(c, 8).unwrap(), vec!["UR2"]);
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        walk(&mut graph, root, "UR");

        assert_eq!(
            graph.delete_state(root),
            Err(GraphError::RootDeletionRejected(root))
        );
        assert_eq!(graph.state_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn deletion_prunes_unreachable_states() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let a = walk(&mut graph, root, "U");
        let b = walk(&mut graph, a, "R");
        let c = walk(&mut graph, root, "F");

        let removal = graph.delete_state(a).unwrap();
        assert_eq!(removal.states, vec![a, b]);
        assert_eq!(removal.edges.len(), 2);
        assert_eq!(graph.state_count(), 2);
        assert!(graph.state(c).is_some());
        assert!(graph.find(&Facelets::IDENTITY.apply(token("U"))).is_none());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn deletion_keeps_states_reachable_another_way() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let a = walk(&mut graph, root, "U");
        let b = walk(&mut graph, a, "U");
        let c = walk(&mut graph, root, "U'");
        // c U' reaches b, closing the four-cycle of U turns.
        assert_eq!(graph.apply_move(c, token("U'")).unwrap().to, b);

        let removal = graph.delete_state(a).unwrap();
        assert_eq!(removal.states, vec![a]);
        assert_eq!(graph.state(b).unwrap().distance(), Some(2));
        assert_eq!(graph.incoming(b).next().unwrap().source(), c);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn deletion_can_lengthen_distances() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        // U and D commute, so U2 D2 U2 D2 closes a six-cycle through the root.
        let c = walk(&mut graph, root, "UUD");
        let e = walk(&mut graph, c, "D");
        let f = walk(&mut graph, e, "U2");
        assert_eq!(graph.apply_move(f, token("D2")).unwrap().to, root);
        assert_eq!(graph.state(e).unwrap().distance(), Some(2));

        graph.delete_state(f).unwrap();
        assert_eq!(graph.state(e).unwrap().distance(), Some(4));
        assert_eq!(graph.incoming(e).next().unwrap().source(), c);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn active_transition_blocks_deletion() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let outcome = graph.apply_move(root, token("L")).unwrap();
        graph.activate_edge(outcome.edge).unwrap();

        assert_eq!(
            graph.delete_state(outcome.to),
            Err(GraphError::ActiveTransitionConflict(outcome.edge))
        );
        assert_eq!(graph.deactivate_edge(), Some(outcome.edge));
        assert!(graph.delete_state(outcome.to).is_ok());
    }

    #[test]
    fn only_one_transition_runs() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let first = graph.apply_move(root, token("L")).unwrap().edge;
        let second = graph.apply_move(root, token("R")).unwrap().edge;

        graph.activate_edge(first).unwrap();
        graph.activate_edge(first).unwrap();
        assert_eq!(
            graph.activate_edge(second),
            Err(GraphError::ActiveTransitionConflict(first))
        );
        graph.set_edge_progress(first, 55.0).unwrap();
        assert_eq!(graph.active_edge().unwrap().progress(), 55.0);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn set_root_reverses_the_chain() {
        let mut graph = StateGraph::new();
        let old_root = graph.root();
        let a = walk(&mut graph, old_root, "U");
        let b = walk(&mut graph, a, "R");

        let flipped = graph.set_root(b).unwrap();
        assert_eq!(flipped.len(), 2);
        assert_eq!(graph.root(), b);
        assert!(!graph.state(old_root).unwrap().is_root());
        assert_eq!(graph.state(old_root).unwrap().distance(), Some(2));

        let edge = graph.edge_between(a, b).unwrap();
        assert_eq!((edge.source(), edge.label()), (b, token("R'")));
        graph.check_invariants().unwrap();

        assert_eq!(graph.path_from_root(old_root, 8).unwrap(), vec!["R'U'"]);
        assert_eq!(graph.path_to_root(old_root, 8).unwrap(), vec!["UR"]);
        assert_eq!(graph.set_root(b).unwrap(), Vec::<EdgeKey>::new());
    }

    #[test]
    fn root_paths_are_empty() {
        let graph = StateGraph::new();
        assert_eq!(graph.path_from_root(graph.root(), 0).unwrap(), vec![""]);
        assert_eq!(graph.path_to_root(graph.root(), 4).unwrap(), vec![""]);
    }

    #[test]
    fn multiple_shortest_paths_are_listed_and_capped() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        // U and D commute: UD and DU reach the same state.
        let ud = walk(&mut graph, root, "UD");
        assert_eq!(walk(&mut graph, root, "DU"), ud);

        let paths = graph.path_from_root(ud, 8).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&"UD".to_string()));
        assert!(paths.contains(&"DU".to_string()));
        assert_eq!(graph.path_from_root(ud, 1).unwrap().len(), 1);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut graph = StateGraph::with_first_id(10);
        let root = graph.root();
        assert_eq!(root, StateId(10));
        let a = walk(&mut graph, root, "B");
        graph.delete_state(a).unwrap();
        let again = walk(&mut graph, root, "B");
        assert!(again > a);
        assert_eq!(graph.next_id(), again.0 + 1);
    }

    #[test]
    fn unknown_ids_and_bad_tokens_are_rejected() {
        let mut graph = StateGraph::new();
        assert_eq!(
            graph.apply_move(StateId(99), token("U")),
            Err(GraphError::UnknownState(StateId(99)))
        );
        assert!(matches!(
            graph.apply_notation(graph.root(), "Q"),
            Err(GraphError::InvalidMoveToken(_))
        ));
        assert_eq!(graph.state_count(), 1);
    }

    #[test]
    fn incoming_and_outgoing_split_by_direction() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let a = walk(&mut graph, root, "U");
        walk(&mut graph, a, "R");
        walk(&mut graph, a, "F");

        assert_eq!(graph.incoming(a).count(), 1);
        assert_eq!(graph.outgoing(a).count(), 2);
        assert_eq!(graph.incident(a).count(), 3);
        assert_eq!(graph.outgoing(root).count(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Apply(usize, &'static str),
        SetRoot(usize),
        Delete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        // A small alphabet closes cycles often.
        let tokens = prop::sample::select(vec!["U", "U'", "U2", "R", "R'", "D", "Uw"]);
        prop_oneof![
            6 => (any::<usize>(), tokens).prop_map(|(at, t)| Op::Apply(at, t)),
            1 => any::<usize>().prop_map(Op::SetRoot),
            1 => any::<usize>().prop_map(Op::Delete),
        ]
    }

    fn pick(graph: &StateGraph, at: usize) -> StateId {
        let ids: Vec<StateId> = graph.states().map(CubeState::id).collect();
        ids[at % ids.len()]
    }

    proptest! {
        #[test]
        fn invariants_hold_under_random_edits(ops in prop::collection::vec(op(), 1..60)) {
            let mut graph = StateGraph::new();
            for op in ops {
                match op {
                    Op::Apply(at, t) => {
                        let from = pick(&graph, at);
                        graph.apply_move(from, token(t)).unwrap();
                    }
                    Op::SetRoot(at) => {
                        let id = pick(&graph, at);
                        graph.set_root(id).unwrap();
                    }
                    Op::Delete(at) => {
                        let id = pick(&graph, at);
                        let result = graph.delete_state(id);
                        prop_assert_eq!(result.is_err(), id == graph.root());
                    }
                }
                prop_assert_eq!(graph.check_invariants(), Ok(()));
            }
        }

        #[test]
        fn root_paths_reach_their_state(ops in prop::collection::vec(op(), 1..30)) {
            let mut graph = StateGraph::new();
            for op in ops {
                if let Op::Apply(at, t) = op {
                    let from = pick(&graph, at);
                    graph.apply_move(from, token(t)).unwrap();
                }
            }
            let root = *graph.state(graph.root()).unwrap().permutation();
            for state in graph.states() {
                for path in graph.path_from_root(state.id(), 4).unwrap() {
                    let moves: MoveSequence = path.parse().unwrap();
                    prop_assert_eq!(root.apply_sequence(&moves), *state.permutation());
                }
                for path in graph.path_to_root(state.id(), 4).unwrap() {
                    let moves: MoveSequence = path.parse().unwrap();
                    prop_assert_eq!(state.permutation().apply_sequence(&moves), root);
                }
            }
        }
    }
}
