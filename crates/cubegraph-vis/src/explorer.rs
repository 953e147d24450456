//! Explorer: the single owner that drives a state graph and its playback.

use cubegraph_moves::{MoveSequence, MoveToken};
use cubegraph_state::{
    EdgeKey, GraphData, GraphError, MoveOutcome, Removal, Result, StateGraph, StateId,
};
use tracing::{debug, info, warn};

use crate::config::ExplorerConfig;
use crate::events::{EngineEvent, GraphSnapshot};
use crate::playback::{PlaybackQueue, PlaybackStatus, Transition, TransitionComplete, Velocity};

/// Explores cube states one animated move at a time and records events.
///
/// Moves requested while a transition is running are queued and started
/// from wherever that transition ends.
#[derive(Debug)]
pub struct Explorer {
    config: ExplorerConfig,
    graph: StateGraph,
    queue: PlaybackQueue,
    current: StateId,
    events: Vec<EngineEvent>,
    frame: u64,
}

impl Explorer {
    /// Create an explorer sitting on a fresh root.
    pub fn new(config: ExplorerConfig) -> Self {
        let graph = StateGraph::new();
        let current = graph.root();
        Self {
            queue: PlaybackQueue::new(config.velocity),
            config,
            graph,
            current,
            events: Vec::new(),
            frame: 0,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    /// The state the cube is currently in.
    pub fn current(&self) -> StateId {
        self.current
    }

    /// Ticks delivered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Nothing running and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    // ---- moves ----

    /// Turn `token`, or queue it behind the running transition.
    pub fn rotate(&mut self, token: MoveToken) -> Result<()> {
        if self.queue.is_running() {
            self.queue.enqueue(token);
            return Ok(());
        }
        self.begin(self.current, token)
    }

    /// Turn every token of a move path in order. Returns how many were accepted.
    ///
    /// The path is parsed up front, so a malformed path turns nothing.
    pub fn rotate_path(&mut self, path: &str) -> Result<usize> {
        let moves: MoveSequence = path.parse()?;
        for &token in &moves {
            self.rotate(token)?;
        }
        Ok(moves.len())
    }

    /// Traverse `key` from its source to its target.
    pub fn step_forward(&mut self, key: EdgeKey) -> Result<()> {
        self.step(key, true)
    }

    /// Traverse `key` from its target back to its source.
    pub fn step_backward(&mut self, key: EdgeKey) -> Result<()> {
        self.step(key, false)
    }

    fn step(&mut self, key: EdgeKey, forward: bool) -> Result<()> {
        self.ensure_stopped()?;
        let edge = self.graph.edge(key).ok_or(GraphError::UnknownEdge(key))?;
        let (start, token) = if forward {
            (edge.source(), edge.label())
        } else {
            (edge.target(), edge.label().inverse())
        };
        if start != self.current {
            return Err(GraphError::WrongEndpoint {
                state: self.current,
                edge: key,
            });
        }
        self.begin(start, token)
    }

    /// Apply `token` from `from` and start animating the edge it selects.
    fn begin(&mut self, from: StateId, token: MoveToken) -> Result<()> {
        let outcome = self.graph.apply_move(from, token)?;
        self.record_outcome(&outcome);

        let transition = Transition {
            edge: outcome.edge,
            from: outcome.from,
            to: outcome.to,
            token,
        };
        self.queue.start(&mut self.graph, transition)?;
        self.events.push(EngineEvent::TransitionStarted {
            edge: transition.edge,
            from: transition.from,
            to: transition.to,
            token,
            frame: self.frame,
        });
        debug!(edge = %transition.edge, %token, reversed = outcome.reversed, "transition started");
        Ok(())
    }

    fn record_outcome(&mut self, outcome: &MoveOutcome) {
        if outcome.created {
            self.events.push(EngineEvent::StateCreated {
                state: outcome.to,
                distance: self.graph.state(outcome.to).and_then(|s| s.distance()),
                frame: self.frame,
            });
        }
        if outcome.edge_created {
            if let Some(edge) = self.graph.edge(outcome.edge) {
                self.events.push(EngineEvent::EdgeCreated {
                    edge: edge.key(),
                    source: edge.source(),
                    target: edge.target(),
                    label: edge.label(),
                    frame: self.frame,
                });
            }
        }
        self.record_flips(&outcome.flipped);
    }

    fn record_flips(&mut self, flipped: &[EdgeKey]) {
        for &key in flipped {
            if let Some(edge) = self.graph.edge(key) {
                self.events.push(EngineEvent::EdgeFlipped {
                    edge: key,
                    source: edge.source(),
                    label: edge.label(),
                    frame: self.frame,
                });
            }
        }
    }

    // ---- playback ----

    /// Deliver one tick.
    ///
    /// On completion the destination becomes current and the next queued
    /// move, if any, starts immediately. A queued move that cannot start is
    /// skipped with a warning.
    pub fn tick(&mut self) -> Option<TransitionComplete> {
        self.frame += 1;
        let done = self.queue.tick(&mut self.graph)?;

        self.current = done.to_state;
        self.events.push(EngineEvent::TransitionCompleted {
            edge: done.transition.edge,
            to: done.to_state,
            frame: self.frame,
        });

        let mut next = done.next_token;
        while let Some(token) = next {
            match self.begin(self.current, token) {
                Ok(()) => break,
                Err(error) => {
                    warn!(%token, %error, "skipping queued move");
                    next = self.queue.pop_pending();
                }
            }
        }
        Some(done)
    }

    pub fn set_velocity(&mut self, velocity: Velocity) {
        self.queue.set_velocity(velocity);
    }

    /// Drop queued moves; the running transition still finishes.
    pub fn clear_pending(&mut self) -> usize {
        self.queue.clear_pending()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::from(&self.queue)
    }

    // ---- graph edits ----

    /// Delete a state and whatever it disconnects from the root.
    ///
    /// If the current state goes with it, the cube falls back to the state
    /// it was first reached from, or to the root.
    pub fn delete_state(&mut self, id: StateId) -> Result<Removal> {
        let fallback = self.graph.incoming(id).next().map(|edge| edge.source());
        let removal = self.graph.delete_state(id)?;

        if removal.states.contains(&self.current) {
            self.current = fallback
                .filter(|&state| self.graph.state(state).is_some())
                .unwrap_or_else(|| self.graph.root());
        }

        self.events.push(EngineEvent::StatesRemoved {
            states: removal.states.clone(),
            edges: removal.edges.clone(),
            frame: self.frame,
        });
        self.record_flips(&removal.flipped);
        Ok(removal)
    }

    pub fn set_root(&mut self, id: StateId) -> Result<()> {
        let previous = self.graph.root();
        let flipped = self.graph.set_root(id)?;
        if previous != id {
            self.events.push(EngineEvent::RootChanged {
                from: previous,
                to: id,
                frame: self.frame,
            });
            self.record_flips(&flipped);
        }
        Ok(())
    }

    /// Jump to a state without animating. Rejected while a transition runs.
    pub fn select(&mut self, id: StateId) -> Result<()> {
        self.ensure_stopped()?;
        if self.graph.state(id).is_none() {
            return Err(GraphError::UnknownState(id));
        }
        self.current = id;
        Ok(())
    }

    /// Replace the graph with a fresh root. State ids keep increasing.
    pub fn reset(&mut self) {
        self.graph = StateGraph::with_first_id(self.graph.next_id());
        self.queue.reset();
        self.current = self.graph.root();
        self.events.push(EngineEvent::GraphReset {
            root: self.current,
            frame: self.frame,
        });
        info!(root = %self.current, "explorer reset");
    }

    // ---- persistence ----

    pub fn save(&self) -> GraphData {
        self.graph.to_data()
    }

    /// Replace the graph with persisted data. Playback is cleared.
    ///
    /// On error nothing changes.
    pub fn load(&mut self, data: &GraphData) -> Result<()> {
        let graph = StateGraph::from_data(data, self.graph.next_id())?;
        self.graph = graph;
        self.queue.reset();
        self.current = self.graph.root();
        self.events.push(EngineEvent::GraphLoaded {
            root: self.current,
            states: self.graph.state_count(),
            edges: self.graph.edge_count(),
            frame: self.frame,
        });
        Ok(())
    }

    // ---- queries ----

    /// Shortest move paths from the current state back to the root.
    pub fn path_to_root(&self) -> Result<Vec<String>> {
        self.graph.path_to_root(self.current, self.config.max_paths)
    }

    /// Shortest move paths from the root to the current state.
    pub fn path_from_root(&self) -> Result<Vec<String>> {
        self.graph.path_from_root(self.current, self.config.max_paths)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from_graph(&self.graph, self.current, self.frame)
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_stopped(&self) -> Result<()> {
        match self.queue.current() {
            Some(transition) => Err(GraphError::ActiveTransitionConflict(transition.edge)),
            None => Ok(()),
        }
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}
