//! Velocity-controlled move playback.

use std::collections::VecDeque;

use cubegraph_moves::MoveToken;
use cubegraph_state::{EdgeKey, GraphError, StateGraph, StateId};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Ticks per second the velocity scale is calibrated against.
pub const REFERENCE_TICK_RATE: f64 = 60.0;

/// Completion tolerance for accumulated floating-point progress.
const PROGRESS_EPSILON: f64 = 1e-9;

/// Playback velocity on a 0..=20 scale.
///
/// 0 pauses, 20 completes a move in a single tick; in between a move takes
/// `0.1 * (20 - v)` seconds at the reference tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Velocity(u8);

impl Velocity {
    pub const PAUSED: Velocity = Velocity(0);
    pub const INSTANT: Velocity = Velocity(20);
    pub const DEFAULT: Velocity = Velocity(10);

    /// Velocity clamped into range.
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(0, i64::from(Self::INSTANT.0));
        if clamped != value {
            warn!(requested = value, clamped, "velocity out of range");
        }
        Self(clamped as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_paused(self) -> bool {
        self.0 == 0
    }

    /// Percentage of a move completed per tick.
    pub fn progress_per_tick(self) -> f64 {
        match self.0 {
            0 => 0.0,
            20 => 100.0,
            v => 100.0 / (REFERENCE_TICK_RATE * f64::from(20 - v) / 10.0),
        }
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Velocity {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Velocity> for u8 {
    fn from(velocity: Velocity) -> Self {
        velocity.0
    }
}

/// A move being animated along an edge.
///
/// Endpoints are fixed at start, so a re-root that flips the edge mid-flight
/// does not change where the transition ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub edge: EdgeKey,
    pub from: StateId,
    pub to: StateId,
    pub token: MoveToken,
}

/// Emitted by [`PlaybackQueue::tick`] when a transition reaches 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionComplete {
    pub transition: Transition,
    /// State the transition ended on
    pub to_state: StateId,
    /// The next queued move, already popped; the caller applies it from `to_state`
    pub next_token: Option<MoveToken>,
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing running, nothing queued
    Idle,
    /// A transition is advancing
    Playing,
    /// A transition is running at velocity 0
    Paused,
}

/// FIFO of pending moves plus the one transition in flight.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    pending: VecDeque<MoveToken>,
    current: Option<Transition>,
    /// Unsigned 0..=100; the sign lives on the edge
    progress: f64,
    velocity: Velocity,
}

impl PlaybackQueue {
    pub fn new(velocity: Velocity) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }

    /// Queue a move behind the running transition. Never preempts it.
    pub fn enqueue(&mut self, token: MoveToken) {
        self.pending.push_back(token);
    }

    pub fn pending(&self) -> impl Iterator<Item = MoveToken> + '_ {
        self.pending.iter().copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Take the next queued move without starting it.
    pub fn pop_pending(&mut self) -> Option<MoveToken> {
        self.pending.pop_front()
    }

    /// Drop queued moves, keeping the running transition. Returns how many were dropped.
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn current(&self) -> Option<&Transition> {
        self.current.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Velocity) {
        self.velocity = velocity;
    }

    pub fn state(&self) -> PlaybackState {
        match self.current {
            None => PlaybackState::Idle,
            Some(_) if self.velocity.is_paused() => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
        }
    }

    /// Activate the transition's edge and start it at 0%.
    pub fn start(&mut self, graph: &mut StateGraph, transition: Transition) -> Result<(), GraphError> {
        graph.activate_edge(transition.edge)?;
        self.current = Some(transition);
        self.progress = 0.0;
        Ok(())
    }

    /// Forget the running transition and queued moves without touching a graph.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.current = None;
        self.progress = 0.0;
    }

    /// Advance the running transition by one tick.
    ///
    /// Progress is written to the edge signed by travel direction relative
    /// to the edge's current orientation. On completion the edge is
    /// deactivated and the next pending move is popped.
    pub fn tick(&mut self, graph: &mut StateGraph) -> Option<TransitionComplete> {
        let transition = self.current?;

        let Some(edge) = graph.edge(transition.edge) else {
            warn!(edge = %transition.edge, "transition edge vanished");
            self.current = None;
            self.progress = 0.0;
            return None;
        };
        let sign = if edge.source() == transition.from { 1.0 } else { -1.0 };

        self.progress = (self.progress + self.velocity.progress_per_tick()).min(100.0);
        if graph.set_edge_progress(transition.edge, sign * self.progress).is_err() {
            return None;
        }
        trace!(edge = %transition.edge, progress = self.progress, "tick");

        if self.progress + PROGRESS_EPSILON < 100.0 {
            return None;
        }

        graph.deactivate_edge();
        self.current = None;
        self.progress = 0.0;

        Some(TransitionComplete {
            transition,
            to_state: transition.to,
            next_token: self.pending.pop_front(),
        })
    }
}

/// Playback status for sending to frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub pending: usize,
    pub transition: Option<Transition>,
    pub progress: f64,
    pub velocity: Velocity,
}

impl From<&PlaybackQueue> for PlaybackStatus {
    fn from(queue: &PlaybackQueue) -> Self {
        Self {
            state: queue.state(),
            pending: queue.pending_len(),
            transition: queue.current,
            progress: queue.progress,
            velocity: queue.velocity,
        }
    }
}
