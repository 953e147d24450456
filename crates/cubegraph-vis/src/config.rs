//! Explorer configuration from the environment.

use std::str::FromStr;
use std::time::Duration;

use cubegraph_state::DEFAULT_MAX_PATHS;
use tracing::warn;

use crate::playback::Velocity;

/// Configuration for an explorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    /// Initial playback velocity (0..=20)
    pub velocity: Velocity,

    /// Ticks per second when driven in real time
    pub tick_rate: u32,

    /// Cap on enumerated root paths per state
    pub max_paths: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ExplorerConfig {
    /// Create config from environment variables with sensible defaults.
    ///
    /// - `CUBEGRAPH_VELOCITY` (default 10, clamped to 0..=20)
    /// - `CUBEGRAPH_TICK_RATE` (default 60, at least 1)
    /// - `CUBEGRAPH_MAX_PATHS` (default 64, at least 1)
    pub fn from_env() -> Self {
        let velocity = Velocity::new(env_or("CUBEGRAPH_VELOCITY", i64::from(Velocity::DEFAULT.value())));
        let tick_rate = env_or("CUBEGRAPH_TICK_RATE", 60u32).max(1);
        let max_paths = env_or("CUBEGRAPH_MAX_PATHS", DEFAULT_MAX_PATHS).max(1);

        Self {
            velocity,
            tick_rate,
            max_paths,
        }
    }

    /// Wall-clock time between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

fn env_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}
