//! Cubegraph Explorer
//!
//! Drives a cube-state graph one animated move at a time.
//!
//! # Architecture
//!
//! - **Explorer**: Owns the graph, the current state and the playback queue
//! - **Playback**: Velocity-controlled transitions and a FIFO of pending moves
//! - **Events**: Records what changed, for a renderer to replay
//! - **Driver**: Delivers ticks from a tokio interval
//! - **Server**: JSON API and WebSocket for remote control
//!
//! # Usage
//!
//! ```
//! use cubegraph_vis::{Explorer, ExplorerConfig, Velocity};
//!
//! let mut explorer = Explorer::new(ExplorerConfig {
//!     velocity: Velocity::INSTANT,
//!     tick_rate: 60,
//!     max_paths: 64,
//! });
//! explorer.rotate_path("RUR'U'").unwrap();
//! while !explorer.is_idle() {
//!     explorer.tick();
//! }
//! assert_eq!(explorer.path_to_root().unwrap(), vec!["URU'R'"]);
//! ```

mod config;
mod driver;
mod events;
mod explorer;
mod playback;
mod server;

pub use config::ExplorerConfig;
pub use driver::{drive, run_realtime};
pub use events::{EdgeView, EngineEvent, GraphSnapshot, StateView};
pub use explorer::Explorer;
pub use playback::{
    PlaybackQueue, PlaybackState, PlaybackStatus, Transition, TransitionComplete, Velocity,
    REFERENCE_TICK_RATE,
};
pub use server::{ApiError, ExplorerServer};
