//! Real-time tick drivers.
//!
//! The explorer never touches a clock; these loops deliver its ticks from a
//! tokio interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::explorer::Explorer;
use crate::playback::PlaybackState;

fn ticker(tick_rate: u32) -> Interval {
    let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Tick `explorer` at `tick_rate` until playback settles. Returns the tick count.
///
/// Stops early if playback is paused, since no tick could make progress.
pub async fn run_realtime(explorer: &mut Explorer, tick_rate: u32) -> u64 {
    let mut ticker = ticker(tick_rate);
    let mut ticks = 0;

    while !explorer.is_idle() {
        if explorer.queue().state() == PlaybackState::Paused {
            warn!(pending = explorer.queue().pending_len(), "playback paused, stopping driver");
            break;
        }
        ticker.tick().await;
        explorer.tick();
        ticks += 1;
    }

    debug!(ticks, frame = explorer.frame(), "playback settled");
    ticks
}

/// Tick a shared explorer forever. Spawned alongside the API server.
pub async fn drive(explorer: Arc<RwLock<Explorer>>, tick_rate: u32) {
    let mut ticker = ticker(tick_rate);
    loop {
        ticker.tick().await;
        let mut explorer = explorer.write().await;
        if !explorer.is_idle() {
            explorer.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;
    use crate::playback::Velocity;

    fn explorer(velocity: i64) -> Explorer {
        Explorer::new(ExplorerConfig {
            velocity: Velocity::new(velocity),
            tick_rate: 1000,
            max_paths: 64,
        })
    }

    #[test]
    fn realtime_run_settles() {
        let mut ex = explorer(20);
        ex.rotate_path("RUF").unwrap();

        let ticks = tokio_test::block_on(run_realtime(&mut ex, 1000));
        assert_eq!(ticks, 3);
        assert!(ex.is_idle());
        assert_eq!(ex.path_from_root().unwrap(), vec!["RUF"]);
    }

    #[test]
    fn paused_run_returns_immediately() {
        let mut ex = explorer(0);
        ex.rotate_path("RU").unwrap();

        let ticks = tokio_test::block_on(run_realtime(&mut ex, 1000));
        assert_eq!(ticks, 0);
        assert_eq!(ex.queue().pending_len(), 1);
    }

    #[tokio::test]
    async fn shared_driver_advances_playback() {
        let shared = Arc::new(RwLock::new(explorer(20)));
        shared.write().await.rotate_path("UU").unwrap();

        let handle = tokio::spawn(drive(shared.clone(), 1000));
        for _ in 0..200 {
            if shared.read().await.is_idle() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        let ex = shared.read().await;
        assert!(ex.is_idle());
        assert_eq!(ex.path_from_root().unwrap(), vec!["U2"]);
    }
}
