//! The fixed-rate simulation tick loop

use tokio::time::interval;
use tracing::info;

use crate::app::AppState;
use crate::net::broadcast::evict_failed;
use crate::net::protocol;

/// Drive the simulation at the configured tick rate. Each tick integrates
/// movement and rotation for every player, then fans out one consistent
/// `pos|...` snapshot. With nobody connected the loop just waits out the
/// tick period; it never busy-spins.
pub async fn run(state: AppState) {
    let mut ticker = interval(state.config.tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(
        tick_ms = state.config.tick_interval.as_millis() as u64,
        "Simulation tick loop started"
    );

    loop {
        ticker.tick().await;

        if state.world.is_empty() {
            continue;
        }

        let snapshot = state.world.step_all();
        let msg = protocol::encode_positions(&snapshot);
        let failed = state.broadcaster.broadcast(&msg);
        evict_failed(&state, failed).await;
    }
}
