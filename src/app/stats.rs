//! Once-per-second stats observer
//!
//! Pure observer of the counters and the store; it never influences the
//! simulation.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::interval;
use tracing::info;

use crate::app::AppState;
use crate::util::time::uptime_secs;

pub async fn run(state: AppState) {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let commands = state.metrics.commands.swap(0, Ordering::Relaxed);
        let malformed = state.metrics.malformed.swap(0, Ordering::Relaxed);
        let rate_limited = state.metrics.rate_limited.swap(0, Ordering::Relaxed);
        let online = state.broadcaster.online();

        if online == 0 && commands == 0 && malformed == 0 && rate_limited == 0 {
            continue;
        }

        info!(
            uptime_secs = uptime_secs(),
            online,
            commands_per_sec = commands,
            malformed_per_sec = malformed,
            rate_limited_per_sec = rate_limited,
            "Server stats"
        );
    }
}
