//! Broadcast fan-out and the periodic broadcast jobs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::app::AppState;
use crate::game::player::PlayerId;
use crate::net::protocol;
use crate::net::session;

/// Outbound half of one live connection. The writer task drains the queue
/// onto the socket and raises the failure flag on the first send error.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub player_id: PlayerId,
    tx: mpsc::Sender<String>,
    failed: Arc<AtomicBool>,
}

impl ConnectionHandle {
    pub fn new(player_id: PlayerId, tx: mpsc::Sender<String>, failed: Arc<AtomicBool>) -> Self {
        Self {
            player_id,
            tx,
            failed,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    /// Queue one message. Returns false when the connection is gone.
    /// A full queue means a lagging client; the message is dropped rather
    /// than blocking the caller.
    pub fn send(&self, msg: String) -> bool {
        if self.has_failed() {
            return false;
        }
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(player_id = self.player_id, "Outbound queue full, dropping message");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// The fan-out table of live connections, keyed by player id.
#[derive(Default)]
pub struct Broadcaster {
    connections: DashMap<PlayerId, ConnectionHandle>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: ConnectionHandle) {
        self.connections.insert(handle.player_id, handle);
    }

    pub fn remove(&self, id: PlayerId) -> Option<ConnectionHandle> {
        self.connections.remove(&id).map(|(_, h)| h)
    }

    pub fn online(&self) -> usize {
        self.connections.len()
    }

    /// Attempt one send to every live connection; return the ids whose
    /// connections failed so the caller can evict them exactly once.
    pub fn broadcast(&self, msg: &str) -> Vec<PlayerId> {
        let mut failed = Vec::new();
        for entry in self.connections.iter() {
            if !entry.value().send(msg.to_string()) {
                failed.push(entry.value().player_id);
            }
        }
        failed
    }

    /// Connections whose writer has already raised the failure flag.
    pub fn failed_connections(&self) -> Vec<PlayerId> {
        self.connections
            .iter()
            .filter(|e| e.value().has_failed())
            .map(|e| e.value().player_id)
            .collect()
    }
}

/// Tear down every connection that failed during a fan-out pass.
pub async fn evict_failed(state: &AppState, failed: Vec<PlayerId>) {
    for id in failed {
        warn!(player_id = id, "Evicting connection after send failure");
        session::teardown(state, id).await;
    }
}

/// Periodic score broadcast: snapshot every live player's score and fan it
/// out on a fixed cadence.
pub async fn score_loop(state: AppState) {
    let mut ticker = interval(state.config.score_broadcast_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(
        interval_secs = state.config.score_broadcast_interval.as_secs(),
        "Score broadcaster started"
    );

    loop {
        ticker.tick().await;
        if state.world.is_empty() {
            continue;
        }
        let rows = state.world.score_rows();
        let msg = protocol::encode_scores(&rows);
        let failed = state.broadcaster.broadcast(&msg);
        evict_failed(&state, failed).await;
    }
}

/// Coarse-interval liveness sweep: evict any connection whose writer has
/// failed since the last broadcast touched it.
pub async fn health_monitor(state: AppState) {
    let mut ticker = interval(state.config.health_check_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(
        interval_secs = state.config.health_check_interval.as_secs(),
        "Connection health monitor started"
    );

    loop {
        ticker.tick().await;
        let dead = state.broadcaster.failed_connections();
        if !dead.is_empty() {
            info!(count = dead.len(), "Health sweep found dead connections");
            evict_failed(&state, dead).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: PlayerId, capacity: usize) -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let h = ConnectionHandle::new(id, tx, Arc::new(AtomicBool::new(false)));
        (h, rx)
    }

    #[tokio::test]
    async fn broadcast_collects_closed_connections() {
        let broadcaster = Broadcaster::new();
        let (alive, mut rx) = handle(1, 4);
        broadcaster.insert(alive);

        let (dead, dead_rx) = handle(2, 4);
        broadcaster.insert(dead);
        drop(dead_rx); // peer 2 went away

        let failed = broadcaster.broadcast("pos|0");
        assert_eq!(failed, vec![2]);
        assert_eq!(rx.recv().await.as_deref(), Some("pos|0"));
    }

    #[tokio::test]
    async fn full_queue_drops_without_marking_failure() {
        let broadcaster = Broadcaster::new();
        let (lagging, mut rx) = handle(1, 1);
        broadcaster.insert(lagging);

        assert!(broadcaster.broadcast("a").is_empty());
        assert!(broadcaster.broadcast("b").is_empty()); // dropped, not failed
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert!(broadcaster.failed_connections().is_empty());
    }

    #[tokio::test]
    async fn failed_flag_surfaces_in_sweep() {
        let broadcaster = Broadcaster::new();
        let flag = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = mpsc::channel(4);
        broadcaster.insert(ConnectionHandle::new(3, tx, flag.clone()));

        assert!(broadcaster.failed_connections().is_empty());
        flag.store(true, Ordering::Relaxed);
        assert_eq!(broadcaster.failed_connections(), vec![3]);
        // A failed handle refuses further sends.
        assert_eq!(broadcaster.broadcast("s|0"), vec![3]);
    }
}
