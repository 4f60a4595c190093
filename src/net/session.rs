//! Per-connection session lifecycle
//!
//! Each accepted socket gets a registered player id, a writer task draining
//! an outbound queue, and a reader loop that applies decoded commands to the
//! world store. Teardown runs exactly once per connection and owes the rest
//! of the arena a death notice if combat never announced one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::player::PlayerId;
use crate::net::broadcast::ConnectionHandle;
use crate::net::protocol::{self, ClientCommand};
use crate::util::rate_limit::SessionRateLimiter;

/// Outbound queue depth per connection.
const OUTBOUND_QUEUE: usize = 64;

/// Accept clients forever, one session task per connection.
pub async fn run_listener(listener: TcpListener, state: AppState) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    handle_connection(stream, addr, state).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Run one client session from accept to teardown.
async fn handle_connection(stream: TcpStream, addr: std::net::SocketAddr, state: AppState) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%addr, error = %e, "Could not set TCP_NODELAY");
    }
    let (read_half, write_half) = stream.into_split();

    let player_id = state.world.register();
    let failed = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let handle = ConnectionHandle::new(player_id, tx, failed.clone());
    state.broadcaster.insert(handle.clone());

    let writer = tokio::spawn(write_loop(write_half, rx, failed, player_id));

    info!(%addr, player_id, "Client connected");

    // Identity assignment is the first thing on the wire.
    if handle.send(protocol::encode_welcome(player_id)) {
        read_loop(read_half, &state, player_id).await;
    } else {
        warn!(player_id, "Could not send identity, dropping connection");
    }

    writer.abort();
    teardown(&state, player_id).await;
}

/// Drain the outbound queue onto the socket. `write_all` retries partial
/// writes within a message; the first hard failure raises the flag and
/// stops the task.
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::Receiver<String>,
    failed: Arc<AtomicBool>,
    player_id: PlayerId,
) {
    while let Some(msg) = rx.recv().await {
        let mut bytes = msg.into_bytes();
        bytes.push(b'\n');
        if let Err(e) = write_half.write_all(&bytes).await {
            debug!(player_id, error = %e, "Socket write failed");
            failed.store(true, Ordering::Relaxed);
            break;
        }
    }
}

/// Read newline-framed messages and apply them until the peer goes away.
async fn read_loop(read_half: OwnedReadHalf, state: &AppState, player_id: PlayerId) {
    let limiter = SessionRateLimiter::new(
        state.config.tick_interval,
        state.config.max_msgs_per_tick,
        state.config.max_msgs_per_second,
    );
    let mut lines = BufReader::new(read_half).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                // Budget is consumed before decoding, malformed or not.
                if !limiter.check() {
                    state.metrics.rate_limited.fetch_add(1, Ordering::Relaxed);
                    debug!(player_id, "Message over rate budget, dropped");
                    continue;
                }

                match protocol::decode(&line) {
                    Ok(cmd) => {
                        state.metrics.commands.fetch_add(1, Ordering::Relaxed);
                        apply_command(state, player_id, cmd).await;
                    }
                    Err(e) => {
                        state.metrics.malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(player_id, error = %e, "Dropping malformed message");
                    }
                }
            }
            Ok(None) => {
                info!(player_id, "Client closed connection");
                break;
            }
            Err(e) => {
                warn!(player_id, error = %e, "Socket read failed");
                break;
            }
        }
    }
}

/// Apply one decoded command to the store. A fire press resolves fully
/// (lock plus hit detection) before this returns, so the session never
/// reads its next message against a half-applied shot.
async fn apply_command(state: &AppState, player_id: PlayerId, cmd: ClientCommand) {
    match cmd {
        ClientCommand::Key { key, pressed } => {
            if !state.world.apply_key(player_id, key, pressed) {
                debug!(player_id, "Key intent for absent player, ignored");
            }
        }
        ClientCommand::Rotate(intent) => {
            if !state.world.apply_rotate(player_id, intent) {
                debug!(player_id, "Rotation intent for absent player, ignored");
            }
        }
        ClientCommand::FirePressed => {
            let Some(outcome) = state.world.fire_press(player_id) else {
                debug!(player_id, "Fire press for absent player, ignored");
                return;
            };
            debug!(
                player_id,
                lock_x = outcome.lock.x,
                lock_y = outcome.lock.y,
                lock_yaw = outcome.lock.yaw,
                "Fire lock engaged"
            );
            match outcome.hit {
                Some(hit) => {
                    info!(
                        shooter = hit.shooter,
                        target = hit.target,
                        distance = hit.distance,
                        remaining_health = hit.remaining_health,
                        "Shot hit"
                    );
                    if hit.killed {
                        announce_death(state, hit.target).await;
                    }
                }
                None => {
                    debug!(player_id, "Shot missed");
                }
            }
        }
        ClientCommand::FireReleased => {
            if !state.world.fire_release(player_id) {
                debug!(player_id, "Fire release for absent player, ignored");
            }
        }
    }
}

/// Broadcast the one-shot death notice for a player whose health hit zero.
/// The player stays connected; only the notice goes out.
pub async fn announce_death(state: &AppState, player_id: PlayerId) {
    info!(player_id, "Broadcasting death notice");
    let failed = state.broadcaster.broadcast(&protocol::encode_death(player_id));
    for id in failed {
        teardown(state, id).await;
    }
}

/// Tear a session down exactly once: drop the fan-out entry, destroy the
/// player state, and emit the death notice if combat never did. Connections
/// that fail during that final broadcast are torn down in the same pass.
pub async fn teardown(state: &AppState, player_id: PlayerId) {
    let mut pending = vec![player_id];
    while let Some(id) = pending.pop() {
        // The fan-out entry is the idempotence gate.
        if state.broadcaster.remove(id).is_none() {
            continue;
        }

        let notice_owed = state.world.unregister(id);
        if notice_owed {
            let failed = state.broadcaster.broadcast(&protocol::encode_death(id));
            pending.extend(failed);
        }

        info!(
            player_id = id,
            online = state.broadcaster.online(),
            "Session closed"
        );
    }
}
