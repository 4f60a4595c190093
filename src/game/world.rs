//! The player registry and authoritative state store
//!
//! All per-player simulation fields live behind one mutex, so a fire press
//! snapshots the shooter, locks it, resolves the hit, applies damage and
//! score, and flips the death flag in a single critical section. The tick
//! integration and its snapshot share a critical section the same way, which
//! keeps every broadcast internally consistent per player.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{Config, ScorePolicy};
use crate::game::combat::{CombatParams, CombatSystem, HitReport};
use crate::game::physics::Kinematics;
use crate::game::player::{AnimationState, FireLock, MoveKey, PlayerId, PlayerState, RotateIntent};
use crate::net::protocol::PlayerSnapshot;

/// Everything the simulation mutates, under one guard.
struct WorldState {
    next_id: PlayerId,
    players: HashMap<PlayerId, PlayerState>,
    /// Insertion order of currently connected players; drives tick and
    /// broadcast iteration.
    order: Vec<PlayerId>,
    /// Scores of departed players, kept when the policy is `Persist`.
    retained_scores: HashMap<PlayerId, u32>,
}

/// Result of resolving one fire press.
#[derive(Debug, Clone, Copy)]
pub struct ShotOutcome {
    /// `None` when the shot missed everything
    pub hit: Option<HitReport>,
    /// Position and yaw frozen for the duration of the press
    pub lock: FireLock,
}

/// Shared handle to the world store.
pub struct World {
    state: Mutex<WorldState>,
    config: Arc<Config>,
}

impl World {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            state: Mutex::new(WorldState {
                next_id: 1,
                players: HashMap::new(),
                order: Vec::new(),
                retained_scores: HashMap::new(),
            }),
            config,
        }
    }

    /// Allocate the next player id and create its default state.
    pub fn register(&self) -> PlayerId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1).max(1);

        let mut player = PlayerState::new(id);
        if let Some(score) = state.retained_scores.remove(&id) {
            // Only reachable if the id counter ever wraps.
            player.score = score;
        }
        state.players.insert(id, player);
        state.order.push(id);

        info!(player_id = id, online = state.order.len(), "Player registered");
        id
    }

    /// Remove a player and report whether a death notice is still owed.
    pub fn unregister(&self, id: PlayerId) -> bool {
        let mut state = self.state.lock();
        let Some(player) = state.players.remove(&id) else {
            return false;
        };
        state.order.retain(|&p| p != id);
        if self.config.score_policy == ScorePolicy::Persist {
            state.retained_scores.insert(id, player.score);
        }

        info!(player_id = id, online = state.order.len(), "Player unregistered");
        !player.death_sent
    }

    /// Currently connected player ids, in insertion order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.state.lock().order.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().order.is_empty()
    }

    /// Update one movement key. Returns false when the player is gone.
    pub fn apply_key(&self, id: PlayerId, key: MoveKey, pressed: bool) -> bool {
        let mut state = self.state.lock();
        match state.players.get_mut(&id) {
            Some(player) => {
                player.keys.set(key, pressed);
                true
            }
            None => false,
        }
    }

    /// Update the rotation intent. Returns false when the player is gone.
    pub fn apply_rotate(&self, id: PlayerId, intent: RotateIntent) -> bool {
        let mut state = self.state.lock();
        match state.players.get_mut(&id) {
            Some(player) => {
                player.rotate = intent;
                true
            }
            None => false,
        }
    }

    /// Resolve a fire press: freeze the shooter, cast the ray, apply damage
    /// and score, and flip the target's death flag if this shot killed it.
    /// The whole resolution happens before this call returns, so the session
    /// never processes its next message against a half-applied shot.
    pub fn fire_press(&self, shooter: PlayerId) -> Option<ShotOutcome> {
        let params = CombatParams {
            ray_length: self.config.fire_ray_length,
            collision_radius: self.config.collision_radius,
            damage: self.config.fire_damage,
            score_per_hit: self.config.score_per_hit,
        };

        let mut state = self.state.lock();

        let shooter_state = state.players.get_mut(&shooter)?;
        let lock = FireLock {
            x: shooter_state.x,
            y: shooter_state.y,
            yaw: shooter_state.yaw,
        };
        shooter_state.fire_lock = Some(lock);
        shooter_state.animation = AnimationState::Fire;

        let origin = (lock.x, lock.y);
        let direction = Kinematics::forward_vector(lock.yaw);

        let candidates: Vec<(PlayerId, (f32, f32))> = state
            .order
            .iter()
            .filter(|&&id| id != shooter)
            .filter_map(|&id| state.players.get(&id).map(|p| (id, (p.x, p.y))))
            .collect();

        let selected = CombatSystem::select_target(
            origin,
            direction,
            candidates.into_iter(),
            params.collision_radius,
            params.ray_length,
        );

        let hit = selected.map(|(target, distance)| {
            let target_state = state
                .players
                .get_mut(&target)
                .expect("selected target is present under the same guard");
            let (remaining, dead) = CombatSystem::apply_damage(target_state.health, params.damage);
            target_state.health = remaining;
            target_state.just_hit = true;

            let killed = dead && !target_state.death_sent;
            if killed {
                target_state.death_sent = true;
            }

            if let Some(shooter_state) = state.players.get_mut(&shooter) {
                shooter_state.score += params.score_per_hit;
            }

            HitReport {
                shooter,
                target,
                distance,
                remaining_health: remaining,
                killed,
            }
        });

        Some(ShotOutcome { hit, lock })
    }

    /// Release the fire lock; movement and rotation resume next tick.
    pub fn fire_release(&self, id: PlayerId) -> bool {
        let mut state = self.state.lock();
        match state.players.get_mut(&id) {
            Some(player) => {
                player.fire_lock = None;
                true
            }
            None => false,
        }
    }

    /// Advance every player by one tick and return a consistent snapshot,
    /// built under the same guard as the integration.
    pub fn step_all(&self) -> Vec<PlayerSnapshot> {
        let mut state = self.state.lock();
        let order = state.order.clone();

        for id in &order {
            let Some(player) = state.players.get_mut(id) else {
                debug!(player_id = *id, "Player vanished mid-tick, skipping");
                continue;
            };

            if let Some(lock) = player.fire_lock {
                // Pinned to the press-time snapshot; intent changes are
                // ignored until release.
                player.x = lock.x;
                player.y = lock.y;
                player.yaw = lock.yaw;
                player.animation = AnimationState::Fire;
                continue;
            }

            Kinematics::integrate_movement(player, self.config.move_speed, &self.config.map_bounds);
            Kinematics::integrate_rotation(player, self.config.rotate_speed);
            Kinematics::resolve_animation(player);

            player.last_x = player.x;
            player.last_y = player.y;
        }

        order
            .iter()
            .filter_map(|id| state.players.get(id))
            .map(PlayerSnapshot::of)
            .collect()
    }

    /// Snapshot of (id, score) for every connected player, in order.
    pub fn score_rows(&self) -> Vec<(PlayerId, u32)> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.players.get(id).map(|p| (p.id, p.score)))
            .collect()
    }
}
