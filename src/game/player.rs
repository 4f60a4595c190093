//! Per-player simulation state

/// Player identifier, assigned monotonically at connect time.
pub type PlayerId = u32;

/// Spawn defaults for a freshly connected player.
pub const SPAWN_X: f32 = 500.0;
pub const SPAWN_Y: f32 = 600.0;
pub const SPAWN_Z: f32 = 90.0;
pub const SPAWN_YAW: f32 = 90.0;
pub const INITIAL_HEALTH: u32 = 100;

/// Movement distance per tick above which a player reads as moving.
pub const MOVE_THRESHOLD: f32 = 0.1;

/// Server-computed animation state, broadcast as an integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Move,
    Fire,
    Hit,
}

impl AnimationState {
    /// Wire encoding of the animation state.
    pub fn id(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Move => 1,
            Self::Fire => 2,
            Self::Hit => 3,
        }
    }
}

/// One of the four movement keys a client can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
}

/// Held movement keys, each tracked independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyIntent {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

impl KeyIntent {
    pub fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Back => self.back = pressed,
            MoveKey::StrafeLeft => self.strafe_left = pressed,
            MoveKey::StrafeRight => self.strafe_right = pressed,
        }
    }
}

/// Continuous rotation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateIntent {
    Left,
    Right,
    #[default]
    Stop,
}

/// Position and yaw captured at fire-press time. While a lock is held the
/// owner is pinned to this snapshot every tick.
#[derive(Debug, Clone, Copy)]
pub struct FireLock {
    pub x: f32,
    pub y: f32,
    pub yaw: f32,
}

/// Authoritative state for one connected player.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,

    // Position and orientation
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub pitch: f32,
    /// Yaw in degrees, normalized to [0, 360)
    pub yaw: f32,

    // Combat
    pub health: u32,
    pub score: u32,
    pub fire_lock: Option<FireLock>,
    /// One-tick marker: set when a shot lands, consumed by the next tick's
    /// animation resolution.
    pub just_hit: bool,
    /// Irreversible once set; guards against duplicate death notices.
    pub death_sent: bool,

    // Intent
    pub keys: KeyIntent,
    pub rotate: RotateIntent,

    // Animation
    pub animation: AnimationState,
    pub last_x: f32,
    pub last_y: f32,
}

impl PlayerState {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            x: SPAWN_X,
            y: SPAWN_Y,
            z: SPAWN_Z,
            roll: 0.0,
            pitch: 0.0,
            yaw: SPAWN_YAW,
            health: INITIAL_HEALTH,
            score: 0,
            fire_lock: None,
            just_hit: false,
            death_sent: false,
            keys: KeyIntent::default(),
            rotate: RotateIntent::default(),
            animation: AnimationState::Idle,
            last_x: SPAWN_X,
            last_y: SPAWN_Y,
        }
    }

    pub fn is_fire_locked(&self) -> bool {
        self.fire_lock.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_defaults() {
        let p = PlayerState::new(7);
        assert_eq!(p.id, 7);
        assert_eq!((p.x, p.y, p.z), (500.0, 600.0, 90.0));
        assert_eq!(p.yaw, 90.0);
        assert_eq!(p.health, 100);
        assert_eq!(p.score, 0);
        assert_eq!(p.animation, AnimationState::Idle);
        assert!(!p.is_fire_locked());
        assert!(!p.death_sent);
    }

    #[test]
    fn animation_wire_ids() {
        assert_eq!(AnimationState::Idle.id(), 0);
        assert_eq!(AnimationState::Move.id(), 1);
        assert_eq!(AnimationState::Fire.id(), 2);
        assert_eq!(AnimationState::Hit.id(), 3);
    }

    #[test]
    fn key_intent_tracks_independent_keys() {
        let mut keys = KeyIntent::default();
        keys.set(MoveKey::Forward, true);
        keys.set(MoveKey::StrafeRight, true);
        assert!(keys.forward && keys.strafe_right);
        assert!(!keys.back && !keys.strafe_left);
        keys.set(MoveKey::Forward, false);
        assert!(!keys.forward);
        assert!(keys.strafe_right);
    }
}
