//! Player kinematics and movement constraints

use crate::config::MapBounds;
use crate::game::player::{AnimationState, PlayerState, RotateIntent, MOVE_THRESHOLD};

/// Kinematics for the fixed-tick integrator
pub struct Kinematics;

impl Kinematics {
    /// Forward unit vector in the horizontal plane for a yaw in degrees.
    /// A degenerate (zero-magnitude) result maps to the zero vector.
    pub fn forward_vector(yaw_deg: f32) -> (f32, f32) {
        let yaw_rad = yaw_deg.to_radians();
        let fx = yaw_rad.cos();
        let fy = yaw_rad.sin();
        let magnitude = fx.hypot(fy);
        if magnitude > 0.0 {
            (fx / magnitude, fy / magnitude)
        } else {
            (0.0, 0.0)
        }
    }

    /// Right unit vector, perpendicular to the forward vector.
    pub fn right_vector(forward: (f32, f32)) -> (f32, f32) {
        (-forward.1, forward.0)
    }

    /// Integrate one tick of movement from held keys, clamping into bounds.
    pub fn integrate_movement(player: &mut PlayerState, speed: f32, bounds: &MapBounds) {
        let forward = Self::forward_vector(player.yaw);
        let right = Self::right_vector(forward);

        let mut dx = 0.0;
        let mut dy = 0.0;
        if player.keys.forward {
            dx += forward.0 * speed;
            dy += forward.1 * speed;
        }
        if player.keys.back {
            dx -= forward.0 * speed;
            dy -= forward.1 * speed;
        }
        if player.keys.strafe_left {
            dx -= right.0 * speed;
            dy -= right.1 * speed;
        }
        if player.keys.strafe_right {
            dx += right.0 * speed;
            dy += right.1 * speed;
        }

        player.x = bounds.clamp_x(player.x + dx);
        player.y = bounds.clamp_y(player.y + dy);
    }

    /// Integrate one tick of rotation from the current intent.
    pub fn integrate_rotation(player: &mut PlayerState, rotate_speed: f32) {
        match player.rotate {
            RotateIntent::Left => player.yaw -= rotate_speed,
            RotateIntent::Right => player.yaw += rotate_speed,
            RotateIntent::Stop => {}
        }
        player.yaw = Self::normalize_yaw(player.yaw);
    }

    /// Normalize a yaw in degrees into [0, 360).
    pub fn normalize_yaw(yaw: f32) -> f32 {
        yaw.rem_euclid(360.0)
    }

    /// Resolve the animation for a player that moved this tick.
    /// A pending hit marker wins for exactly one tick, then movement
    /// distance decides between Move and Idle.
    pub fn resolve_animation(player: &mut PlayerState) {
        if player.just_hit {
            player.animation = AnimationState::Hit;
            player.just_hit = false;
        } else {
            let moved = (player.x - player.last_x).hypot(player.y - player.last_y);
            player.animation = if moved > MOVE_THRESHOLD {
                AnimationState::Move
            } else {
                AnimationState::Idle
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::MoveKey;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn forward_vector_is_unit_length() {
        for yaw in [0.0, 37.5, 90.0, 180.0, 269.9, 359.0, -45.0, 720.0] {
            let (fx, fy) = Kinematics::forward_vector(yaw);
            assert_approx_eq!(fx.hypot(fy), 1.0, 1e-5);
        }
    }

    #[test]
    fn forward_vector_cardinal_directions() {
        let (fx, fy) = Kinematics::forward_vector(0.0);
        assert_approx_eq!(fx, 1.0, 1e-5);
        assert_approx_eq!(fy, 0.0, 1e-5);

        let (fx, fy) = Kinematics::forward_vector(90.0);
        assert_approx_eq!(fx, 0.0, 1e-5);
        assert_approx_eq!(fy, 1.0, 1e-5);
    }

    #[test]
    fn movement_clamps_to_bounds() {
        let bounds = MapBounds::default();
        let mut player = PlayerState::new(1);
        player.x = 100.5;
        player.y = 100.5;
        player.yaw = 180.0; // facing -x
        player.keys.set(MoveKey::Forward, true);
        player.keys.set(MoveKey::StrafeRight, true); // pushes toward -y at yaw 180

        for _ in 0..100 {
            Kinematics::integrate_movement(&mut player, 2.5, &bounds);
            assert!(player.x >= bounds.min_x && player.x <= bounds.max_x);
            assert!(player.y >= bounds.min_y && player.y <= bounds.max_y);
        }
        assert_approx_eq!(player.x, 100.0, 1e-4);
        assert_approx_eq!(player.y, 100.0, 1e-4);
    }

    #[test]
    fn opposing_keys_cancel() {
        let bounds = MapBounds::default();
        let mut player = PlayerState::new(1);
        player.keys.set(MoveKey::Forward, true);
        player.keys.set(MoveKey::Back, true);
        let (x0, y0) = (player.x, player.y);
        Kinematics::integrate_movement(&mut player, 2.5, &bounds);
        assert_approx_eq!(player.x, x0, 1e-5);
        assert_approx_eq!(player.y, y0, 1e-5);
    }

    #[test]
    fn rotation_wraps_into_range() {
        let mut player = PlayerState::new(1);
        player.yaw = 1.0;
        player.rotate = RotateIntent::Left;
        Kinematics::integrate_rotation(&mut player, 3.0);
        assert_approx_eq!(player.yaw, 358.0, 1e-4);

        player.yaw = 359.0;
        player.rotate = RotateIntent::Right;
        Kinematics::integrate_rotation(&mut player, 3.0);
        assert_approx_eq!(player.yaw, 2.0, 1e-4);

        player.rotate = RotateIntent::Stop;
        let yaw = player.yaw;
        Kinematics::integrate_rotation(&mut player, 3.0);
        assert_approx_eq!(player.yaw, yaw, 1e-6);
    }

    #[test]
    fn hit_marker_wins_for_one_resolution() {
        let mut player = PlayerState::new(1);
        player.just_hit = true;
        player.x = player.last_x + 5.0; // would otherwise read as Move
        Kinematics::resolve_animation(&mut player);
        assert_eq!(player.animation, AnimationState::Hit);
        assert!(!player.just_hit);

        Kinematics::resolve_animation(&mut player);
        assert_eq!(player.animation, AnimationState::Move);
    }

    #[test]
    fn idle_below_move_threshold() {
        let mut player = PlayerState::new(1);
        player.x = player.last_x + 0.05;
        Kinematics::resolve_animation(&mut player);
        assert_eq!(player.animation, AnimationState::Idle);
    }
}
