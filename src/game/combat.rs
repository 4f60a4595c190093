//! Hitscan combat - ray casting, damage, death notices

use crate::game::player::PlayerId;

/// Combat tunables for one shot resolution.
#[derive(Debug, Clone, Copy)]
pub struct CombatParams {
    /// Maximum distance a shot can travel
    pub ray_length: f32,
    /// Radius of the target collision sphere
    pub collision_radius: f32,
    /// Health removed from the target
    pub damage: u32,
    /// Score awarded to the shooter
    pub score_per_hit: u32,
}

/// Outcome of a registered hit.
#[derive(Debug, Clone, Copy)]
pub struct HitReport {
    pub shooter: PlayerId,
    pub target: PlayerId,
    /// Distance along the ray to the first intersection
    pub distance: f32,
    /// Target health after the damage was applied
    pub remaining_health: u32,
    /// True exactly once per target: the shot that drove health to zero
    pub killed: bool,
}

/// Hitscan resolution for fire events
pub struct CombatSystem;

impl CombatSystem {
    /// 2D ray vs sphere test in the horizontal plane.
    ///
    /// Returns the distance along the ray to the first intersection, or
    /// `None` when the sphere is behind the ray, farther off-axis than the
    /// radius (tangency counts as a hit), or beyond `max_length`.
    pub fn ray_sphere_intersection(
        origin: (f32, f32),
        direction: (f32, f32),
        center: (f32, f32),
        radius: f32,
        max_length: f32,
    ) -> Option<f32> {
        let to_center = (center.0 - origin.0, center.1 - origin.1);

        // Projection of the center offset onto the ray direction
        let tca = to_center.0 * direction.0 + to_center.1 * direction.1;
        if tca < 0.0 {
            return None;
        }

        // Squared perpendicular distance from the center to the ray
        let d2 = (to_center.0 * to_center.0 + to_center.1 * to_center.1) - tca * tca;
        if d2 > radius * radius {
            return None;
        }

        let thc = (radius * radius - d2).sqrt();
        let t0 = tca - thc;
        let t1 = tca + thc;

        // Nearest positive root
        let t = if t0 > 0.0 { t0 } else { t1 };
        if t > max_length {
            return None;
        }

        Some(t)
    }

    /// Select the closest candidate along the ray among all accepted hits.
    /// Closest target wins; a body blocks shots at anything behind it.
    pub fn select_target(
        origin: (f32, f32),
        direction: (f32, f32),
        candidates: impl Iterator<Item = (PlayerId, (f32, f32))>,
        radius: f32,
        max_length: f32,
    ) -> Option<(PlayerId, f32)> {
        let mut closest: Option<(PlayerId, f32)> = None;
        for (id, center) in candidates {
            if let Some(t) =
                Self::ray_sphere_intersection(origin, direction, center, radius, max_length)
            {
                if closest.map_or(true, |(_, best)| t < best) {
                    closest = Some((id, t));
                }
            }
        }
        closest
    }

    /// Apply damage to health, floored at zero. Returns (new_health, dead).
    pub fn apply_damage(health: u32, damage: u32) -> (u32, bool) {
        let new_health = health.saturating_sub(damage);
        (new_health, new_health == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const RAY: f32 = 1000.0;
    const RADIUS: f32 = 50.0;

    #[test]
    fn direct_hit_along_positive_x() {
        let t = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (1.0, 0.0),
            (200.0, 0.0),
            RADIUS,
            RAY,
        )
        .expect("should hit");
        assert_approx_eq!(t, 150.0, 1e-3);
    }

    #[test]
    fn target_behind_ray_is_rejected() {
        let hit = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (1.0, 0.0),
            (-200.0, 0.0),
            RADIUS,
            RAY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn tangent_ray_counts_as_hit() {
        // Perpendicular distance exactly equals the radius.
        let hit = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (1.0, 0.0),
            (300.0, RADIUS),
            RADIUS,
            RAY,
        );
        assert!(hit.is_some());
        assert_approx_eq!(hit.unwrap(), 300.0, 1e-2);
    }

    #[test]
    fn just_past_tangent_misses() {
        let hit = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (1.0, 0.0),
            (300.0, RADIUS + 0.1),
            RADIUS,
            RAY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn beyond_ray_length_misses() {
        let hit = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (1.0, 0.0),
            (RAY + RADIUS + 1.0, 0.0),
            RADIUS,
            RAY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn nearest_target_wins_no_penetration() {
        let candidates = vec![(2u32, (600.0, 0.0)), (3u32, (200.0, 0.0))];
        let (id, t) = CombatSystem::select_target(
            (0.0, 0.0),
            (1.0, 0.0),
            candidates.into_iter(),
            RADIUS,
            RAY,
        )
        .expect("should hit the near target");
        assert_eq!(id, 3);
        assert_approx_eq!(t, 150.0, 1e-3);
    }

    #[test]
    fn zero_direction_never_hits() {
        let hit = CombatSystem::ray_sphere_intersection(
            (0.0, 0.0),
            (0.0, 0.0),
            (200.0, 0.0),
            RADIUS,
            RAY,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn damage_floors_at_zero() {
        assert_eq!(CombatSystem::apply_damage(100, 2), (98, false));
        assert_eq!(CombatSystem::apply_damage(1, 2), (0, true));
        assert_eq!(CombatSystem::apply_damage(0, 2), (0, true));
    }
}
