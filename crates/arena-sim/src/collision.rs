//! Pure collision and explosion math.
//!
//! No state lives here. The [`World`](crate::World) decides who is
//! affected; these functions only answer geometric questions.

use arena_protocol::DVec3;

use crate::rules::{CEILING, HIT_RADIUS, ROCKET_JUMP_LIFT, ROCKET_JUMP_PUSH};

/// Whether `position` is outside the playable volume.
///
/// The arena spans `[-half_extent, half_extent]` on x and z, and
/// `(0, CEILING]` on y. Touching the ground counts as a hit.
pub fn out_of_bounds(position: DVec3, half_extent: f64) -> bool {
    position.x.abs() > half_extent
        || position.z.abs() > half_extent
        || position.y <= 0.0
        || position.y > CEILING
}

/// Whether a projectile at `projectile` is close enough to detonate on a
/// player standing at `player`.
pub fn is_direct_hit(projectile: DVec3, player: DVec3) -> bool {
    projectile.distance(player) < HIT_RADIUS
}

/// Splash damage at `distance` from the blast center.
///
/// Linear falloff from `base` at the center to nothing at `radius`,
/// rounded down. `None` when the target is out of range or the rounded
/// damage is zero.
pub fn splash_damage(base: u32, distance: f64, radius: f64) -> Option<u32> {
    if distance.is_nan() || distance >= radius {
        return None;
    }
    let multiplier = 1.0 - distance / radius;
    // The multiplier is in (0, 1], so the product fits back into u32.
    let damage = (f64::from(base) * multiplier).floor() as u32;
    (damage > 0).then_some(damage)
}

/// Whether an owner caught in their own blast gets a rocket-jump impulse.
pub fn within_self_jump(distance: f64, radius: f64) -> bool {
    distance < radius / 2.0
}

/// Rocket-jump impulse for a player at `player` from a blast at `center`:
/// a fixed lift plus a push away from the blast on x and z.
pub fn rocket_jump_force(player: DVec3, center: DVec3) -> DVec3 {
    DVec3::new(
        (player.x - center.x) * ROCKET_JUMP_PUSH,
        ROCKET_JUMP_LIFT,
        (player.z - center.z) * ROCKET_JUMP_PUSH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_edges() {
        let half = 50.0;
        assert!(!out_of_bounds(DVec3::new(50.0, 1.0, -50.0), half));
        assert!(out_of_bounds(DVec3::new(50.1, 1.0, 0.0), half));
        assert!(out_of_bounds(DVec3::new(0.0, 1.0, -50.1), half));
        assert!(out_of_bounds(DVec3::new(0.0, 0.0, 0.0), half));
        assert!(!out_of_bounds(DVec3::new(0.0, 20.0, 0.0), half));
        assert!(out_of_bounds(DVec3::new(0.0, 20.01, 0.0), half));
    }

    #[test]
    fn test_direct_hit_is_strictly_inside_radius() {
        let player = DVec3::new(0.0, 5.0, 0.0);
        assert!(is_direct_hit(DVec3::new(1.9, 5.0, 0.0), player));
        assert!(!is_direct_hit(DVec3::new(2.0, 5.0, 0.0), player));
    }

    #[test]
    fn test_splash_damage_falloff() {
        assert_eq!(splash_damage(25, 0.0, 8.0), Some(25));
        assert_eq!(splash_damage(25, 3.0, 8.0), Some(15));
        assert_eq!(splash_damage(25, 6.0, 8.0), Some(6));
        assert_eq!(splash_damage(25, 8.0, 8.0), None);
        assert_eq!(splash_damage(25, 12.0, 8.0), None);
    }

    #[test]
    fn test_splash_damage_skips_zero_after_flooring() {
        // 25 * (1 - 7.8/8) = 0.625, floored to 0.
        assert_eq!(splash_damage(25, 7.8, 8.0), None);
    }

    #[test]
    fn test_splash_damage_rejects_nan_distance() {
        assert_eq!(splash_damage(25, f64::NAN, 8.0), None);
    }

    #[test]
    fn test_self_jump_range() {
        assert!(within_self_jump(3.9, 8.0));
        assert!(!within_self_jump(4.0, 8.0));
    }

    #[test]
    fn test_rocket_jump_force() {
        let force = rocket_jump_force(DVec3::new(1.0, 5.0, -2.0), DVec3::new(0.0, 4.0, 0.0));
        assert_eq!(force, DVec3::new(2.0, 15.0, -4.0));
    }
}
