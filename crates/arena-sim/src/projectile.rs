//! Authoritative per-shot record.

use std::fmt;
use std::time::Duration;

use arena_protocol::{DVec3, PlayerId, ProjectileFired, ProjectileId};

/// A rocket in flight.
///
/// Lives in the world's projectile map from the accepted shot until
/// exactly one terminal [`Fate`].
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    /// The shooter. Kept even after the shooter disconnects.
    pub owner: PlayerId,
    pub position: DVec3,
    /// Unit length.
    pub direction: DVec3,
    pub speed: f64,
    pub damage: u32,
    /// Game time of the accepted shot.
    pub spawned_at: Duration,
    pub lifetime: Duration,
    /// Spawn order; the tick visits projectiles in this order.
    pub(crate) seq: u64,
}

impl Projectile {
    pub(crate) fn advance(&mut self, dt: f64) {
        self.position += self.direction * self.speed * dt;
    }

    /// Whether the lifetime budget is used up at game time `now`.
    pub fn is_expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.spawned_at) >= self.lifetime
    }

    pub fn fired(&self) -> ProjectileFired {
        ProjectileFired {
            id: self.id.clone(),
            player_id: self.owner,
            position: self.position,
            direction: self.direction,
        }
    }
}

/// How a projectile left the world.
///
/// Terminal: a removed projectile is never seen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Ran out of lifetime.
    Expired,
    /// Left the map, hit the ground, or hit the ceiling.
    WallExploded,
    /// Came within hit range of this player.
    PlayerExploded(PlayerId),
}

impl fmt::Display for Fate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::WallExploded => write!(f, "wall"),
            Self::PlayerExploded(target) => write!(f, "direct hit on {target}"),
        }
    }
}
