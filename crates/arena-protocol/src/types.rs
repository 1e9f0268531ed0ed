//! Identifiers, routing targets, and the shared game configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identity of a connected player.
///
/// The server derives it from the connection id, so one session maps to
/// exactly one player. Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identity of a projectile.
///
/// A string because clients may propose their own id when they shoot (it
/// lets them match the confirmed rocket to their local prediction). The
/// server falls back to a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectileId(pub String);

impl ProjectileId {
    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is for.
///
/// Game logic returns `(Recipient, ServerEvent)` pairs and the broadcaster
/// fans them out to connected sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected session, joined or not.
    All,
    /// One session.
    Player(PlayerId),
    /// Every connected session except this one.
    AllExcept(PlayerId),
}

impl Recipient {
    /// Whether a session with id `player` receives this event.
    pub fn includes(&self, player: PlayerId) -> bool {
        match *self {
            Self::All => true,
            Self::Player(target) => target == player,
            Self::AllExcept(excluded) => excluded != player,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Process-wide game settings, fixed at startup and sent to every client in
/// `game-joined`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Side length of the square arena. Playable x/z range is
    /// `[-map_size/2, map_size/2]`.
    pub map_size: f64,
    /// Client-side movement speed. The server trusts reported positions and
    /// only forwards this value.
    pub player_speed: f64,
    /// Projectile speed in units per second.
    pub projectile_speed: f64,
    /// Base explosion damage before falloff.
    pub projectile_damage: u32,
    /// Health on spawn and respawn.
    pub player_health: u32,
    /// Respawn delay in milliseconds.
    pub respawn_time: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_size: 100.0,
            player_speed: 5.0,
            projectile_speed: 50.0,
            projectile_damage: 25,
            player_health: 100,
            respawn_time: 3_000,
        }
    }
}

impl GameConfig {
    /// Half the map side; the arena spans `[-half, half]` on x and z.
    pub fn half_extent(&self) -> f64 {
        self.map_size / 2.0
    }

    /// The respawn delay as a `Duration`.
    pub fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_time)
    }
}

// ---------------------------------------------------------------------------
// Vector serde helpers
// ---------------------------------------------------------------------------

/// Serializes a `glam::DVec3` as `{"x":..,"y":..,"z":..}`.
///
/// glam's own serde support writes arrays, but browser clients send and
/// expect plain `{x, y, z}` objects. Use with `#[serde(with = "xyz")]`.
pub mod xyz {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        x: f64,
        y: f64,
        z: f64,
    }

    pub fn serialize<S: Serializer>(v: &DVec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz {
            x: v.x,
            y: v.y,
            z: v.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DVec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(deserializer)?;
        Ok(DVec3::new(x, y, z))
    }

    /// Same as the parent module for `Option<DVec3>`; pair with
    /// `#[serde(default)]` so the field may be omitted.
    pub mod option {
        use glam::DVec3;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use super::Xyz;

        pub fn serialize<S: Serializer>(v: &Option<DVec3>, serializer: S) -> Result<S::Ok, S::Error> {
            v.map(|v| Xyz {
                x: v.x,
                y: v.y,
                z: v.z,
            })
            .serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DVec3>, D::Error> {
            let v = Option::<Xyz>::deserialize(deserializer)?;
            Ok(v.map(|Xyz { x, y, z }| DVec3::new(x, y, z)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_projectile_id_serializes_as_plain_string() {
        let id = ProjectileId::from("rocket-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"rocket-1\"");
        assert_eq!(id.to_string(), "rocket-1");
    }

    #[test]
    fn test_recipient_includes() {
        let me = PlayerId(1);
        let other = PlayerId(2);
        assert!(Recipient::All.includes(me));
        assert!(Recipient::Player(me).includes(me));
        assert!(!Recipient::Player(me).includes(other));
        assert!(!Recipient::AllExcept(me).includes(me));
        assert!(Recipient::AllExcept(me).includes(other));
    }

    #[test]
    fn test_game_config_defaults() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.map_size, 100.0);
        assert_eq!(cfg.projectile_speed, 50.0);
        assert_eq!(cfg.projectile_damage, 25);
        assert_eq!(cfg.player_health, 100);
        assert_eq!(cfg.respawn_delay(), Duration::from_secs(3));
        assert_eq!(cfg.half_extent(), 50.0);
    }

    #[test]
    fn test_game_config_uses_camel_case_keys() {
        let json = serde_json::to_value(GameConfig::default()).unwrap();
        for key in [
            "mapSize",
            "playerSpeed",
            "projectileSpeed",
            "projectileDamage",
            "playerHealth",
            "respawnTime",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["respawnTime"], 3000);
    }
}
