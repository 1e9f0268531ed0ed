//! Fixed game rules and input sanitizing.
//!
//! The tunable values live in [`GameConfig`](arena_protocol::GameConfig)
//! and are sent to clients. Everything here is server-side only and never
//! changes at runtime.

use std::time::Duration;

/// Minimum time between two accepted shots from the same player.
pub const SHOOT_COOLDOWN: Duration = Duration::from_millis(500);

/// How long a projectile flies before it fizzles out.
pub const PROJECTILE_LIFETIME: Duration = Duration::from_millis(5_000);

/// A projectile closer than this to a living non-owner detonates.
pub const HIT_RADIUS: f64 = 2.0;

/// Splash radius of every explosion.
pub const EXPLOSION_RADIUS: f64 = 8.0;

/// Projectiles above this height hit the ceiling.
pub const CEILING: f64 = 20.0;

/// Height players spawn and respawn at.
pub const SPAWN_HEIGHT: f64 = 5.0;

/// Upward component of the rocket-jump impulse.
pub const ROCKET_JUMP_LIFT: f64 = 15.0;

/// Multiplier on the horizontal offset from the blast for the rocket-jump
/// impulse.
pub const ROCKET_JUMP_PUSH: f64 = 2.0;

pub const MAX_NAME_LEN: usize = 20;
pub const MAX_CHARACTER_LEN: usize = 32;
pub const MAX_CHAT_LEN: usize = 150;

/// Trims a display name and caps it at [`MAX_NAME_LEN`] characters.
/// Returns `None` if nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    non_empty_prefix(raw, MAX_NAME_LEN)
}

/// Caps a character skin tag. An empty tag is allowed; the client picks
/// its default skin.
pub fn sanitize_character(raw: &str) -> String {
    raw.trim().chars().take(MAX_CHARACTER_LEN).collect()
}

/// Trims a chat line and caps it at [`MAX_CHAT_LEN`] characters.
/// Returns `None` if nothing is left.
pub fn sanitize_chat(raw: &str) -> Option<String> {
    non_empty_prefix(raw, MAX_CHAT_LEN)
}

// Counts chars, not bytes: a multibyte name must not be split mid-character.
fn non_empty_prefix(raw: &str, max_chars: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name_trims_and_truncates() {
        assert_eq!(sanitize_name("  Ada  ").as_deref(), Some("Ada"));
        let long = "x".repeat(30);
        assert_eq!(sanitize_name(&long).unwrap().chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_sanitize_name_rejects_blank() {
        assert_eq!(sanitize_name(""), None);
        assert_eq!(sanitize_name("   \t"), None);
    }

    #[test]
    fn test_sanitize_counts_characters_not_bytes() {
        let name = "ö".repeat(25);
        let clean = sanitize_name(&name).unwrap();
        assert_eq!(clean.chars().count(), MAX_NAME_LEN);
        assert_eq!(clean.len(), MAX_NAME_LEN * 2);
    }

    #[test]
    fn test_sanitize_chat_truncates_to_150() {
        let msg = format!("  {}  ", "a".repeat(200));
        assert_eq!(sanitize_chat(&msg).unwrap().len(), MAX_CHAT_LEN);
        assert_eq!(sanitize_chat("   "), None);
    }

    #[test]
    fn test_sanitize_character_allows_empty() {
        assert_eq!(sanitize_character(""), "");
        assert_eq!(sanitize_character(" panda "), "panda");
    }
}
