//! Kill-ordered standings.

use arena_protocol::ScoreEntry;

use crate::player::Player;

/// Builds the scoreboard: kills descending.
///
/// Players are ordered by id first so equal kill counts always come out
/// in the same order, whatever order the input iterator yields.
pub fn standings<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<ScoreEntry> {
    let mut ranked: Vec<&Player> = players.into_iter().collect();
    ranked.sort_by_key(|p| p.id);
    ranked.sort_by(|a, b| b.kills.cmp(&a.kills));
    ranked.into_iter().map(Player::score).collect()
}

#[cfg(test)]
mod tests {
    use arena_protocol::{DVec3, PlayerId};

    use super::*;

    fn player(id: u64, name: &str, kills: u32) -> Player {
        let mut p = Player::new(PlayerId(id), name.into(), String::new(), DVec3::ZERO, 100);
        p.kills = kills;
        p
    }

    #[test]
    fn test_standings_orders_by_kills_then_id() {
        let players = [player(3, "C", 1), player(1, "A", 1), player(2, "B", 4)];
        let names: Vec<_> = standings(players.iter()).into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn test_standings_empty() {
        assert!(standings(std::iter::empty()).is_empty());
    }
}
