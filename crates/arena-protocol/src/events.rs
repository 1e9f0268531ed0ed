//! Client and server events.
//!
//! Every frame is a JSON object naming the event and carrying its payload:
//!
//! ```text
//! {"event": "player-shoot", "data": {"position": {...}, "direction": {...}}}
//! {"event": "player-left",  "data": 7}
//! ```
//!
//! This is serde's "adjacently tagged" representation. Event names are
//! kebab-case and payload fields camelCase, which is what the browser
//! client already uses.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::xyz;
use crate::{GameConfig, PlayerId, ProjectileId};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Enter the arena as a new player.
    JoinGame(JoinRequest),
    /// Client-reported kinematic state.
    PlayerMove(MoveInput),
    /// Fire a rocket.
    PlayerShoot(ShootInput),
    /// Say something to everyone.
    ChatMessage(ChatInput),
    /// Keep-alive and clock sync. Answered with `heartbeat-ack`.
    Heartbeat(Heartbeat),
    /// Leave and close the connection.
    Disconnect,
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinGame(_) => "join-game",
            Self::PlayerMove(_) => "player-move",
            Self::PlayerShoot(_) => "player-shoot",
            Self::ChatMessage(_) => "chat-message",
            Self::Heartbeat(_) => "heartbeat",
            Self::Disconnect => "disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    #[serde(default)]
    pub character: String,
}

/// Kinematic state as the client sees it. `velocity` and `isCrouching` are
/// optional; when missing the server keeps its last known value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInput {
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub rotation: DVec3,
    #[serde(default, with = "xyz::option", skip_serializing_if = "Option::is_none")]
    pub velocity: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_crouching: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootInput {
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub direction: DVec3,
    /// Client-proposed projectile id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub client_time: u64,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent only to the joining player: its id, the config, and the full
    /// roster including itself.
    GameJoined(GameJoined),
    /// A new player, sent to everyone else.
    PlayerJoined(PlayerSnapshot),
    PlayerLeft(PlayerId),
    PlayerMoved(PlayerMoved),
    ProjectileFired(ProjectileFired),
    ProjectileExpired(ProjectileId),
    ProjectileExploded(ProjectileExploded),
    PlayerHit(PlayerHit),
    PlayerKilled(PlayerKilled),
    PlayerRespawned(PlayerSnapshot),
    /// Impulse for a player caught in the inner half of their own blast.
    RocketJump(RocketJump),
    ChatMessage(ChatLine),
    /// Ordered by kills, most first.
    ScoreboardUpdate(Vec<ScoreEntry>),
    HeartbeatAck(HeartbeatAck),
}

impl ServerEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameJoined(_) => "game-joined",
            Self::PlayerJoined(_) => "player-joined",
            Self::PlayerLeft(_) => "player-left",
            Self::PlayerMoved(_) => "player-moved",
            Self::ProjectileFired(_) => "projectile-fired",
            Self::ProjectileExpired(_) => "projectile-expired",
            Self::ProjectileExploded(_) => "projectile-exploded",
            Self::PlayerHit(_) => "player-hit",
            Self::PlayerKilled(_) => "player-killed",
            Self::PlayerRespawned(_) => "player-respawned",
            Self::RocketJump(_) => "rocket-jump",
            Self::ChatMessage(_) => "chat-message",
            Self::ScoreboardUpdate(_) => "scoreboard-update",
            Self::HeartbeatAck(_) => "heartbeat-ack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameJoined {
    pub player_id: PlayerId,
    pub config: GameConfig,
    pub players: Vec<PlayerSnapshot>,
}

/// Everything a client needs to draw and label a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub character: String,
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub rotation: DVec3,
    #[serde(with = "xyz")]
    pub velocity: DVec3,
    pub is_crouching: bool,
    pub health: u32,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
    pub damage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoved {
    pub id: PlayerId,
    pub name: String,
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub rotation: DVec3,
    #[serde(with = "xyz")]
    pub velocity: DVec3,
    pub is_crouching: bool,
    pub alive: bool,
    pub health: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileFired {
    pub id: ProjectileId,
    pub player_id: PlayerId,
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub direction: DVec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileExploded {
    pub id: ProjectileId,
    #[serde(with = "xyz")]
    pub position: DVec3,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHit {
    pub player_id: PlayerId,
    pub damage: u32,
    /// Health after the hit, never below zero.
    pub health: u32,
    pub killed: bool,
    pub attacker_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerKilled {
    pub player_id: PlayerId,
    pub killer_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocketJump {
    pub player_id: PlayerId,
    #[serde(with = "xyz")]
    pub force: DVec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub player_id: PlayerId,
    pub player_name: String,
    pub message: String,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatAck {
    pub client_time: u64,
    /// Server wall clock, Unix milliseconds.
    pub server_time: u64,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client matches on exact event names and field names, so
    //! these tests pin the JSON shapes.

    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> ClientEvent {
        serde_json::from_value(value).expect("should decode")
    }

    #[test]
    fn test_join_game_decodes() {
        let event = decode(json!({
            "event": "join-game",
            "data": { "name": "Ada", "character": "panda" }
        }));
        assert_eq!(
            event,
            ClientEvent::JoinGame(JoinRequest {
                name: "Ada".into(),
                character: "panda".into(),
            })
        );
    }

    #[test]
    fn test_player_move_optional_fields_default_to_none() {
        let event = decode(json!({
            "event": "player-move",
            "data": {
                "position": { "x": 1.0, "y": 2.0, "z": 3.0 },
                "rotation": { "x": 0.0, "y": 1.5, "z": 0.0 }
            }
        }));
        let ClientEvent::PlayerMove(input) = event else {
            panic!("expected PlayerMove");
        };
        assert_eq!(input.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(input.velocity, None);
        assert_eq!(input.is_crouching, None);
    }

    #[test]
    fn test_player_move_reads_camel_case_crouch_and_velocity() {
        let event = decode(json!({
            "event": "player-move",
            "data": {
                "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
                "rotation": { "x": 0.0, "y": 0.0, "z": 0.0 },
                "velocity": { "x": 0.5, "y": -9.8, "z": 0.0 },
                "isCrouching": true,
                "alive": true
            }
        }));
        let ClientEvent::PlayerMove(input) = event else {
            panic!("expected PlayerMove");
        };
        assert_eq!(input.velocity, Some(DVec3::new(0.5, -9.8, 0.0)));
        assert_eq!(input.is_crouching, Some(true));
    }

    #[test]
    fn test_player_shoot_with_and_without_id() {
        let with_id = decode(json!({
            "event": "player-shoot",
            "data": {
                "position": { "x": 0.0, "y": 5.0, "z": 0.0 },
                "direction": { "x": 1.0, "y": 0.0, "z": 0.0 },
                "id": "abc"
            }
        }));
        let ClientEvent::PlayerShoot(input) = with_id else {
            panic!("expected PlayerShoot");
        };
        assert_eq!(input.id.as_deref(), Some("abc"));

        let without_id = decode(json!({
            "event": "player-shoot",
            "data": {
                "position": { "x": 0.0, "y": 5.0, "z": 0.0 },
                "direction": { "x": 1.0, "y": 0.0, "z": 0.0 }
            }
        }));
        let ClientEvent::PlayerShoot(input) = without_id else {
            panic!("expected PlayerShoot");
        };
        assert_eq!(input.id, None);
    }

    #[test]
    fn test_disconnect_needs_no_payload() {
        assert_eq!(decode(json!({ "event": "disconnect" })), ClientEvent::Disconnect);
    }

    #[test]
    fn test_vector_missing_component_is_rejected() {
        let result: Result<ClientEvent, _> = serde_json::from_value(json!({
            "event": "player-shoot",
            "data": {
                "position": { "x": 0.0, "y": 5.0 },
                "direction": { "x": 1.0, "y": 0.0, "z": 0.0 }
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_player_hit_json_shape() {
        let event = ServerEvent::PlayerHit(PlayerHit {
            player_id: PlayerId(2),
            damage: 15,
            health: 0,
            killed: true,
            attacker_id: PlayerId(1),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "player-hit",
                "data": {
                    "playerId": 2,
                    "damage": 15,
                    "health": 0,
                    "killed": true,
                    "attackerId": 1
                }
            })
        );
    }

    #[test]
    fn test_projectile_expired_carries_bare_id() {
        let event = ServerEvent::ProjectileExpired(ProjectileId::from("r-1"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "projectile-expired", "data": "r-1" })
        );
    }

    #[test]
    fn test_rocket_jump_force_is_xyz_object() {
        let event = ServerEvent::RocketJump(RocketJump {
            player_id: PlayerId(4),
            force: DVec3::new(2.0, 15.0, -4.0),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "rocket-jump",
                "data": { "playerId": 4, "force": { "x": 2.0, "y": 15.0, "z": -4.0 } }
            })
        );
    }

    #[test]
    fn test_scoreboard_update_is_array() {
        let event = ServerEvent::ScoreboardUpdate(vec![ScoreEntry {
            name: "Ada".into(),
            kills: 3,
            deaths: 1,
            damage: 60,
        }]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "scoreboard-update");
        assert_eq!(json["data"][0]["name"], "Ada");
        assert_eq!(json["data"][0]["kills"], 3);
    }

    #[test]
    fn test_game_joined_json_shape() {
        let event = ServerEvent::GameJoined(GameJoined {
            player_id: PlayerId(1),
            config: GameConfig::default(),
            players: vec![],
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "game-joined");
        assert_eq!(json["data"]["playerId"], 1);
        assert_eq!(json["data"]["config"]["mapSize"], 100.0);
        assert!(json["data"]["players"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_event_names_match_serialized_tag() {
        let events = [
            ServerEvent::PlayerLeft(PlayerId(1)),
            ServerEvent::PlayerKilled(PlayerKilled {
                player_id: PlayerId(1),
                killer_id: PlayerId(2),
            }),
            ServerEvent::HeartbeatAck(HeartbeatAck {
                client_time: 1,
                server_time: 2,
            }),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }
}
