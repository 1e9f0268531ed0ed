//! Authoritative per-session player record.

use std::time::Duration;

use arena_protocol::{DVec3, MoveInput, PlayerId, PlayerMoved, PlayerSnapshot, ScoreEntry};

use crate::rules::SHOOT_COOLDOWN;

/// One joined player.
///
/// Only the [`World`](crate::World) can mutate a player; everything outside
/// the crate sees `&Player`.
///
/// Health stays within `0..=max` at all times. `alive` is false exactly
/// while health is 0, which is the respawn window.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub character: String,
    pub position: DVec3,
    /// Euler angles, as reported by the client.
    pub rotation: DVec3,
    pub velocity: DVec3,
    pub is_crouching: bool,
    pub health: u32,
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: u32,
    /// Game time of the last accepted shot.
    pub last_shot: Option<Duration>,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        name: String,
        character: String,
        position: DVec3,
        health: u32,
    ) -> Self {
        Self {
            id,
            name,
            character,
            position,
            rotation: DVec3::ZERO,
            velocity: DVec3::ZERO,
            is_crouching: false,
            health,
            alive: true,
            kills: 0,
            deaths: 0,
            damage_dealt: 0,
            last_shot: None,
        }
    }

    /// Copies client-reported kinematics. Missing optional fields keep
    /// their previous value.
    pub(crate) fn apply_movement(&mut self, input: &MoveInput) {
        self.position = input.position;
        self.rotation = input.rotation;
        if let Some(velocity) = input.velocity {
            self.velocity = velocity;
        }
        if let Some(crouching) = input.is_crouching {
            self.is_crouching = crouching;
        }
    }

    /// Whether the shot cooldown has elapsed at game time `now`.
    pub fn can_shoot(&self, now: Duration) -> bool {
        match self.last_shot {
            None => true,
            Some(last) => now.saturating_sub(last) >= SHOOT_COOLDOWN,
        }
    }

    /// Applies damage and returns `true` if this hit killed the player.
    ///
    /// Health saturates at zero; a killing blow marks the player dead and
    /// counts the death. Damage to a dead player is ignored.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
            self.deaths += 1;
            return true;
        }
        false
    }

    pub(crate) fn respawn(&mut self, position: DVec3, health: u32) {
        self.position = position;
        self.velocity = DVec3::ZERO;
        self.health = health;
        self.alive = true;
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            character: self.character.clone(),
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            is_crouching: self.is_crouching,
            health: self.health,
            alive: self.alive,
            kills: self.kills,
            deaths: self.deaths,
            damage: self.damage_dealt,
        }
    }

    pub fn moved(&self) -> PlayerMoved {
        PlayerMoved {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            is_crouching: self.is_crouching,
            alive: self.alive,
            health: self.health,
        }
    }

    pub fn score(&self) -> ScoreEntry {
        ScoreEntry {
            name: self.name.clone(),
            kills: self.kills,
            deaths: self.deaths,
            damage: self.damage_dealt,
        }
    }
}
