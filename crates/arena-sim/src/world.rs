//! The authoritative game state.
//!
//! [`World`] owns every [`Player`] and [`Projectile`] and is the only thing
//! that mutates them. It is synchronous and knows nothing about sockets or
//! timers:
//!
//! - Callers pass the current game time (`now`, time since the arena
//!   started) into every time-dependent operation.
//! - Every operation returns the events it produced as
//!   `(Recipient, ServerEvent)` pairs, in emission order. Delivering them
//!   is someone else's job.
//!
//! That makes the world trivially testable: no runtime, no clock, and a
//! seedable RNG for spawn points.

use std::collections::HashMap;
use std::time::Duration;

use arena_protocol::{
    ChatLine, DVec3, GameConfig, GameJoined, MoveInput, PlayerHit, PlayerId, PlayerKilled,
    PlayerSnapshot, ProjectileExploded, ProjectileId, Recipient, RocketJump, ServerEvent,
    ShootInput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::collision::{
    is_direct_hit, out_of_bounds, rocket_jump_force, splash_damage, within_self_jump,
};
use crate::player::Player;
use crate::projectile::{Fate, Projectile};
use crate::respawn::RespawnQueue;
use crate::rules::{EXPLOSION_RADIUS, PROJECTILE_LIFETIME, SPAWN_HEIGHT, sanitize_chat};
use crate::scoreboard::standings;

/// One outbound event and who should receive it.
pub type Outbound = (Recipient, ServerEvent);

/// Client-proposed projectile ids longer than this are replaced.
const MAX_PROJECTILE_ID_LEN: usize = 64;

/// Arena-wide counters. They only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub total_kills: u64,
    pub total_deaths: u64,
    pub total_damage: u64,
}

#[derive(Debug)]
pub struct World {
    config: GameConfig,
    players: HashMap<PlayerId, Player>,
    projectiles: HashMap<ProjectileId, Projectile>,
    next_seq: u64,
    respawns: RespawnQueue,
    stats: GameStats,
    rng: StdRng,
}

impl World {
    /// Creates an empty world with an OS-seeded RNG.
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an empty world whose spawn points are reproducible.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        Self {
            config,
            players: HashMap::new(),
            projectiles: HashMap::new(),
            next_seq: 0,
            respawns: RespawnQueue::new(),
            stats: GameStats::default(),
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Adds a player at a random spawn point.
    ///
    /// The joiner gets `game-joined` with the config and the full roster
    /// (itself included); everyone else gets `player-joined`. Joining twice
    /// is a no-op.
    ///
    /// `name` and `character` are expected to be sanitized already.
    pub fn join(&mut self, id: PlayerId, name: String, character: String) -> Vec<Outbound> {
        if self.players.contains_key(&id) {
            debug!(player_id = %id, "join ignored, already joined");
            return Vec::new();
        }

        let position = spawn_point(&mut self.rng, self.config.half_extent());
        let player = Player::new(id, name, character, position, self.config.player_health);
        info!(player_id = %id, name = %player.name, "player joined");
        let snapshot = player.snapshot();
        self.players.insert(id, player);

        vec![
            (
                Recipient::Player(id),
                ServerEvent::GameJoined(GameJoined {
                    player_id: id,
                    config: self.config,
                    players: self.roster(),
                }),
            ),
            (Recipient::AllExcept(id), ServerEvent::PlayerJoined(snapshot)),
        ]
    }

    /// Accepts client-reported kinematics and relays them to everyone else.
    ///
    /// Ignored for unknown or dead players and for non-finite values.
    pub fn apply_movement(&mut self, id: PlayerId, input: MoveInput) -> Vec<Outbound> {
        let Some(player) = self.players.get_mut(&id) else {
            debug!(player_id = %id, "move dropped, not joined");
            return Vec::new();
        };
        if !player.alive {
            debug!(player_id = %id, "move dropped, player is dead");
            return Vec::new();
        }
        let finite = input.position.is_finite()
            && input.rotation.is_finite()
            && input.velocity.is_none_or(|v| v.is_finite());
        if !finite {
            debug!(player_id = %id, "move dropped, non-finite input");
            return Vec::new();
        }

        player.apply_movement(&input);
        vec![(Recipient::AllExcept(id), ServerEvent::PlayerMoved(player.moved()))]
    }

    /// Removes a player and cancels any pending respawn.
    ///
    /// Projectiles the player already fired stay in flight and keep their
    /// owner id.
    pub fn leave(&mut self, id: PlayerId) -> Vec<Outbound> {
        let cancelled = self.respawns.cancel(id);
        let Some(player) = self.players.remove(&id) else {
            return Vec::new();
        };
        info!(player_id = %id, name = %player.name, cancelled_respawn = cancelled, "player left");
        vec![(Recipient::AllExcept(id), ServerEvent::PlayerLeft(id))]
    }

    // -----------------------------------------------------------------------
    // Shooting and chat
    // -----------------------------------------------------------------------

    /// Spawns a projectile for `id` if the player is alive and off
    /// cooldown.
    ///
    /// The direction is normalized here; a zero or non-finite direction
    /// drops the shot without consuming the cooldown. Accepted shots are
    /// announced to everyone, the shooter included.
    pub fn request_shoot(&mut self, id: PlayerId, input: ShootInput, now: Duration) -> Vec<Outbound> {
        let Some(player) = self.players.get_mut(&id) else {
            debug!(player_id = %id, "shot dropped, not joined");
            return Vec::new();
        };
        if !player.alive {
            debug!(player_id = %id, "shot dropped, player is dead");
            return Vec::new();
        }
        if !player.can_shoot(now) {
            debug!(player_id = %id, "shot dropped, cooling down");
            return Vec::new();
        }
        let Some(direction) = input.direction.try_normalize() else {
            debug!(player_id = %id, "shot dropped, invalid direction");
            return Vec::new();
        };
        if !input.position.is_finite() {
            debug!(player_id = %id, "shot dropped, invalid position");
            return Vec::new();
        }
        player.last_shot = Some(now);

        let projectile_id = self.claim_projectile_id(input.id);
        let seq = self.next_seq;
        self.next_seq += 1;
        let projectile = Projectile {
            id: projectile_id.clone(),
            owner: id,
            position: input.position,
            direction,
            speed: self.config.projectile_speed,
            damage: self.config.projectile_damage,
            spawned_at: now,
            lifetime: PROJECTILE_LIFETIME,
            seq,
        };
        debug!(player_id = %id, projectile_id = %projectile_id, "projectile fired");
        let fired = projectile.fired();
        self.projectiles.insert(projectile_id, projectile);

        vec![(Recipient::All, ServerEvent::ProjectileFired(fired))]
    }

    /// Relays a chat line from a joined player to everyone.
    pub fn chat(&self, id: PlayerId, raw: &str, timestamp_ms: u64) -> Vec<Outbound> {
        let Some(player) = self.players.get(&id) else {
            debug!(player_id = %id, "chat dropped, not joined");
            return Vec::new();
        };
        let Some(message) = sanitize_chat(raw) else {
            debug!(player_id = %id, "chat dropped, empty message");
            return Vec::new();
        };
        vec![(
            Recipient::All,
            ServerEvent::ChatMessage(ChatLine {
                player_id: id,
                player_name: player.name.clone(),
                message,
                timestamp: timestamp_ms,
            }),
        )]
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Advances every projectile by `dt` and resolves what it runs into.
    ///
    /// Projectiles are visited in spawn order. Each one either keeps
    /// flying or is removed with exactly one terminal event: expiry, a
    /// wall explosion, or a direct-hit explosion.
    pub fn tick(&mut self, now: Duration, dt: Duration) -> Vec<Outbound> {
        let dt = dt.as_secs_f64();
        let half_extent = self.config.half_extent();
        let mut out = Vec::new();

        for id in self.projectile_order() {
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            projectile.advance(dt);
            let position = projectile.position;
            let owner = projectile.owner;

            let fate = if projectile.is_expired(now) {
                Some(Fate::Expired)
            } else if out_of_bounds(position, half_extent) {
                Some(Fate::WallExploded)
            } else {
                self.direct_hit_target(owner, position)
                    .map(Fate::PlayerExploded)
            };
            let Some(fate) = fate else {
                continue;
            };
            let Some(projectile) = self.projectiles.remove(&id) else {
                continue;
            };
            trace!(projectile_id = %id, %fate, "projectile removed");

            match fate {
                Fate::Expired => out.push((Recipient::All, ServerEvent::ProjectileExpired(id))),
                Fate::WallExploded | Fate::PlayerExploded(_) => {
                    out.extend(self.detonate(projectile, now));
                }
            }
        }

        if !out.is_empty() {
            trace!(events = out.len(), live = self.projectiles.len(), "tick resolved");
        }
        out
    }

    /// Applies splash damage around `center` to every living player.
    ///
    /// Per affected player, in id order: a `rocket-jump` if it is the
    /// owner close to the blast, then `player-hit`, then `player-killed`
    /// on a killing blow. The owner need not still be connected.
    pub fn resolve_explosion(
        &mut self,
        center: DVec3,
        radius: f64,
        base_damage: u32,
        owner: PlayerId,
        now: Duration,
    ) -> Vec<Outbound> {
        let mut out = Vec::new();
        let mut targets: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.alive)
            .map(|p| p.id)
            .collect();
        targets.sort_unstable();

        for target in targets {
            let Some(player) = self.players.get_mut(&target) else {
                continue;
            };
            let distance = player.position.distance(center);
            let Some(damage) = splash_damage(base_damage, distance, radius) else {
                continue;
            };
            let killed = player.take_damage(damage);
            let health = player.health;

            if target == owner && within_self_jump(distance, radius) {
                out.push((
                    Recipient::All,
                    ServerEvent::RocketJump(RocketJump {
                        player_id: target,
                        force: rocket_jump_force(player.position, center),
                    }),
                ));
            }
            trace!(player_id = %target, damage, health, killed, "splash damage");
            out.push((
                Recipient::All,
                ServerEvent::PlayerHit(PlayerHit {
                    player_id: target,
                    damage,
                    health,
                    killed,
                    attacker_id: owner,
                }),
            ));
            if killed {
                out.push(self.record_kill(target, owner, damage, now));
            }
        }
        out
    }

    /// Respawns every player whose delay has run out by `now`.
    pub fn fire_due_respawns(&mut self, now: Duration) -> Vec<Outbound> {
        let mut out = Vec::new();
        for id in self.respawns.take_due(now) {
            let position = spawn_point(&mut self.rng, self.config.half_extent());
            let health = self.config.player_health;
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.respawn(position, health);
            info!(player_id = %id, "player respawned");
            out.push((Recipient::All, ServerEvent::PlayerRespawned(player.snapshot())));
        }
        out
    }

    /// Game time of the earliest pending respawn.
    pub fn next_respawn_due(&self) -> Option<Duration> {
        self.respawns.next_due()
    }

    /// The current standings, for everyone.
    pub fn scoreboard(&self) -> Outbound {
        (
            Recipient::All,
            ServerEvent::ScoreboardUpdate(standings(self.players.values())),
        )
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn projectile(&self, id: &ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_respawn_pending(&self, id: PlayerId) -> bool {
        self.respawns.is_pending(id)
    }

    /// Snapshots of every player, ordered by id.
    pub fn roster(&self) -> Vec<PlayerSnapshot> {
        let mut roster: Vec<PlayerSnapshot> = self.players.values().map(Player::snapshot).collect();
        roster.sort_by_key(|p| p.id);
        roster
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn claim_projectile_id(&self, requested: Option<String>) -> ProjectileId {
        if let Some(requested) =
            requested.filter(|id| !id.is_empty() && id.len() <= MAX_PROJECTILE_ID_LEN)
        {
            let id = ProjectileId(requested);
            if !self.projectiles.contains_key(&id) {
                return id;
            }
        }
        ProjectileId(Uuid::new_v4().to_string())
    }

    fn projectile_order(&self) -> Vec<ProjectileId> {
        let mut order: Vec<(u64, &ProjectileId)> =
            self.projectiles.values().map(|p| (p.seq, &p.id)).collect();
        order.sort_unstable_by_key(|(seq, _)| *seq);
        order.into_iter().map(|(_, id)| id.clone()).collect()
    }

    /// Lowest-id living non-owner within hit range of `position`.
    fn direct_hit_target(&self, owner: PlayerId, position: DVec3) -> Option<PlayerId> {
        self.players
            .values()
            .filter(|p| p.alive && p.id != owner && is_direct_hit(position, p.position))
            .map(|p| p.id)
            .min()
    }

    fn detonate(&mut self, projectile: Projectile, now: Duration) -> Vec<Outbound> {
        let center = projectile.position;
        let mut out = vec![(
            Recipient::All,
            ServerEvent::ProjectileExploded(ProjectileExploded {
                id: projectile.id,
                position: center,
                radius: EXPLOSION_RADIUS,
            }),
        )];
        out.extend(self.resolve_explosion(
            center,
            EXPLOSION_RADIUS,
            projectile.damage,
            projectile.owner,
            now,
        ));
        out
    }

    fn record_kill(
        &mut self,
        victim: PlayerId,
        killer: PlayerId,
        damage: u32,
        now: Duration,
    ) -> Outbound {
        self.stats.total_kills += 1;
        self.stats.total_deaths += 1;
        self.stats.total_damage += u64::from(damage);
        if let Some(attacker) = self.players.get_mut(&killer) {
            attacker.kills += 1;
            attacker.damage_dealt += damage;
        }
        self.respawns.schedule(victim, now + self.config.respawn_delay());
        info!(player_id = %victim, killer_id = %killer, "player killed");

        (
            Recipient::All,
            ServerEvent::PlayerKilled(PlayerKilled {
                player_id: victim,
                killer_id: killer,
            }),
        )
    }
}

/// A random point on the spawn plane, anywhere inside the map.
fn spawn_point(rng: &mut impl Rng, half_extent: f64) -> DVec3 {
    let half = half_extent.max(0.0);
    DVec3::new(
        rng.random_range(-half..=half),
        SPAWN_HEIGHT,
        rng.random_range(-half..=half),
    )
}
