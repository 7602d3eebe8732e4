//! Transient entities of the rail shooter
//!
//! Depth `z` runs from 0 at the player plane out to `far_depth`. Every kind
//! has its own motion rule, dispatched from a single match in
//! [`Population::update`]. Projectiles keep no link to whoever fired them;
//! hits are settled by proximity alone.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::GameEvent;
use crate::consts::SPAWN_EPSILON;
use crate::tuning::{CadenceTuning, ShooterTuning};

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Friendly,
    Hostile,
}

/// Kind-specific entity data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle {
        size: f32,
        hit_points: i32,
    },
    Enemy {
        size: f32,
        hit_points: i32,
        /// Seconds until the next shot
        fire_cooldown: f32,
        drift_phase: f32,
        drift_amplitude: f32,
        /// Lane centre the drift oscillates around
        lane_x: f32,
    },
    Projectile {
        side: Side,
        damage: f32,
    },
    Debris {
        spin: f32,
    },
}

/// Payload-free kind label for events and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityTag {
    Obstacle,
    Enemy,
    FriendlyProjectile,
    HostileProjectile,
    Debris,
}

/// A spawned entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Seconds to live, if the entity expires on its own
    pub ttl: Option<f32>,
    /// Marked by the collision resolver; swept at the end of the step
    pub consumed: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn tag(&self) -> EntityTag {
        match self.kind {
            EntityKind::Obstacle { .. } => EntityTag::Obstacle,
            EntityKind::Enemy { .. } => EntityTag::Enemy,
            EntityKind::Projectile {
                side: Side::Friendly,
                ..
            } => EntityTag::FriendlyProjectile,
            EntityKind::Projectile {
                side: Side::Hostile,
                ..
            } => EntityTag::HostileProjectile,
            EntityKind::Debris { .. } => EntityTag::Debris,
        }
    }

    /// Half width used by the overlap tests
    pub fn half_width(&self, shooter: &ShooterTuning) -> f32 {
        match self.kind {
            EntityKind::Obstacle { size, .. } | EntityKind::Enemy { size, .. } => size * 0.5,
            EntityKind::Projectile { .. } => shooter.projectile_half_width,
            EntityKind::Debris { .. } => 0.0,
        }
    }

    /// Obstacles and enemies: things that can be shot and can hurt on contact
    pub fn is_target(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Obstacle { .. } | EntityKind::Enemy { .. }
        )
    }

    pub fn is_live(&self) -> bool {
        !self.consumed
    }
}

/// Countdown between spawns of one kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub remaining: f32,
}

impl SpawnTimer {
    /// First spawn comes after one full interval
    pub fn new<R: Rng>(cadence: &CadenceTuning, ramp: f32, wave: u32, rng: &mut R) -> Self {
        Self {
            remaining: cadence_interval(cadence, ramp, wave, rng),
        }
    }

    /// Count down and return how many spawns are due this step
    pub fn tick<R: Rng>(
        &mut self,
        dt: f32,
        cadence: &CadenceTuning,
        ramp: f32,
        wave: u32,
        rng: &mut R,
    ) -> u32 {
        self.remaining -= dt;
        let mut due = 0;
        while self.remaining <= SPAWN_EPSILON {
            due += 1;
            self.remaining += cadence_interval(cadence, ramp, wave, rng);
        }
        due
    }
}

/// Interval between spawns at a given wave.
///
/// Shrinks as `1 / (1 + ramp * (wave - 1))`, never below `min_interval`.
pub fn cadence_interval<R: Rng>(
    cadence: &CadenceTuning,
    ramp: f32,
    wave: u32,
    rng: &mut R,
) -> f32 {
    let scale = 1.0 / (1.0 + ramp.max(0.0) * wave.saturating_sub(1) as f32);
    let jitter = cadence.jitter.sample(rng);
    (cadence.base_interval * jitter * scale).max(cadence.min_interval.max(SPAWN_EPSILON * 10.0))
}

/// Lane half width at depth `z` (wider toward the horizon)
pub fn lane_half_width(z: f32, shooter: &ShooterTuning) -> f32 {
    let t = (z / shooter.far_depth.max(1.0)).clamp(0.0, 1.0);
    shooter.near_half_width + (shooter.far_half_width - shooter.near_half_width) * t
}

/// Why an entity left the population this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Passed the player plane
    ReachedPlayer,
    /// Past the far plane, or behind the player for hostile fire
    OutOfRange,
    Expired,
    Consumed,
}

/// All live entities plus the spawn bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    pub entities: Vec<Entity>,
    pub obstacle_timer: SpawnTimer,
    pub enemy_timer: SpawnTimer,
    next_id: u32,
}

impl Population {
    pub fn new<R: Rng>(shooter: &ShooterTuning, rng: &mut R) -> Self {
        Self {
            entities: Vec::new(),
            obstacle_timer: SpawnTimer::new(&shooter.obstacle_cadence, shooter.spawn_ramp, 1, rng),
            enemy_timer: SpawnTimer::new(&shooter.enemy_cadence, shooter.spawn_ramp, 1, rng),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an entity and return its ID
    pub fn insert(&mut self, pos: Vec3, vel: Vec3, ttl: Option<f32>, kind: EntityKind) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            pos,
            vel,
            ttl,
            consumed: false,
            kind,
        });
        id
    }

    pub fn count(&self, tag: EntityTag) -> usize {
        self.entities
            .iter()
            .filter(|e| e.is_live() && e.tag() == tag)
            .count()
    }

    /// Run both spawn timers
    pub fn run_spawners<R: Rng>(
        &mut self,
        dt: f32,
        wave: u32,
        shooter: &ShooterTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let obstacles = self.obstacle_timer.tick(
            dt,
            &shooter.obstacle_cadence,
            shooter.spawn_ramp,
            wave,
            rng,
        );
        for _ in 0..obstacles {
            let id = self.spawn_obstacle(shooter, rng);
            events.push(GameEvent::Spawned {
                id,
                tag: EntityTag::Obstacle,
            });
        }

        let enemies =
            self.enemy_timer
                .tick(dt, &shooter.enemy_cadence, shooter.spawn_ramp, wave, rng);
        for _ in 0..enemies {
            let id = self.spawn_enemy(shooter, rng);
            events.push(GameEvent::Spawned {
                id,
                tag: EntityTag::Enemy,
            });
        }
    }

    pub fn spawn_obstacle<R: Rng>(&mut self, shooter: &ShooterTuning, rng: &mut R) -> u32 {
        let z = shooter.far_depth;
        let half = lane_half_width(z, shooter);
        let x = rng.random_range(-half..=half);
        let id = self.insert(
            Vec3::new(x, 0.0, z),
            Vec3::new(0.0, 0.0, -shooter.world_speed),
            None,
            EntityKind::Obstacle {
                size: shooter.obstacle_size,
                hit_points: shooter.obstacle_hit_points,
            },
        );
        log::debug!("Spawned obstacle {} at x={:.1}", id, x);
        id
    }

    pub fn spawn_enemy<R: Rng>(&mut self, shooter: &ShooterTuning, rng: &mut R) -> u32 {
        let z = shooter.far_depth;
        let half = lane_half_width(z, shooter);
        let lane_x = rng.random_range(-half..=half);
        let id = self.insert(
            Vec3::new(lane_x, 0.0, z),
            Vec3::new(0.0, 0.0, -shooter.world_speed * shooter.enemy_speed_scale),
            None,
            EntityKind::Enemy {
                size: shooter.enemy_size,
                hit_points: shooter.enemy_hit_points,
                fire_cooldown: shooter.fire_cooldown.sample(rng),
                drift_phase: rng.random_range(0.0..std::f32::consts::TAU),
                drift_amplitude: shooter.drift_amplitude.sample(rng),
                lane_x,
            },
        );
        log::debug!("Spawned enemy {} at x={:.1}", id, lane_x);
        id
    }

    /// Friendly shot from the player plane
    pub fn fire_friendly(&mut self, from: Vec2, shooter: &ShooterTuning) -> u32 {
        self.insert(
            Vec3::new(from.x, from.y, 0.0),
            Vec3::new(0.0, 0.0, shooter.projectile_speed),
            None,
            EntityKind::Projectile {
                side: Side::Friendly,
                damage: shooter.projectile_damage as f32,
            },
        )
    }

    /// Scatter debris where a target died
    pub fn burst<R: Rng>(&mut self, at: Vec3, shooter: &ShooterTuning, rng: &mut R) {
        for _ in 0..shooter.debris_count {
            let dir = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            )
            .normalize_or_zero();
            self.insert(
                at,
                dir * shooter.debris_speed,
                Some(shooter.debris_ttl),
                EntityKind::Debris {
                    spin: rng.random_range(-6.0..6.0),
                },
            );
        }
    }

    /// Move everything one step and fire enemy weapons.
    ///
    /// Returns the entities that left the population with the reason.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        player_x: f32,
        shooter: &ShooterTuning,
        rng: &mut R,
    ) -> Vec<(Entity, Exit)> {
        let mut shots: Vec<Vec3> = Vec::new();

        for entity in &mut self.entities {
            match entity.kind {
                EntityKind::Obstacle { .. } => update_obstacle(entity, dt),
                EntityKind::Enemy { .. } => {
                    if let Some(origin) = update_enemy(entity, dt, shooter, rng) {
                        shots.push(origin);
                    }
                }
                EntityKind::Projectile { .. } => update_projectile(entity, dt),
                EntityKind::Debris { .. } => update_debris(entity, dt),
            }
        }

        for origin in shots {
            self.fire_hostile(origin, player_x, shooter);
        }

        self.sweep(shooter)
    }

    /// Remove consumed, expired and out-of-range entities
    pub fn sweep(&mut self, shooter: &ShooterTuning) -> Vec<(Entity, Exit)> {
        let mut exits = Vec::new();
        let far = shooter.far_depth;
        self.entities.retain(|entity| {
            let exit = if entity.consumed {
                Some(Exit::Consumed)
            } else if entity.ttl.is_some_and(|t| t <= 0.0) {
                Some(Exit::Expired)
            } else {
                match entity.kind {
                    EntityKind::Obstacle { .. } | EntityKind::Enemy { .. } if entity.pos.z < 0.0 => {
                        Some(Exit::ReachedPlayer)
                    }
                    EntityKind::Projectile {
                        side: Side::Friendly,
                        ..
                    } if entity.pos.z > far => Some(Exit::OutOfRange),
                    EntityKind::Projectile {
                        side: Side::Hostile,
                        ..
                    } if entity.pos.z < 0.0 => Some(Exit::OutOfRange),
                    _ => None,
                }
            };
            match exit {
                Some(exit) => {
                    exits.push((entity.clone(), exit));
                    false
                }
                None => true,
            }
        });
        exits
    }

    fn fire_hostile(&mut self, origin: Vec3, player_x: f32, shooter: &ShooterTuning) {
        let to_player = Vec3::new(player_x - origin.x, 0.0, -origin.z);
        // Guard against a shot fired from the player plane itself
        let travel = to_player.length().max(1.0);
        let vel = to_player / travel * shooter.hostile_speed;
        self.insert(
            origin,
            vel,
            None,
            EntityKind::Projectile {
                side: Side::Hostile,
                damage: shooter.hostile_damage,
            },
        );
    }
}

fn update_obstacle(entity: &mut Entity, dt: f32) {
    entity.pos += entity.vel * dt;
}

/// Approach, drift across the lane and count down the weapon.
///
/// Returns the muzzle position when the enemy fires this step.
fn update_enemy<R: Rng>(
    entity: &mut Entity,
    dt: f32,
    shooter: &ShooterTuning,
    rng: &mut R,
) -> Option<Vec3> {
    let EntityKind::Enemy {
        fire_cooldown,
        drift_phase,
        drift_amplitude,
        lane_x,
        ..
    } = &mut entity.kind
    else {
        return None;
    };

    entity.pos.z += entity.vel.z * dt;
    *drift_phase += shooter.drift_frequency * dt;
    let half = lane_half_width(entity.pos.z, shooter);
    entity.pos.x = (*lane_x + *drift_amplitude * drift_phase.sin()).clamp(-half, half);

    if shooter.fire_window.contains(entity.pos.z) {
        *fire_cooldown -= dt;
        if *fire_cooldown <= 0.0 {
            *fire_cooldown += shooter.fire_cooldown.sample(rng).max(dt);
            return Some(entity.pos);
        }
    }
    None
}

fn update_projectile(entity: &mut Entity, dt: f32) {
    entity.pos += entity.vel * dt;
}

fn update_debris(entity: &mut Entity, dt: f32) {
    entity.pos += entity.vel * dt;
    entity.vel *= 0.96;
    if let EntityKind::Debris { spin } = &mut entity.kind {
        *spin *= 0.98;
    }
    if let Some(ttl) = &mut entity.ttl {
        *ttl -= dt;
    }
}
