//! Broad-phase collision resolution for the rail shooter
//!
//! Every test is a lateral box overlap plus a depth band; there is no
//! narrow phase. Resolution runs in a fixed order each step:
//! 1. obstacles and enemies touching the player
//! 2. friendly fire against obstacles and enemies
//! 3. hostile fire against the player

use glam::Vec3;
use rand::Rng;

use super::population::{EntityKind, EntityTag, Population, Side};
use super::state::{GameEvent, SessionState};
use crate::tuning::{CombatTuning, ShooterTuning};

/// Lateral overlap within a depth band; touching edges do not count
#[inline]
pub fn overlap(a: Vec3, a_half: f32, b: Vec3, b_half: f32, depth_band: f32) -> bool {
    (a.x - b.x).abs() < a_half + b_half && (a.z - b.z).abs() < depth_band
}

/// The player's box at the near plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerBody {
    pub pos: Vec3,
    pub half_width: f32,
}

/// Run the three resolution phases against the population and session
pub fn resolve<R: Rng>(
    player: PlayerBody,
    population: &mut Population,
    session: &mut SessionState,
    shooter: &ShooterTuning,
    combat: &CombatTuning,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    resolve_contacts(player, population, session, shooter, combat, events);
    resolve_friendly_fire(population, session, shooter, combat, rng, events);
    resolve_hostile_fire(player, population, session, shooter, combat, events);
}

/// Phase 1: targets that reach the player deal contact damage and are consumed
pub fn resolve_contacts(
    player: PlayerBody,
    population: &mut Population,
    session: &mut SessionState,
    shooter: &ShooterTuning,
    combat: &CombatTuning,
    events: &mut Vec<GameEvent>,
) {
    for entity in population.entities.iter_mut() {
        if !entity.is_live() || !entity.is_target() {
            continue;
        }
        let half = entity.half_width(shooter);
        if overlap(entity.pos, half, player.pos, player.half_width, shooter.depth_band) {
            entity.consumed = true;
            session.apply_damage(shooter.contact_damage, combat, events);
        }
    }
}

/// Phase 2: each friendly projectile strikes the first target it overlaps
pub fn resolve_friendly_fire<R: Rng>(
    population: &mut Population,
    session: &mut SessionState,
    shooter: &ShooterTuning,
    combat: &CombatTuning,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    let mut bursts: Vec<Vec3> = Vec::new();
    let count = population.entities.len();

    for shot_idx in 0..count {
        let (shot_pos, damage) = {
            let shot = &population.entities[shot_idx];
            match shot.kind {
                EntityKind::Projectile {
                    side: Side::Friendly,
                    damage,
                } if shot.is_live() => (shot.pos, damage),
                _ => continue,
            }
        };
        let shot_half = shooter.projectile_half_width;

        let target_idx = population.entities.iter().position(|target| {
            target.is_live()
                && target.is_target()
                && overlap(
                    shot_pos,
                    shot_half,
                    target.pos,
                    target.half_width(shooter),
                    shooter.depth_band,
                )
        });
        let Some(target_idx) = target_idx else {
            continue;
        };

        population.entities[shot_idx].consumed = true;

        let target = &mut population.entities[target_idx];
        let (hit_points, points) = match &mut target.kind {
            EntityKind::Obstacle { hit_points, .. } => (hit_points, shooter.obstacle_points),
            EntityKind::Enemy { hit_points, .. } => (hit_points, shooter.enemy_points),
            _ => continue,
        };
        *hit_points -= damage.round() as i32;
        if *hit_points <= 0 {
            target.consumed = true;
            let awarded = session.award(points, combat);
            let tag = target.tag();
            events.push(GameEvent::Destroyed {
                id: target.id,
                tag,
                points: awarded,
            });
            if tag == EntityTag::Enemy {
                log::debug!("Enemy {} destroyed for {:.0}", target.id, awarded);
            }
            bursts.push(target.pos);
        }
    }

    for at in bursts {
        population.burst(at, shooter, rng);
    }
}

/// Phase 3: hostile projectiles that reach the player hurt it
pub fn resolve_hostile_fire(
    player: PlayerBody,
    population: &mut Population,
    session: &mut SessionState,
    shooter: &ShooterTuning,
    combat: &CombatTuning,
    events: &mut Vec<GameEvent>,
) {
    for entity in population.entities.iter_mut() {
        let EntityKind::Projectile {
            side: Side::Hostile,
            damage,
        } = entity.kind
        else {
            continue;
        };
        if !entity.is_live() {
            continue;
        }
        let hit = overlap(
            entity.pos,
            shooter.projectile_half_width,
            player.pos,
            player.half_width,
            shooter.depth_band,
        );
        if hit {
            entity.consumed = true;
            session.apply_damage(damage, combat, events);
        }
    }
}
