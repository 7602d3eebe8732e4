//! Fixed timestep simulation step
//!
//! Two variants share the same step contract: [`SurfGame`] rides the wave
//! field, [`ShooterGame`] runs the rail-shooter lane. Both only advance while
//! the session is Running.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Surfer, SurferStep};
use super::collision::{self, PlayerBody};
use super::input::StepControl;
use super::population::{EntityTag, Exit, Population};
use super::state::{GameEvent, SessionMode, SessionState};
use super::terrain::{HeightField, WaveField, advance_phase};
use crate::consts::PIXELS_PER_METRE;
use crate::tuning::Tuning;

/// What the input controller needs to know after a step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepFeedback {
    /// A release takeoff spent the charge
    pub took_off: bool,
    /// Charge may build this step
    pub grounded: bool,
}

impl From<SurferStep> for StepFeedback {
    fn from(step: SurferStep) -> Self {
        Self {
            took_off: step.took_off,
            grounded: step.grounded,
        }
    }
}

/// Read-only numbers for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub mode: SessionMode,
    pub speed: f32,
    /// Metres travelled
    pub distance: f32,
    /// Metres above the wave (surf only)
    pub height: f32,
    pub score: f32,
    pub multiplier: f32,
    pub health: f32,
    pub shield: f32,
    pub wave: u32,
}

/// One playable variant driven by [`super::SimulationContext`]
pub trait Simulation {
    /// Advance one fixed step. Implementations do nothing unless Running.
    fn step(&mut self, control: &StepControl, dt: f32, events: &mut Vec<GameEvent>)
    -> StepFeedback;

    /// Rebuild the initial state from tuning (and seed, where there is one)
    fn reset(&mut self);

    fn session(&self) -> &SessionState;

    fn session_mut(&mut self) -> &mut SessionState;

    fn tuning(&self) -> &Tuning;

    fn hud(&self) -> HudSnapshot;
}

/// Wave-surfing variant
#[derive(Debug, Clone)]
pub struct SurfGame {
    tuning: Tuning,
    pub terrain: WaveField,
    /// Wave animation phase
    pub phase: f32,
    pub surfer: Surfer,
    pub session: SessionState,
    /// Smallest `y` the rider may reach (y-down)
    pub hover_floor: f32,
}

impl SurfGame {
    pub fn new(tuning: Tuning) -> Self {
        let terrain = WaveField::from_tuning(&tuning.surf.waves, &tuning.viewport);
        Self::with_terrain(tuning, terrain)
    }

    /// Ride a specific field instead of the tuned one
    pub fn with_terrain(tuning: Tuning, terrain: WaveField) -> Self {
        let surfer = Surfer::new(&terrain, 0.0, &tuning.surf);
        let hover_floor = tuning.viewport.height * tuning.surf.hover_floor_ratio;
        let session = SessionState::new(&tuning.combat);
        Self {
            tuning,
            terrain,
            phase: 0.0,
            surfer,
            session,
            hover_floor,
        }
    }
}

impl Simulation for SurfGame {
    fn step(
        &mut self,
        control: &StepControl,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) -> StepFeedback {
        if self.session.mode != SessionMode::Running {
            return StepFeedback {
                took_off: false,
                grounded: !self.surfer.airborne,
            };
        }

        let surf = &self.tuning.surf;
        self.phase = advance_phase(self.phase, dt, &surf.waves, self.surfer.speed);
        let step = self.surfer.step(
            &self.terrain,
            self.phase,
            control,
            self.hover_floor,
            dt,
            surf,
            events,
        );

        self.session.tick_timers(dt, &self.tuning.combat);
        self.session.distance = self.surfer.travelled() / PIXELS_PER_METRE;
        self.session.score = self.session.distance.floor();

        step.into()
    }

    fn reset(&mut self) {
        let surfer = Surfer::new(&self.terrain, 0.0, &self.tuning.surf);
        self.phase = 0.0;
        self.surfer = surfer;
        self.session = SessionState::new(&self.tuning.combat);
        log::info!("Surf session reset");
    }

    fn session(&self) -> &SessionState {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            mode: self.session.mode,
            speed: self.surfer.speed / PIXELS_PER_METRE,
            distance: self.session.distance,
            height: self.surfer.altitude(&self.terrain, self.phase) / PIXELS_PER_METRE,
            score: self.session.score,
            multiplier: self.session.multiplier,
            health: self.session.health,
            shield: self.session.shield,
            wave: self.session.wave,
        }
    }
}

/// The ship at the near plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    /// Seconds until the gun can fire again
    pub fire_timer: f32,
}

/// Rail-shooter variant
#[derive(Debug, Clone)]
pub struct ShooterGame {
    tuning: Tuning,
    seed: u64,
    rng: Pcg32,
    pub player: Player,
    pub population: Population,
    pub session: SessionState,
    /// World units flown; drives wave progression
    pub travelled: f32,
}

impl ShooterGame {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let population = Population::new(&tuning.shooter, &mut rng);
        let session = SessionState::new(&tuning.combat);
        Self {
            tuning,
            seed,
            rng,
            player: Player::default(),
            population,
            session,
            travelled: 0.0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player_body(&self) -> PlayerBody {
        PlayerBody {
            pos: Vec3::new(self.player.x, 0.0, 0.0),
            half_width: self.tuning.shooter.player_half_width,
        }
    }

    fn advance_wave(&mut self, events: &mut Vec<GameEvent>) {
        let shooter = &self.tuning.shooter;
        let reached = 1 + (self.travelled / shooter.wave_length.max(1.0)) as u32;
        if reached <= self.session.wave || self.session.mode.is_terminal() {
            return;
        }
        self.session.wave = reached;
        if reached > shooter.final_wave {
            self.session.win(events);
        } else {
            log::info!("Wave {} reached", reached);
            events.push(GameEvent::WaveAdvanced(reached));
        }
    }
}

impl Simulation for ShooterGame {
    fn step(
        &mut self,
        control: &StepControl,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) -> StepFeedback {
        if self.session.mode != SessionMode::Running {
            return StepFeedback::default();
        }

        let shooter = &self.tuning.shooter;
        let combat = &self.tuning.combat;

        // Steer within the near lane
        let reach = (shooter.near_half_width - shooter.player_half_width).max(0.0);
        self.player.x =
            (self.player.x + control.steer * shooter.lateral_speed * dt).clamp(-reach, reach);

        // Holding the primary control fires on a fixed interval
        self.player.fire_timer = (self.player.fire_timer - dt).max(0.0);
        if control.holding && self.player.fire_timer <= 0.0 {
            self.population
                .fire_friendly(Vec2::new(self.player.x, 0.0), shooter);
            self.player.fire_timer = shooter.fire_interval;
        }

        self.population
            .run_spawners(dt, self.session.wave, shooter, &mut self.rng, events);

        let exits = self
            .population
            .update(dt, self.player.x, shooter, &mut self.rng);
        for (entity, exit) in exits {
            // Obstacles that slip past are dodged; enemies hurt
            if exit == Exit::ReachedPlayer && entity.tag() == EntityTag::Enemy {
                events.push(GameEvent::Breached { id: entity.id });
                self.session
                    .apply_damage(shooter.breach_damage, combat, events);
            }
        }

        let body = self.player_body();
        collision::resolve(
            body,
            &mut self.population,
            &mut self.session,
            shooter,
            combat,
            &mut self.rng,
            events,
        );
        self.population.sweep(shooter);

        self.session.tick_timers(dt, combat);
        self.travelled += shooter.world_speed * dt;
        self.session.distance = self.travelled / PIXELS_PER_METRE;
        self.advance_wave(events);

        StepFeedback::default()
    }

    fn reset(&mut self) {
        *self = Self::new(self.tuning.clone(), self.seed);
        log::info!("Shooter session reset (seed {})", self.seed);
    }

    fn session(&self) -> &SessionState {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            mode: self.session.mode,
            speed: self.tuning.shooter.world_speed,
            distance: self.session.distance,
            height: 0.0,
            score: self.session.score,
            multiplier: self.session.multiplier,
            health: self.session.health,
            shield: self.session.shield,
            wave: self.session.wave,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::population::EntityKind;

    fn running_shooter(tuning: Tuning, seed: u64) -> ShooterGame {
        let mut game = ShooterGame::new(tuning, seed);
        game.session.begin();
        game
    }

    #[test]
    fn test_surf_idle_in_menu() {
        let mut game = SurfGame::new(Tuning::default());
        let before = game.surfer.clone();
        game.step(&StepControl::default(), SIM_DT, &mut Vec::new());
        assert_eq!(game.surfer, before);
        assert_eq!(game.phase, 0.0);
    }

    #[test]
    fn test_surf_distance_and_score_track_progress() {
        let mut game = SurfGame::new(Tuning::default());
        game.session.begin();
        let mut events = Vec::new();
        for _ in 0..600 {
            game.step(&StepControl::default(), SIM_DT, &mut events);
        }
        let expected = game.surfer.travelled() / PIXELS_PER_METRE;
        assert!((game.session.distance - expected).abs() < 1e-4);
        assert!(game.session.distance > 0.0);
        assert_eq!(game.session.score, game.session.distance.floor());
        assert!((game.session.elapsed - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_surf_long_run_respects_bounds() {
        let tuning = Tuning::default();
        let mut game = SurfGame::new(tuning.clone());
        game.session.begin();
        let mut events = Vec::new();
        for frame in 0..6000u32 {
            // Hold for 0.4 s, release for 0.25 s
            let holding = frame % 78 < 48;
            let released = (frame % 78 == 48).then_some(0.4);
            let control = StepControl {
                holding,
                charge: 0.0,
                steer: 0.0,
                released,
            };
            game.step(&control, SIM_DT, &mut events);

            let s = &game.surfer;
            assert!(s.speed >= tuning.surf.speed_min && s.speed <= tuning.surf.speed_max);
            assert!(s.y >= game.hover_floor);
            assert_eq!(s.airborne, s.y < game.terrain.height(s.x, game.phase));
        }
        assert!(events.iter().any(|e| matches!(e, GameEvent::Takeoff { .. })));
    }

    #[test]
    fn test_surf_reset_restores_start() {
        let mut game = SurfGame::new(Tuning::default());
        let fresh = game.surfer.clone();
        game.session.begin();
        for _ in 0..120 {
            game.step(&StepControl::default(), SIM_DT, &mut Vec::new());
        }
        game.reset();
        assert_eq!(game.surfer, fresh);
        assert_eq!(game.session, SessionState::new(&game.tuning().combat));
    }

    #[test]
    fn test_shooter_determinism() {
        let mut a = running_shooter(Tuning::default(), 2024);
        let mut b = running_shooter(Tuning::default(), 2024);
        let mut events_a = Vec::new();
        let mut events_b = Vec::new();

        for i in 0..3000 {
            let control = StepControl {
                holding: i % 200 < 150,
                steer: ((i as f32) * 0.01).sin().signum(),
                ..Default::default()
            };
            a.step(&control, SIM_DT, &mut events_a);
            b.step(&control, SIM_DT, &mut events_b);
        }

        assert_eq!(a.session, b.session);
        assert_eq!(a.player, b.player);
        assert_eq!(a.population.entities, b.population.entities);
        assert_eq!(events_a, events_b);
    }

    #[test]
    fn test_shooter_paused_skips_update() {
        let mut game = running_shooter(Tuning::default(), 1);
        let mut events = Vec::new();
        for _ in 0..60 {
            game.step(&StepControl::default(), SIM_DT, &mut events);
        }
        game.session.toggle_pause();
        let travelled = game.travelled;
        let entities = game.population.entities.clone();
        for _ in 0..600 {
            game.step(&StepControl::default(), SIM_DT, &mut events);
        }
        assert_eq!(game.travelled, travelled);
        assert_eq!(game.population.entities, entities);
    }

    #[test]
    fn test_shooter_steering_stays_in_lane() {
        let tuning = Tuning::default();
        let mut game = running_shooter(tuning.clone(), 3);
        let control = StepControl {
            steer: 1.0,
            ..Default::default()
        };
        for _ in 0..1200 {
            game.step(&control, SIM_DT, &mut Vec::new());
        }
        let reach = tuning.shooter.near_half_width - tuning.shooter.player_half_width;
        assert!((game.player.x - reach).abs() < 1e-4);
    }

    #[test]
    fn test_holding_fires_on_interval() {
        let tuning = Tuning::default();
        let mut game = running_shooter(tuning.clone(), 3);
        let control = StepControl {
            holding: true,
            ..Default::default()
        };
        // Half a second of steps covers three shots at a 0.18 s interval
        for _ in 0..60 {
            game.step(&control, SIM_DT, &mut Vec::new());
        }
        assert_eq!(game.population.count(EntityTag::FriendlyProjectile), 3);
    }

    #[test]
    fn test_enemy_breach_costs_health() {
        let tuning = Tuning::default();
        let mut game = running_shooter(tuning.clone(), 8);
        let id = game.population.insert(
            Vec3::new(8.0, 0.0, 0.1),
            Vec3::new(0.0, 0.0, -tuning.shooter.world_speed),
            None,
            EntityKind::Enemy {
                size: 1.2,
                hit_points: 2,
                fire_cooldown: 5.0,
                drift_phase: 0.0,
                drift_amplitude: 0.0,
                lane_x: 8.0,
            },
        );

        let mut events = Vec::new();
        game.step(&StepControl::default(), 0.01, &mut events);

        assert!(events.contains(&GameEvent::Breached { id }));
        let full = tuning.combat.max_health + tuning.combat.max_shield;
        let left = game.session.health + game.session.shield;
        assert!((full - left - tuning.shooter.breach_damage).abs() < 1e-4);
    }

    #[test]
    fn test_waves_progress_to_victory() {
        let mut tuning = Tuning::default();
        tuning.shooter.wave_length = 20.0;
        tuning.shooter.final_wave = 2;
        let mut game = running_shooter(tuning, 5);

        let mut events = Vec::new();
        for _ in 0..200 {
            game.step(&StepControl::default(), SIM_DT, &mut events);
            if game.session.mode.is_terminal() {
                break;
            }
        }

        assert_eq!(game.session.mode, SessionMode::Victory);
        assert!(events.contains(&GameEvent::WaveAdvanced(2)));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::Victory(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_shooter_reset_replays_seed() {
        let mut game = running_shooter(Tuning::default(), 77);
        let fresh = ShooterGame::new(Tuning::default(), 77);
        for _ in 0..500 {
            game.step(&StepControl::default(), SIM_DT, &mut Vec::new());
        }
        game.reset();
        assert_eq!(game.session, fresh.session);
        assert_eq!(game.population.entities, fresh.population.entities);
        assert_eq!(game.population.obstacle_timer, fresh.population.obstacle_timer);
        assert_eq!(game.seed(), 77);
    }
}
