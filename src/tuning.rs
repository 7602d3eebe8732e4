//! Game balance and tuning
//!
//! Every constant the simulation reads lives here so a variant can be re-tuned
//! from a JSON file without touching code. Missing fields fall back to defaults.

use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::sim::terrain::{WaveComponent, WaveField};

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown difficulty `{0}` (expected relaxed, normal or intense)")]
    UnknownDifficulty(String),
    #[error("{name} range is inverted: {min} > {max}")]
    InvalidRange { name: &'static str, min: f32, max: f32 },
    #[error("slope epsilon {epsilon} is too coarse for a {wavelength:.1} px wavelength")]
    SlopeEpsilonTooCoarse { epsilon: f32, wavelength: f32 },
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Relaxed", alias = "easy")]
    Relaxed,
    #[default]
    #[serde(alias = "Normal")]
    Normal,
    #[serde(alias = "Intense", alias = "hard")]
    Intense,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::Normal => "Normal",
            Difficulty::Intense => "Intense",
        }
    }

    /// Multiplier on how quickly spawn cadence tightens per wave
    pub fn spawn_ramp_scale(&self) -> f32 {
        match self {
            Difficulty::Relaxed => 0.6,
            Difficulty::Normal => 1.0,
            Difficulty::Intense => 1.5,
        }
    }

    /// Multiplier on all incoming damage
    pub fn damage_scale(&self) -> f32 {
        match self {
            Difficulty::Relaxed => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Intense => 1.3,
        }
    }
}

impl FromStr for Difficulty {
    type Err = TuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Ok(Difficulty::Relaxed),
            "normal" => Ok(Difficulty::Normal),
            "intense" | "hard" => Ok(Difficulty::Intense),
            _ => Err(TuningError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Closed interval used for randomized cadences and drift amplitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a value; a degenerate range always yields `min`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, name: &'static str) -> Result<(), TuningError> {
        if self.min > self.max {
            return Err(TuningError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Logical viewport the surf terrain is laid out against
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

/// Procedural swell parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Resting water line as a fraction of viewport height
    pub base_height_ratio: f32,
    pub components: Vec<WaveComponent>,
    /// Finite-difference half step for slope
    pub slope_epsilon: f32,
    /// Phase advance per second
    pub phase_rate: f32,
    /// Extra phase advance per unit of surfer speed
    pub speed_coupling: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_height_ratio: 0.65,
            components: vec![
                // Gentle swell
                WaveComponent::new(55.0, 0.007, 1.0),
                // Long rolling set, travelling the other way
                WaveComponent::new(80.0, 0.0035, -1.3),
                // Surface ripples
                WaveComponent::new(12.0, 0.016, 1.6),
            ],
            slope_epsilon: 2.0,
            phase_rate: 0.4,
            speed_coupling: 0.0,
        }
    }
}

/// Surfer physics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfTuning {
    pub waves: WaveTuning,

    // === Gravity ===
    pub gravity: f32,
    /// Gravity while the dive control is held
    pub dive_gravity: f32,
    /// Gravity scale right after a takeoff (softer initial arc)
    pub grace_gravity_scale: f32,
    /// Duration of the soft-gravity window (seconds)
    pub takeoff_grace: f32,

    // === Forward speed ===
    pub start_speed: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Speed kept per 60 Hz frame while riding
    pub ground_drag: f32,
    pub ground_speed_floor: f32,
    /// Speed kept per 60 Hz frame in the air
    pub air_drag: f32,
    pub air_speed_floor: f32,
    /// Downhill acceleration at 90 degrees of slope
    pub slope_accel: f32,
    /// Acceleration while holding on the wave face
    pub drive_accel: f32,

    // === Contact ===
    /// Highest the surfer may rise, as a fraction of viewport height from the top
    pub hover_floor_ratio: f32,
    pub hard_landing_speed: f32,
    pub hard_landing_penalty: f32,
    /// Per-step orientation smoothing while grounded / airborne
    pub ground_smoothing: f32,
    pub air_smoothing: f32,

    // === Takeoff ===
    pub base_impulse: f32,
    /// Extra impulse per unit of uphill slope
    pub slope_impulse: f32,
    /// Extra impulse per unit of forward speed, capped
    pub speed_impulse: f32,
    pub speed_impulse_cap: f32,
    /// Impulse at full charge (eased)
    pub charge_impulse: f32,
    /// Seconds of hold to reach full charge
    pub charge_max: f32,
    /// Charge lost per second while released
    pub charge_decay: f32,
    pub takeoff_tilt_gain: f32,
    /// Nose-up pitch added at takeoff (radians)
    pub takeoff_pitch: f32,

    // === Lip launch ===
    /// Slope below which a released surfer is thrown off the lip
    pub lip_launch_slope: f32,
    pub lip_launch_impulse: f32,
}

impl Default for SurfTuning {
    fn default() -> Self {
        Self {
            waves: WaveTuning::default(),

            gravity: 900.0,
            dive_gravity: 1400.0,
            grace_gravity_scale: 0.55,
            takeoff_grace: 0.2,

            start_speed: 170.0,
            speed_min: 80.0,
            speed_max: 520.0,
            ground_drag: 0.999,
            ground_speed_floor: 90.0,
            air_drag: 0.995,
            air_speed_floor: 120.0,
            slope_accel: 250.0,
            drive_accel: 40.0,

            hover_floor_ratio: 0.05,
            hard_landing_speed: 220.0,
            hard_landing_penalty: 0.98,
            ground_smoothing: 0.2,
            air_smoothing: 0.04,

            base_impulse: 360.0,
            slope_impulse: 420.0,
            speed_impulse: 0.4,
            speed_impulse_cap: 140.0,
            charge_impulse: 380.0,
            charge_max: 1.0,
            charge_decay: 2.0,
            takeoff_tilt_gain: 1.0,
            takeoff_pitch: 0.25,

            lip_launch_slope: -0.6,
            lip_launch_impulse: 500.0,
        }
    }
}

/// Spawn cadence for one entity kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CadenceTuning {
    /// Interval at wave 1 (seconds)
    pub base_interval: f32,
    /// Interval never shrinks below this
    pub min_interval: f32,
    /// Random multiplier on each interval
    pub jitter: FloatRange,
}

/// Rail-shooter world and entities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterTuning {
    // === World ===
    /// Approach speed of the world (depth units per second)
    pub world_speed: f32,
    pub far_depth: f32,
    /// Lane half width at the player plane and at the far plane
    pub near_half_width: f32,
    pub far_half_width: f32,
    /// Depth band in which two entities count as touching
    pub depth_band: f32,
    /// Distance per wave
    pub wave_length: f32,
    /// Clearing this wave wins the run
    pub final_wave: u32,

    // === Spawning ===
    pub obstacle_cadence: CadenceTuning,
    pub enemy_cadence: CadenceTuning,
    /// Cadence shrink per wave: interval / (1 + ramp * (wave - 1))
    pub spawn_ramp: f32,

    // === Player ===
    pub player_half_width: f32,
    pub lateral_speed: f32,
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub projectile_half_width: f32,

    // === Obstacles ===
    pub obstacle_size: f32,
    pub obstacle_hit_points: i32,
    pub obstacle_points: f32,

    // === Enemies ===
    pub enemy_size: f32,
    pub enemy_hit_points: i32,
    pub enemy_points: f32,
    pub enemy_speed_scale: f32,
    pub drift_amplitude: FloatRange,
    pub drift_frequency: f32,
    pub fire_cooldown: FloatRange,
    /// Enemies only shoot while inside this depth window
    pub fire_window: FloatRange,
    pub hostile_speed: f32,
    pub hostile_damage: f32,

    // === Contact ===
    pub contact_damage: f32,
    /// Damage when an enemy slips past the player plane
    pub breach_damage: f32,

    // === Debris ===
    pub debris_count: u32,
    pub debris_ttl: f32,
    pub debris_speed: f32,
}

impl Default for ShooterTuning {
    fn default() -> Self {
        Self {
            world_speed: 40.0,
            far_depth: 100.0,
            near_half_width: 10.0,
            far_half_width: 16.0,
            depth_band: 1.5,
            wave_length: 600.0,
            final_wave: 10,

            obstacle_cadence: CadenceTuning {
                base_interval: 1.6,
                min_interval: 0.45,
                jitter: FloatRange::new(0.8, 1.2),
            },
            enemy_cadence: CadenceTuning {
                base_interval: 2.4,
                min_interval: 0.6,
                jitter: FloatRange::new(0.85, 1.15),
            },
            spawn_ramp: 0.12,

            player_half_width: 1.0,
            lateral_speed: 14.0,
            fire_interval: 0.18,
            projectile_speed: 90.0,
            projectile_damage: 1,
            projectile_half_width: 0.3,

            obstacle_size: 1.6,
            obstacle_hit_points: 4,
            obstacle_points: 40.0,

            enemy_size: 1.2,
            enemy_hit_points: 2,
            enemy_points: 100.0,
            enemy_speed_scale: 0.6,
            drift_amplitude: FloatRange::new(1.0, 4.0),
            drift_frequency: 1.5,
            fire_cooldown: FloatRange::new(1.2, 2.6),
            fire_window: FloatRange::new(15.0, 80.0),
            hostile_speed: 45.0,
            hostile_damage: 10.0,

            contact_damage: 20.0,
            breach_damage: 6.0,

            debris_count: 4,
            debris_ttl: 0.8,
            debris_speed: 12.0,
        }
    }
}

/// Damage, shield and score multiplier rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub max_health: f32,
    pub max_shield: f32,
    /// Fraction of incoming damage the shield takes while it lasts
    pub shield_absorb: f32,
    pub invulnerability_window: f32,
    pub multiplier_step: f32,
    pub multiplier_cap: f32,
    /// Share of the bonus multiplier kept after taking damage
    pub damage_multiplier_keep: f32,
    /// Seconds after a reward before the multiplier starts to decay
    pub combo_window: f32,
    /// Multiplier lost per second once the combo window lapses
    pub multiplier_decay: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_shield: 60.0,
            shield_absorb: 0.7,
            invulnerability_window: 0.6,
            multiplier_step: 0.25,
            multiplier_cap: 8.0,
            damage_multiplier_keep: 0.5,
            combo_window: 2.5,
            multiplier_decay: 0.5,
        }
    }
}

/// Complete tuning for both variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: Difficulty,
    pub viewport: Viewport,
    pub surf: SurfTuning,
    pub shooter: ShooterTuning,
    pub combat: CombatTuning,
    /// Auto-pause a running session when the page loses focus
    pub pause_on_focus_loss: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            viewport: Viewport::default(),
            surf: SurfTuning::default(),
            shooter: ShooterTuning::default(),
            combat: CombatTuning::default(),
            pause_on_focus_loss: true,
        }
    }
}

impl Tuning {
    /// Default tuning with a difficulty preset applied
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut tuning = Self::default();
        tuning.apply_difficulty(difficulty);
        tuning
    }

    /// Apply a difficulty preset (scales spawn ramp and damage)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.apply_difficulty_except(difficulty, |_| false);
    }

    /// Apply a preset, leaving alone the shooter fields `keep` names
    fn apply_difficulty_except(&mut self, difficulty: Difficulty, keep: impl Fn(&str) -> bool) {
        self.difficulty = difficulty;
        let base = ShooterTuning::default();
        let damage = difficulty.damage_scale();
        let spawn_ramp = base.spawn_ramp * difficulty.spawn_ramp_scale();
        let scaled = [
            ("spawn_ramp", &mut self.shooter.spawn_ramp, spawn_ramp),
            ("contact_damage", &mut self.shooter.contact_damage, base.contact_damage * damage),
            ("hostile_damage", &mut self.shooter.hostile_damage, base.hostile_damage * damage),
            ("breach_damage", &mut self.shooter.breach_damage, base.breach_damage * damage),
        ];
        for (field, slot, value) in scaled {
            if !keep(field) {
                *slot = value;
            }
        }
    }

    /// Parse and validate tuning JSON.
    ///
    /// The `difficulty` preset is applied first; shooter fields the file sets
    /// explicitly win over the preset.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let mut tuning = Tuning::deserialize(&value)?;
        let explicit = |field: &str| {
            value
                .get("shooter")
                .and_then(|shooter| shooter.get(field))
                .is_some()
        };
        tuning.apply_difficulty_except(tuning.difficulty, explicit);
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!(
            "Loaded tuning from {} ({})",
            path.as_ref().display(),
            tuning.difficulty.as_str()
        );
        Ok(tuning)
    }

    /// Check ranges that would otherwise produce nonsense at runtime
    pub fn validate(&self) -> Result<(), TuningError> {
        let surf = &self.surf;
        FloatRange::new(surf.speed_min, surf.speed_max).validate("surf speed")?;
        FloatRange::new(surf.ground_speed_floor, surf.speed_max).validate("ground speed floor")?;
        FloatRange::new(surf.air_speed_floor, surf.speed_max).validate("air speed floor")?;
        WaveField::from_tuning(&surf.waves, &self.viewport).check_epsilon()?;

        let shooter = &self.shooter;
        for (name, cadence) in [
            ("obstacle cadence", &shooter.obstacle_cadence),
            ("enemy cadence", &shooter.enemy_cadence),
        ] {
            FloatRange::new(cadence.min_interval, cadence.base_interval).validate(name)?;
            cadence.jitter.validate(name)?;
        }
        shooter.drift_amplitude.validate("drift amplitude")?;
        shooter.fire_cooldown.validate("enemy fire cooldown")?;
        shooter.fire_window.validate("enemy fire window")?;
        FloatRange::new(0.0, shooter.far_depth).validate("far depth")?;

        FloatRange::new(0.0, self.combat.shield_absorb).validate("shield absorb")?;
        FloatRange::new(self.combat.shield_absorb, 1.0).validate("shield absorb")?;
        FloatRange::new(1.0, self.combat.multiplier_cap).validate("multiplier cap")?;
        Ok(())
    }
}
