//! Surfer kinematics
//!
//! Screen space, y-down: negative `vy` moves up and "above the wave" means
//! `y < height(x)`. The surfer is either riding the face (grounded) or in the
//! air; there is no third state.

use serde::{Deserialize, Serialize};

use super::input::StepControl;
use super::state::GameEvent;
use super::terrain::HeightField;
use crate::consts::{DRAG_REFERENCE_RATE, MAX_TILT};
use crate::tuning::SurfTuning;
use crate::{approach, ease_out_quad};

/// Result of one surfer step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurferStep {
    /// An explicit (release) takeoff spent the charge this step
    pub took_off: bool,
    pub grounded: bool,
}

/// The player-controlled rider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surfer {
    /// Forward progress along the track (never decreases)
    pub x: f32,
    pub start_x: f32,
    pub y: f32,
    pub vy: f32,
    pub speed: f32,
    /// Smoothed board angle (radians)
    pub rotation: f32,
    pub airborne: bool,
    /// Seconds since leaving the wave
    pub air_time: f32,
    /// Soft-gravity time left after a takeoff
    pub grace: f32,
}

impl Surfer {
    /// Rider resting on the wave at the origin
    pub fn new<F: HeightField>(terrain: &F, phase: f32, surf: &SurfTuning) -> Self {
        Self {
            x: 0.0,
            start_x: 0.0,
            y: terrain.height(0.0, phase),
            vy: 0.0,
            speed: surf.start_speed.clamp(surf.speed_min, surf.speed_max),
            rotation: 0.0,
            airborne: false,
            air_time: 0.0,
            grace: 0.0,
        }
    }

    /// Distance covered since the start, in world pixels
    pub fn travelled(&self) -> f32 {
        (self.x - self.start_x).max(0.0)
    }

    /// Height above the wave face at the rider's position
    pub fn altitude<F: HeightField>(&self, terrain: &F, phase: f32) -> f32 {
        (terrain.height(self.x, phase) - self.y).max(0.0)
    }

    /// Leave the wave with an impulse built from slope, speed and charge
    pub fn take_off(
        &mut self,
        slope: f32,
        charge: f32,
        surf: &SurfTuning,
        events: &mut Vec<GameEvent>,
    ) {
        let vy = takeoff_velocity(surf, charge, slope, self.speed);
        events.push(GameEvent::Takeoff {
            vy,
            charge,
            slope,
            speed: self.speed,
        });
        log::debug!("Takeoff vy={:.1} charge={:.2} slope={:.2}", vy, charge, slope);

        self.vy = vy;
        self.airborne = true;
        self.air_time = 0.0;
        self.grace = surf.takeoff_grace;
        self.rotation =
            (slope.atan() * surf.takeoff_tilt_gain - surf.takeoff_pitch).clamp(-MAX_TILT, MAX_TILT);
    }

    /// Advance one step against the terrain
    #[allow(clippy::too_many_arguments)]
    pub fn step<F: HeightField>(
        &mut self,
        terrain: &F,
        phase: f32,
        control: &StepControl,
        hover_floor: f32,
        dt: f32,
        surf: &SurfTuning,
        events: &mut Vec<GameEvent>,
    ) -> SurferStep {
        let mut took_off = false;

        // Explicit takeoff: only from the face, and only once per step
        if let Some(charge) = control.released {
            if !self.airborne {
                let slope = terrain.slope(self.x, phase);
                self.take_off(slope, charge, surf, events);
                took_off = true;
            }
        }

        // Gravity: heavier while diving, softer right after a takeoff
        let mut gravity = if control.holding {
            surf.dive_gravity
        } else {
            surf.gravity
        };
        if self.grace > 0.0 {
            gravity *= surf.grace_gravity_scale;
            self.grace = (self.grace - dt).max(0.0);
        }
        self.vy += gravity * dt;

        // Drag toward a floor; the air bleeds speed faster but keeps more of it
        let (drag, floor) = if self.airborne {
            (surf.air_drag, surf.air_speed_floor)
        } else {
            (surf.ground_drag, surf.ground_speed_floor)
        };
        if self.speed > floor {
            let retained = drag.powf(dt * DRAG_REFERENCE_RATE);
            self.speed = (self.speed * retained).max(floor);
        }

        self.x += self.speed * dt;

        self.y += self.vy * dt;
        if self.y < hover_floor {
            self.y = hover_floor;
            self.vy = self.vy.max(0.0);
        }

        let surface = terrain.height(self.x, phase);
        let slope = terrain.slope(self.x, phase);
        let angle = slope.atan();

        if self.y >= surface {
            if self.airborne {
                let hard = self.vy > surf.hard_landing_speed;
                if hard {
                    self.speed *= surf.hard_landing_penalty;
                }
                events.push(GameEvent::Landed {
                    hard,
                    air_time: self.air_time,
                });
            }
            self.airborne = false;
            self.air_time = 0.0;
            self.y = surface.max(hover_floor);
            self.vy = self.vy.min(0.0);

            // Downhill (positive slope) accelerates, uphill brakes
            self.speed += angle.sin() * surf.slope_accel * dt;
            if control.holding {
                self.speed += surf.drive_accel * dt;
            }

            // Thrown off a steep lip when not diving into it
            let lifted = surface - f32::EPSILON * surface.abs().max(1.0);
            if !control.holding && slope < surf.lip_launch_slope && lifted > hover_floor {
                self.vy = -surf.lip_launch_impulse;
                self.airborne = true;
                self.grace = surf.takeoff_grace;
                self.y = lifted;
            }

            self.rotation = approach(self.rotation, angle, surf.ground_smoothing);
        } else {
            self.airborne = true;
            self.air_time += dt;
            let target = self.vy.atan2(self.speed.max(1.0));
            self.rotation = approach(self.rotation, target, surf.air_smoothing);
        }

        self.speed = self.speed.clamp(surf.speed_min, surf.speed_max);

        SurferStep {
            took_off,
            grounded: !self.airborne,
        }
    }
}

/// Upward takeoff velocity (negative, y-down).
///
/// `-(base + slope_impulse * uphill + min(speed_impulse * speed, cap) + charge_impulse * ease(charge))`
pub fn takeoff_velocity(surf: &SurfTuning, charge: f32, slope: f32, speed: f32) -> f32 {
    let uphill = (-slope).max(0.0);
    let speed_bonus = (surf.speed_impulse * speed.max(0.0)).min(surf.speed_impulse_cap);
    let charge_ratio = charge / surf.charge_max.max(f32::EPSILON);
    let charge_bonus = surf.charge_impulse * ease_out_quad(charge_ratio);
    -(surf.base_impulse + surf.slope_impulse * uphill + speed_bonus + charge_bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::terrain::WaveField;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;
    const HOVER: f32 = 30.0;

    fn hold() -> StepControl {
        StepControl {
            holding: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_takeoff_velocity_formula() {
        let surf = SurfTuning::default();
        // Flat, no charge, slow rider: base plus speed bonus
        let vy = takeoff_velocity(&surf, 0.0, 0.0, 100.0);
        assert!((vy + (360.0 + 40.0)).abs() < 1e-3);

        // Speed bonus is capped
        let fast = takeoff_velocity(&surf, 0.0, 0.0, 10_000.0);
        assert!((fast + (360.0 + 140.0)).abs() < 1e-3);

        // Half charge is eased: 0.75 of the full charge bonus
        let half = takeoff_velocity(&surf, 0.5, 0.0, 100.0);
        assert!((half - vy + 0.75 * 380.0).abs() < 1e-3);

        // Uphill adds, downhill does not subtract
        let uphill = takeoff_velocity(&surf, 0.0, -0.5, 100.0);
        assert!((uphill - vy + 210.0).abs() < 1e-3);
        assert_eq!(takeoff_velocity(&surf, 0.0, 0.5, 100.0), vy);
    }

    #[test]
    fn test_zero_charge_max_is_guarded() {
        let surf = SurfTuning {
            charge_max: 0.0,
            ..Default::default()
        };
        assert!(takeoff_velocity(&surf, 0.0, 0.0, 100.0).is_finite());
    }

    #[test]
    fn test_rests_on_flat_water() {
        let surf = SurfTuning::default();
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        let mut events = Vec::new();

        for _ in 0..120 {
            let step = surfer.step(&field, 0.0, &StepControl::default(), HOVER, DT, &surf, &mut events);
            assert!(step.grounded);
        }
        assert_eq!(surfer.y, 400.0);
        assert_eq!(surfer.vy, 0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_release_takes_off_and_lands() {
        let surf = SurfTuning::default();
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        let mut events = Vec::new();

        let release = StepControl {
            released: Some(0.0),
            ..Default::default()
        };
        let step = surfer.step(&field, 0.0, &release, HOVER, DT, &surf, &mut events);
        assert!(step.took_off);
        assert!(surfer.airborne);
        assert!(surfer.y < 400.0);

        let mut frames = 0;
        while surfer.airborne && frames < 600 {
            surfer.step(&field, 0.0, &StepControl::default(), HOVER, DT, &surf, &mut events);
            frames += 1;
        }
        assert!(!surfer.airborne);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Landed { .. })));
    }

    #[test]
    fn test_airborne_release_does_nothing() {
        let surf = SurfTuning::default();
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        surfer.y = 200.0;
        surfer.airborne = true;
        let release = StepControl {
            released: Some(1.0),
            ..Default::default()
        };
        let step = surfer.step(&field, 0.0, &release, HOVER, DT, &surf, &mut Vec::new());
        assert!(!step.took_off);
    }

    #[test]
    fn test_drag_independent_of_step_rate() {
        let surf = SurfTuning {
            gravity: 0.0,
            ..Default::default()
        };
        let field = WaveField::flat(400.0);
        let coast = |steps: u32| {
            let mut surfer = Surfer::new(&field, 0.0, &surf);
            surfer.y = 200.0;
            surfer.airborne = true;
            surfer.speed = 500.0;
            let dt = 1.0 / steps as f32;
            for _ in 0..steps {
                surfer.step(&field, 0.0, &StepControl::default(), HOVER, dt, &surf, &mut Vec::new());
            }
            assert!(surfer.airborne);
            surfer.speed
        };

        let at_60 = coast(60);
        let at_120 = coast(120);
        assert!((at_60 - at_120).abs() < 0.05, "{at_60} vs {at_120}");
        // 0.995 per 60 Hz frame over one second
        assert!((at_60 - 500.0 * 0.995f32.powi(60)).abs() < 0.05);
    }

    #[test]
    fn test_hard_landing_costs_speed() {
        let surf = SurfTuning::default();
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        surfer.y = 399.0;
        surfer.vy = 600.0;
        surfer.airborne = true;
        surfer.speed = 300.0;

        let mut events = Vec::new();
        surfer.step(&field, 0.0, &StepControl::default(), HOVER, DT, &surf, &mut events);
        assert!(!surfer.airborne);
        assert_eq!(surfer.vy, 0.0);
        assert!(matches!(events[0], GameEvent::Landed { hard: true, .. }));
        // Drag then the penalty: well below what drag alone would leave
        assert!(surfer.speed < 300.0 * surf.ground_drag * 0.99);
    }

    #[test]
    fn test_hover_floor_stops_climb() {
        let surf = SurfTuning::default();
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        surfer.y = HOVER + 1.0;
        surfer.vy = -2000.0;
        surfer.airborne = true;

        surfer.step(&field, 0.0, &StepControl::default(), HOVER, DT, &surf, &mut Vec::new());
        assert_eq!(surfer.y, HOVER);
        assert!(surfer.vy >= 0.0);
    }

    #[test]
    fn test_downhill_accelerates_uphill_brakes() {
        struct Ramp(f32);
        impl HeightField for Ramp {
            fn height(&self, x: f32, _phase: f32) -> f32 {
                400.0 + self.0 * x
            }
        }
        let surf = SurfTuning::default();
        let control = hold();

        // Gentle enough that gravity keeps the board on the face
        let downhill = Ramp(0.1);
        let mut a = Surfer::new(&downhill, 0.0, &surf);
        let uphill = Ramp(-0.1);
        let mut b = Surfer::new(&uphill, 0.0, &surf);
        for _ in 0..30 {
            a.step(&downhill, 0.0, &control, HOVER, DT, &surf, &mut Vec::new());
            b.step(&uphill, 0.0, &control, HOVER, DT, &surf, &mut Vec::new());
            assert!(!a.airborne && !b.airborne);
        }
        assert!(a.speed > surf.start_speed);
        assert!(b.speed < a.speed);
    }

    #[test]
    fn test_lip_launch_on_steep_rise() {
        struct Wall;
        impl HeightField for Wall {
            fn height(&self, x: f32, _phase: f32) -> f32 {
                400.0 - 0.9 * x
            }
        }
        let surf = SurfTuning::default();
        let mut surfer = Surfer::new(&Wall, 0.0, &surf);
        surfer.step(&Wall, 0.0, &StepControl::default(), HOVER, DT, &surf, &mut Vec::new());
        assert!(surfer.airborne);
        assert_eq!(surfer.vy, -surf.lip_launch_impulse);

        // Holding dives through instead
        let mut diver = Surfer::new(&Wall, 0.0, &surf);
        diver.step(&Wall, 0.0, &hold(), HOVER, DT, &surf, &mut Vec::new());
        assert!(!diver.airborne);
    }

    #[test]
    fn test_takeoff_tilt_is_clamped() {
        let surf = SurfTuning {
            takeoff_tilt_gain: 10.0,
            ..Default::default()
        };
        let field = WaveField::flat(400.0);
        let mut surfer = Surfer::new(&field, 0.0, &surf);
        surfer.take_off(-5.0, 0.0, &surf, &mut Vec::new());
        assert_eq!(surfer.rotation, -MAX_TILT);
    }

    #[derive(Debug, Clone)]
    enum Pattern {
        Idle,
        Hold,
        Release,
    }

    fn pattern() -> impl Strategy<Value = Pattern> {
        prop_oneof![Just(Pattern::Idle), Just(Pattern::Hold), Just(Pattern::Release)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_speed_and_hover_bounds(
            script in prop::collection::vec((pattern(), 1usize..90), 1..60),
            charge in 0.0f32..1.0,
        ) {
            let surf = SurfTuning::default();
            let field = WaveField::from_tuning(&surf.waves, &crate::tuning::Viewport::default());
            let mut surfer = Surfer::new(&field, 0.0, &surf);
            let mut phase = 0.0;
            let mut last_x = surfer.x;

            for (pattern, frames) in script {
                for frame in 0..frames {
                    let control = match pattern {
                        Pattern::Idle => StepControl::default(),
                        Pattern::Hold => hold(),
                        Pattern::Release if frame == 0 => StepControl { released: Some(charge), ..Default::default() },
                        Pattern::Release => StepControl::default(),
                    };
                    phase += DT * surf.waves.phase_rate;
                    surfer.step(&field, phase, &control, HOVER, DT, &surf, &mut Vec::new());

                    prop_assert!(surfer.speed >= surf.speed_min && surfer.speed <= surf.speed_max);
                    prop_assert!(surfer.y >= HOVER);
                    prop_assert!(surfer.x > last_x);
                    let below_surface = surfer.y < field.height(surfer.x, phase);
                    prop_assert_eq!(surfer.airborne, below_surface);
                    last_x = surfer.x;
                }
            }
        }
    }
}
