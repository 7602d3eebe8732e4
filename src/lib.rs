//! Swell Rush - wave-surfing and rail-shooter arcade cores
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, actor physics, population, collisions)
//! - `tuning`: Data-driven game balance loaded from JSON
//!
//! Rendering is left to the embedding page; it reads state through
//! [`sim::SimulationContext`] and never writes back.

pub mod sim;
pub mod tuning;

pub use tuning::{Difficulty, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Drag factors in tuning are per frame at this rate (Hz)
    pub const DRAG_REFERENCE_RATE: f32 = 60.0;
    /// Largest frame delta accepted from the clock (seconds)
    pub const FRAME_DT_MAX: f32 = 0.05;

    /// Logical viewport (16:9, the surf terrain is laid out against it)
    pub const VIEWPORT_WIDTH: f32 = 1100.0;
    pub const VIEWPORT_HEIGHT: f32 = 1100.0 / (16.0 / 9.0);

    /// World pixels per displayed metre
    pub const PIXELS_PER_METRE: f32 = 3.0;

    /// Pending input events kept between frames
    pub const INPUT_QUEUE_CAPACITY: usize = 64;

    /// Tolerance for spawn timer expiry (absorbs f32 drift over long countdowns)
    pub const SPAWN_EPSILON: f32 = 1e-4;

    /// Largest takeoff tilt (60 degrees)
    pub const MAX_TILT: f32 = std::f32::consts::FRAC_PI_3;
}

/// Quadratic ease-out on [0, 1]
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Move `current` a fraction of the way toward `target`
#[inline]
pub fn approach(current: f32, target: f32, fraction: f32) -> f32 {
    current + (target - current) * fraction.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_quad_endpoints() {
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        assert_eq!(ease_out_quad(2.0), 1.0);
        assert_eq!(ease_out_quad(-1.0), 0.0);
        // Ease-out front-loads the curve
        assert!(ease_out_quad(0.5) > 0.5);
        assert!((ease_out_quad(0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_approach_never_overshoots() {
        assert!((approach(0.0, 1.0, 0.2) - 0.2).abs() < 1e-6);
        assert_eq!(approach(0.0, 1.0, 3.0), 1.0);
        assert_eq!(approach(0.5, 0.5, 0.9), 0.5);
    }
}
