//! Procedural wave terrain
//!
//! The wave face is a pure function of horizontal position and an animation
//! phase. Nothing is stored per point, so the domain is unbounded and two calls
//! with the same `(x, phase)` always agree.
//!
//! Slope is always taken by central difference over the height function, never
//! analytically, so the physics sees exactly the surface that gets drawn no
//! matter how the components are tuned.

use serde::{Deserialize, Serialize};

use crate::tuning::{TuningError, Viewport, WaveTuning};

/// A height function over a 1-D horizontal domain (screen space, y-down)
pub trait HeightField {
    /// Surface height at `x` for the given animation phase
    fn height(&self, x: f32, phase: f32) -> f32;

    /// Half step used by [`HeightField::slope`]
    fn epsilon(&self) -> f32 {
        2.0
    }

    /// Surface slope `dh/dx` by symmetric finite difference.
    ///
    /// Positive slope means the surface drops toward +x (downhill in y-down space).
    fn slope(&self, x: f32, phase: f32) -> f32 {
        let eps = self.epsilon();
        (self.height(x + eps, phase) - self.height(x - eps, phase)) / (2.0 * eps)
    }

    /// Surface angle in radians at `x`
    fn angle(&self, x: f32, phase: f32) -> f32 {
        self.slope(x, phase).atan()
    }
}

/// One sinusoidal wave train
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveComponent {
    /// Peak displacement (pixels)
    pub amplitude: f32,
    /// Radians per pixel
    pub spatial_freq: f32,
    /// Radians per unit of phase (sign sets travel direction)
    pub phase_rate: f32,
}

impl WaveComponent {
    pub const fn new(amplitude: f32, spatial_freq: f32, phase_rate: f32) -> Self {
        Self {
            amplitude,
            spatial_freq,
            phase_rate,
        }
    }

    /// Spatial wavelength in pixels (infinite for a flat component)
    pub fn wavelength(&self) -> f32 {
        if self.spatial_freq.abs() > f32::EPSILON {
            std::f32::consts::TAU / self.spatial_freq.abs()
        } else {
            f32::INFINITY
        }
    }

    #[inline]
    fn displacement(&self, x: f32, phase: f32) -> f32 {
        (x * self.spatial_freq + phase * self.phase_rate).sin() * self.amplitude
    }
}

/// Sum-of-sinusoids swell around a resting water line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveField {
    pub base_height: f32,
    pub components: Vec<WaveComponent>,
    pub epsilon: f32,
}

impl WaveField {
    pub fn new(base_height: f32, components: Vec<WaveComponent>, epsilon: f32) -> Self {
        Self {
            base_height,
            components,
            epsilon,
        }
    }

    /// Flat water at `base_height`
    pub fn flat(base_height: f32) -> Self {
        Self::new(base_height, Vec::new(), 2.0)
    }

    pub fn from_tuning(waves: &WaveTuning, viewport: &Viewport) -> Self {
        Self::new(
            viewport.height * waves.base_height_ratio,
            waves.components.clone(),
            waves.slope_epsilon,
        )
    }

    /// Largest possible distance of the surface from `base_height`
    pub fn amplitude_bound(&self) -> f32 {
        self.components.iter().map(|c| c.amplitude.abs()).sum()
    }

    /// Reject a finite-difference step that would alias the shortest wave
    pub fn check_epsilon(&self) -> Result<(), TuningError> {
        let shortest = self
            .components
            .iter()
            .filter(|c| c.amplitude != 0.0)
            .map(WaveComponent::wavelength)
            .fold(f32::INFINITY, f32::min);
        if self.epsilon <= 0.0 || self.epsilon > shortest / 8.0 {
            return Err(TuningError::SlopeEpsilonTooCoarse {
                epsilon: self.epsilon,
                wavelength: shortest,
            });
        }
        Ok(())
    }
}

impl HeightField for WaveField {
    fn height(&self, x: f32, phase: f32) -> f32 {
        self.base_height
            + self
                .components
                .iter()
                .map(|c| c.displacement(x, phase))
                .sum::<f32>()
    }

    fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

/// Phase advance for one step.
///
/// The swell animates with time, optionally faster when the rider is quick.
#[inline]
pub fn advance_phase(phase: f32, dt: f32, waves: &WaveTuning, rider_speed: f32) -> f32 {
    phase + dt * (waves.phase_rate + waves.speed_coupling * rider_speed.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Single closed-form sine with a known derivative
    struct Sine {
        amplitude: f32,
        k: f32,
        eps: f32,
    }

    impl HeightField for Sine {
        fn height(&self, x: f32, _phase: f32) -> f32 {
            self.amplitude * (self.k * x).sin()
        }

        fn epsilon(&self) -> f32 {
            self.eps
        }
    }

    fn default_field() -> WaveField {
        WaveField::from_tuning(&WaveTuning::default(), &Viewport::default())
    }

    #[test]
    fn test_flat_field_has_zero_slope() {
        let field = WaveField::flat(400.0);
        assert_eq!(field.height(123.0, 9.0), 400.0);
        assert_eq!(field.slope(-55.0, 3.0), 0.0);
        assert_eq!(field.amplitude_bound(), 0.0);
    }

    #[test]
    fn test_slope_converges_to_analytic_derivative() {
        let x = 37.0_f32;
        let analytic = 80.0 * 0.01 * (0.01 * x).cos();

        let mut last_err = f32::INFINITY;
        for eps in [40.0, 10.0, 2.5] {
            let field = Sine {
                amplitude: 80.0,
                k: 0.01,
                eps,
            };
            let err = (field.slope(x, 0.0) - analytic).abs();
            assert!(err < last_err, "error should shrink with epsilon");
            last_err = err;
        }
        assert!(last_err < 1e-3);
    }

    #[test]
    fn test_slope_sign_is_downhill_positive() {
        // Height grows with x in y-down space => surface falls away => downhill
        struct Ramp;
        impl HeightField for Ramp {
            fn height(&self, x: f32, _phase: f32) -> f32 {
                0.5 * x
            }
        }
        assert!((Ramp.slope(10.0, 0.0) - 0.5).abs() < 1e-5);
        assert!(Ramp.angle(10.0, 0.0) > 0.0);
    }

    #[test]
    fn test_default_epsilon_is_fine_enough() {
        assert!(default_field().check_epsilon().is_ok());
        let mut coarse = default_field();
        coarse.epsilon = 100.0;
        assert!(coarse.check_epsilon().is_err());
    }

    #[test]
    fn test_phase_advance_with_coupling() {
        let mut waves = WaveTuning::default();
        assert!((advance_phase(1.0, 0.5, &waves, 300.0) - 1.2).abs() < 1e-6);
        waves.speed_coupling = 0.001;
        assert!((advance_phase(1.0, 0.5, &waves, 300.0) - 1.35).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_height_bounded(x in -1.0e5f32..1.0e5, phase in -1.0e3f32..1.0e3) {
            let field = default_field();
            let h = field.height(x, phase);
            prop_assert!(h.is_finite());
            prop_assert!((h - field.base_height).abs() <= field.amplitude_bound() + 1e-2);
        }

        #[test]
        fn prop_height_continuous(x in -1.0e4f32..1.0e4, phase in 0.0f32..100.0) {
            let field = default_field();
            let step = 0.01;
            let jump = (field.height(x + step, phase) - field.height(x, phase)).abs();
            // Max |dh/dx| is the sum of amplitude * frequency
            let lipschitz: f32 = field.components.iter().map(|c| (c.amplitude * c.spatial_freq).abs()).sum();
            prop_assert!(jump <= lipschitz * step + 1e-2);
        }
    }
}
