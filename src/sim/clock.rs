//! Frame timing
//!
//! [`FrameClock`] turns monotonic millisecond timestamps into a clamped
//! frame delta, and [`FixedStepper`] slices that delta into fixed simulation
//! steps.

use crate::consts::{FRAME_DT_MAX, MAX_SUBSTEPS, SIM_DT};

/// Clamped delta-time source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    last_ms: Option<f64>,
    dt_max: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_DT_MAX)
    }
}

impl FrameClock {
    pub fn new(dt_max: f32) -> Self {
        Self {
            last_ms: None,
            dt_max: dt_max.max(0.0),
        }
    }

    /// Seconds since the previous call, clamped to `[0, dt_max]`.
    ///
    /// The first call after creation or reset only records the timestamp.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        if dt.is_finite() {
            dt.clamp(0.0, self.dt_max)
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedStepper {
    pub accumulator: f32,
}

impl FixedStepper {
    /// Add a frame delta and return how many `SIM_DT` steps to run.
    ///
    /// Never more than `MAX_SUBSTEPS`; backlog beyond that is dropped so a
    /// stalled tab does not replay seconds of simulation.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
