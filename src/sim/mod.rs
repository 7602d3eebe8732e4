//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entities)
//! - No rendering or platform dependencies

pub mod actor;
pub mod clock;
pub mod collision;
pub mod context;
pub mod input;
pub mod population;
pub mod state;
pub mod terrain;
pub mod tick;

pub use actor::{Surfer, SurferStep, takeoff_velocity};
pub use clock::{FixedStepper, FrameClock};
pub use collision::{PlayerBody, overlap, resolve};
pub use context::SimulationContext;
pub use input::{ControlSignal, InputController, InputEvent, InputQueue, StepControl};
pub use population::{Entity, EntityKind, EntityTag, Population, Side, SpawnTimer};
pub use state::{DamageReport, EndReport, GameEvent, SessionMode, SessionState};
pub use terrain::{HeightField, WaveComponent, WaveField};
pub use tick::{HudSnapshot, Player, ShooterGame, Simulation, StepFeedback, SurfGame};
