//! Frame driver
//!
//! [`SimulationContext`] owns everything that changes between frames: the
//! clock, the step accumulator, the input queue and the game itself. Input
//! handlers only call [`SimulationContext::push_input`]; the queue is folded
//! once per frame, at the start of the first fixed step.

use super::clock::{FixedStepper, FrameClock};
use super::input::{FoldOutcome, InputController, InputEvent};
use super::state::{GameEvent, SessionMode};
use super::tick::{HudSnapshot, Simulation};
use crate::consts::{FRAME_DT_MAX, SIM_DT};

pub struct SimulationContext<S: Simulation> {
    pub clock: FrameClock,
    pub stepper: FixedStepper,
    pub input: InputController,
    game: S,
    /// Events raised during the last frame
    events: Vec<GameEvent>,
}

impl<S: Simulation> SimulationContext<S> {
    pub fn new(game: S) -> Self {
        Self {
            clock: FrameClock::new(FRAME_DT_MAX),
            stepper: FixedStepper::default(),
            input: InputController::new(),
            game,
            events: Vec::new(),
        }
    }

    pub fn game(&self) -> &S {
        &self.game
    }

    pub fn hud(&self) -> HudSnapshot {
        self.game.hud()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Buffer an input event until the next frame
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one display frame from a monotonic timestamp in milliseconds
    pub fn frame(&mut self, now_ms: f64) -> &[GameEvent] {
        let dt = self.clock.advance(now_ms);
        self.advance(dt)
    }

    /// Run one frame of `dt` seconds, bypassing the clock
    pub fn advance(&mut self, dt: f32) -> &[GameEvent] {
        self.events.clear();
        let steps = self.stepper.accumulate(dt);

        for step in 0..steps {
            let outcome = if step == 0 {
                let mut outcome = self.input.fold();
                if outcome.reset {
                    // Controls folded after the reset carry into the new run
                    self.restart();
                    self.apply_mode_changes(&mut outcome);
                    break;
                }
                self.apply_mode_changes(&mut outcome);
                outcome
            } else {
                FoldOutcome::default()
            };

            if self.game.session().mode != SessionMode::Running {
                continue;
            }

            let control = self.input.snapshot(&outcome);
            let feedback = self.game.step(&control, SIM_DT, &mut self.events);
            let surf = &self.game.tuning().surf;
            self.input
                .settle(feedback.took_off, feedback.grounded, SIM_DT, surf);
        }

        &self.events
    }

    /// Restart the session: game, controls, clock and accumulator.
    ///
    /// The new session is already Running, so repeated resets land on the
    /// same state.
    pub fn reset(&mut self) {
        self.input.reset();
        self.restart();
    }

    fn restart(&mut self) {
        self.game.reset();
        self.game.session_mut().begin();
        self.clock.reset();
        self.stepper.reset();
        log::info!("Session reset");
    }

    fn apply_mode_changes(&mut self, outcome: &mut FoldOutcome) {
        let pause_on_blur = self.game.tuning().pause_on_focus_loss;
        let session = self.game.session_mut();

        if outcome.focus_lost && pause_on_blur && session.mode == SessionMode::Running {
            if let Some(event) = session.toggle_pause() {
                log::info!("Paused on focus loss");
                self.events.push(event);
            }
        }

        if outcome.pause_toggled {
            if let Some(event) = session.toggle_pause() {
                self.events.push(event);
            }
        }

        // The first press only starts the run, along with any release folded with it
        if outcome.pressed && session.mode == SessionMode::Menu {
            session.begin();
            self.events.push(GameEvent::SessionStarted);
            self.input.signal.holding = false;
            outcome.pressed = false;
            outcome.released = None;
        }
    }
}
