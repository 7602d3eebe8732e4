//! Input buffering and the control signal
//!
//! Browser handlers never touch simulation state. They push [`InputEvent`]s
//! into an [`InputQueue`] owned by the frame driver, and the queue is folded
//! into the [`ControlSignal`] exactly once per simulation step.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::INPUT_QUEUE_CAPACITY;
use crate::tuning::SurfTuning;

/// A discrete input from any device
///
/// Keyboard, mouse and touch all map onto the single primary action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    PrimaryDown,
    PrimaryUp,
    SteerLeft(bool),
    SteerRight(bool),
    /// Window blur / tab hidden
    FocusLost,
    /// Pause toggle
    Pause,
    /// Restart the whole session
    Reset,
}

/// Bounded FIFO of pending input events
#[derive(Debug, Clone)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
    capacity: usize,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::with_capacity(INPUT_QUEUE_CAPACITY)
    }
}

impl InputQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Enqueue an event, evicting the oldest one when full
    pub fn push(&mut self, event: InputEvent) {
        if self.events.len() >= self.capacity {
            let dropped = self.events.pop_front();
            log::warn!("Input queue full, dropped {:?}", dropped);
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Take every pending event in arrival order
    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }
}

/// Continuous control state read by the simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSignal {
    /// Primary action held (dive / fire)
    pub holding: bool,
    /// Seconds of grounded hold, capped at `charge_max`
    pub charge: f32,
    pub steer_left: bool,
    pub steer_right: bool,
}

impl ControlSignal {
    /// Lateral steering in [-1, 1]
    pub fn steer_axis(&self) -> f32 {
        match (self.steer_left, self.steer_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Drop every held control (blur, reset)
    pub fn release_all(&mut self) {
        self.holding = false;
        self.charge = 0.0;
        self.steer_left = false;
        self.steer_right = false;
    }
}

/// What happened while folding one step's events
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FoldOutcome {
    /// A hold started this step
    pub pressed: bool,
    /// A hold ended by release this step, with the charge it had
    pub released: Option<f32>,
    pub focus_lost: bool,
    pub pause_toggled: bool,
    pub reset: bool,
}

/// Snapshot handed to the simulation for one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepControl {
    pub holding: bool,
    pub charge: f32,
    pub steer: f32,
    /// Charge carried by a release this step; at most one takeoff per step
    pub released: Option<f32>,
}

/// Folds queued events into the control signal
#[derive(Debug, Clone, Default)]
pub struct InputController {
    pub queue: InputQueue,
    pub signal: ControlSignal,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Drain the queue into the control signal.
    ///
    /// Events before the last `Reset` belong to the session being discarded and
    /// are dropped; the caller performs the reset when `outcome.reset` is set.
    pub fn fold(&mut self) -> FoldOutcome {
        let mut events = self.queue.drain();
        let mut outcome = FoldOutcome::default();

        if let Some(last_reset) = events.iter().rposition(|e| *e == InputEvent::Reset) {
            events.drain(..=last_reset);
            self.signal = ControlSignal::default();
            outcome.reset = true;
        }

        for event in events {
            match event {
                InputEvent::PrimaryDown => {
                    if !self.signal.holding {
                        self.signal.holding = true;
                        self.signal.charge = 0.0;
                        outcome.pressed = true;
                    }
                }
                InputEvent::PrimaryUp => {
                    if self.signal.holding {
                        self.signal.holding = false;
                        outcome.released = Some(self.signal.charge);
                    }
                }
                InputEvent::SteerLeft(down) => self.signal.steer_left = down,
                InputEvent::SteerRight(down) => self.signal.steer_right = down,
                InputEvent::FocusLost => {
                    self.signal.release_all();
                    outcome.focus_lost = true;
                }
                InputEvent::Pause => outcome.pause_toggled = !outcome.pause_toggled,
                // Stripped above
                InputEvent::Reset => {}
            }
        }

        outcome
    }

    /// Control snapshot for the step that follows `fold`
    pub fn snapshot(&self, outcome: &FoldOutcome) -> StepControl {
        StepControl {
            holding: self.signal.holding,
            charge: self.signal.charge,
            steer: self.signal.steer_axis(),
            released: outcome.released,
        }
    }

    /// Post-step charge bookkeeping.
    ///
    /// Charge only builds while held on the ground; a takeoff spends it and a
    /// released control lets it bleed away.
    pub fn settle(&mut self, took_off: bool, grounded: bool, dt: f32, surf: &SurfTuning) {
        let signal = &mut self.signal;
        if took_off {
            signal.charge = 0.0;
        } else if signal.holding && grounded {
            signal.charge = (signal.charge + dt).min(surf.charge_max);
        } else if !signal.holding {
            signal.charge = (signal.charge - surf.charge_decay * dt).max(0.0);
        }
    }

    /// Forget all pending and held input
    pub fn reset(&mut self) {
        self.queue.clear();
        self.signal = ControlSignal::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with(events: &[InputEvent]) -> InputController {
        let mut controller = InputController::new();
        for e in events {
            controller.push(*e);
        }
        controller
    }

    #[test]
    fn test_press_then_release_reports_charge() {
        let mut controller = controller_with(&[InputEvent::PrimaryDown]);
        let outcome = controller.fold();
        assert!(outcome.pressed);
        assert!(controller.signal.holding);

        controller.signal.charge = 0.4;
        controller.push(InputEvent::PrimaryUp);
        let outcome = controller.fold();
        assert_eq!(outcome.released, Some(0.4));
        assert!(!controller.signal.holding);
    }

    #[test]
    fn test_repeated_press_does_not_restart_charge() {
        let mut controller = controller_with(&[InputEvent::PrimaryDown]);
        controller.fold();
        controller.signal.charge = 0.3;

        // Second device presses while the first is still down
        controller.push(InputEvent::PrimaryDown);
        let outcome = controller.fold();
        assert!(!outcome.pressed);
        assert_eq!(controller.signal.charge, 0.3);
    }

    #[test]
    fn test_release_without_hold_is_ignored() {
        let mut controller = controller_with(&[InputEvent::PrimaryUp, InputEvent::PrimaryUp]);
        let outcome = controller.fold();
        assert_eq!(outcome.released, None);
    }

    #[test]
    fn test_many_taps_yield_single_release() {
        let mut controller = controller_with(&[
            InputEvent::PrimaryDown,
            InputEvent::PrimaryUp,
            InputEvent::PrimaryDown,
            InputEvent::PrimaryUp,
            InputEvent::PrimaryDown,
            InputEvent::PrimaryUp,
        ]);
        let outcome = controller.fold();
        assert!(outcome.released.is_some());
        assert!(!controller.signal.holding);
        assert_eq!(controller.snapshot(&outcome).released, Some(0.0));
    }

    #[test]
    fn test_focus_lost_clears_hold_and_charge() {
        let mut controller = controller_with(&[InputEvent::PrimaryDown, InputEvent::SteerLeft(true)]);
        controller.fold();
        controller.signal.charge = 0.7;

        controller.push(InputEvent::FocusLost);
        let outcome = controller.fold();
        assert!(outcome.focus_lost);
        assert_eq!(outcome.released, None);
        assert!(!controller.signal.holding);
        assert_eq!(controller.signal.charge, 0.0);
        assert_eq!(controller.signal.steer_axis(), 0.0);
    }

    #[test]
    fn test_reset_discards_earlier_events() {
        let mut controller = controller_with(&[
            InputEvent::PrimaryDown,
            InputEvent::Reset,
            InputEvent::SteerRight(true),
        ]);
        let outcome = controller.fold();
        assert!(outcome.reset);
        assert!(!outcome.pressed);
        assert!(!controller.signal.holding);
        assert_eq!(controller.signal.steer_axis(), 1.0);
    }

    #[test]
    fn test_double_pause_cancels() {
        let mut controller = controller_with(&[InputEvent::Pause, InputEvent::Pause]);
        assert!(!controller.fold().pause_toggled);
    }

    #[test]
    fn test_queue_evicts_oldest_when_full() {
        let mut queue = InputQueue::with_capacity(2);
        queue.push(InputEvent::PrimaryDown);
        queue.push(InputEvent::SteerLeft(true));
        queue.push(InputEvent::PrimaryUp);
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.drain(),
            vec![InputEvent::SteerLeft(true), InputEvent::PrimaryUp]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_settle_charge_rules() {
        let surf = SurfTuning::default();
        let mut controller = InputController::new();
        controller.signal.holding = true;

        // Grounded hold builds charge up to the cap
        for _ in 0..200 {
            controller.settle(false, true, 0.01, &surf);
        }
        assert!((controller.signal.charge - surf.charge_max).abs() < 1e-6);

        // Airborne hold neither builds nor decays
        controller.signal.charge = 0.5;
        controller.settle(false, false, 0.1, &surf);
        assert_eq!(controller.signal.charge, 0.5);

        // Released decays toward zero
        controller.signal.holding = false;
        controller.settle(false, true, 0.1, &surf);
        assert!((controller.signal.charge - 0.3).abs() < 1e-6);

        // Takeoff spends it
        controller.settle(true, true, 0.1, &surf);
        assert_eq!(controller.signal.charge, 0.0);
    }
}
