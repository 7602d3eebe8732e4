//! Session state and simulation events
//!
//! Everything the HUD reads about a run (mode, score, health) lives in
//! [`SessionState`]; everything the presentation layer may want to react to
//! is reported as a [`GameEvent`].

use serde::{Deserialize, Serialize};

use super::population::EntityTag;
use crate::tuning::CombatTuning;

/// Current mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// Waiting for the first primary press
    Menu,
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Health ran out
    Ended,
    /// Final wave cleared
    Victory,
}

impl SessionMode {
    /// No further simulation happens in a terminal mode
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionMode::Ended | SessionMode::Victory)
    }
}

/// Final numbers handed to the end-of-session screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndReport {
    pub score: f32,
    /// Metres travelled
    pub distance: f32,
    pub wave: u32,
    pub elapsed: f32,
}

/// How a hit was split between shield and health
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub shield_absorbed: f32,
    pub health_lost: f32,
    /// This hit ended the session
    pub fatal: bool,
}

/// Things that happened during a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    Paused,
    Resumed,
    Takeoff {
        vy: f32,
        charge: f32,
        slope: f32,
        speed: f32,
    },
    Landed {
        hard: bool,
        air_time: f32,
    },
    Spawned {
        id: u32,
        tag: EntityTag,
    },
    Damaged(DamageReport),
    Destroyed {
        id: u32,
        tag: EntityTag,
        points: f32,
    },
    /// An enemy slipped past the player plane
    Breached {
        id: u32,
    },
    WaveAdvanced(u32),
    SessionEnded(EndReport),
    Victory(EndReport),
}

/// Score, health and progression for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: SessionMode,
    pub score: f32,
    pub multiplier: f32,
    /// Seconds left before the multiplier starts to decay
    pub combo_timer: f32,
    /// Metres travelled
    pub distance: f32,
    pub health: f32,
    pub shield: f32,
    /// Seconds of damage immunity left
    pub invulnerable: f32,
    /// 1-based wave index
    pub wave: u32,
    /// Seconds spent running
    pub elapsed: f32,
}

impl SessionState {
    pub fn new(combat: &CombatTuning) -> Self {
        Self {
            mode: SessionMode::Menu,
            score: 0.0,
            multiplier: 1.0,
            combo_timer: 0.0,
            distance: 0.0,
            health: combat.max_health,
            shield: combat.max_shield,
            invulnerable: 0.0,
            wave: 1,
            elapsed: 0.0,
        }
    }

    /// Leave the menu
    pub fn begin(&mut self) -> bool {
        if self.mode == SessionMode::Menu {
            self.mode = SessionMode::Running;
            log::info!("Session started");
            return true;
        }
        false
    }

    /// Toggle between Running and Paused; returns the event to report
    pub fn toggle_pause(&mut self) -> Option<GameEvent> {
        match self.mode {
            SessionMode::Running => {
                self.mode = SessionMode::Paused;
                Some(GameEvent::Paused)
            }
            SessionMode::Paused => {
                self.mode = SessionMode::Running;
                Some(GameEvent::Resumed)
            }
            _ => None,
        }
    }

    pub fn report(&self) -> EndReport {
        EndReport {
            score: self.score,
            distance: self.distance,
            wave: self.wave,
            elapsed: self.elapsed,
        }
    }

    /// Apply incoming damage.
    ///
    /// The shield soaks `shield_absorb` of the hit while it lasts, health takes
    /// the rest. Returns `None` when the hit was ignored (immunity window or the
    /// run is already over).
    pub fn apply_damage(
        &mut self,
        amount: f32,
        combat: &CombatTuning,
        events: &mut Vec<GameEvent>,
    ) -> Option<DamageReport> {
        if self.mode.is_terminal() || self.invulnerable > 0.0 || amount <= 0.0 {
            return None;
        }

        let shield_absorbed = self.shield.min(combat.shield_absorb * amount);
        self.shield -= shield_absorbed;
        let health_before = self.health;
        self.health = (self.health - (amount - shield_absorbed)).max(0.0);
        self.invulnerable = combat.invulnerability_window;
        self.multiplier = 1.0 + (self.multiplier - 1.0) * combat.damage_multiplier_keep;

        let fatal = self.health <= 0.0;
        let report = DamageReport {
            shield_absorbed,
            health_lost: health_before - self.health,
            fatal,
        };
        events.push(GameEvent::Damaged(report));

        if fatal {
            self.mode = SessionMode::Ended;
            let end = self.report();
            log::info!(
                "Session ended: score {:.0}, distance {:.0} m, wave {}",
                end.score,
                end.distance,
                end.wave
            );
            events.push(GameEvent::SessionEnded(end));
        }
        Some(report)
    }

    /// Award points scaled by the current multiplier, then grow it
    pub fn award(&mut self, base_points: f32, combat: &CombatTuning) -> f32 {
        let points = base_points * self.multiplier;
        self.score += points;
        self.multiplier = (self.multiplier + combat.multiplier_step).min(combat.multiplier_cap);
        self.combo_timer = combat.combo_window;
        points
    }

    /// Count down immunity and the combo window
    pub fn tick_timers(&mut self, dt: f32, combat: &CombatTuning) {
        self.elapsed += dt;
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        if self.combo_timer > 0.0 {
            self.combo_timer = (self.combo_timer - dt).max(0.0);
        } else if self.multiplier > 1.0 {
            self.multiplier = (self.multiplier - combat.multiplier_decay * dt).max(1.0);
        }
    }

    /// Record the final wave being cleared
    pub fn win(&mut self, events: &mut Vec<GameEvent>) {
        if self.mode.is_terminal() {
            return;
        }
        self.mode = SessionMode::Victory;
        let end = self.report();
        log::info!("Victory: score {:.0} after {} waves", end.score, end.wave - 1);
        events.push(GameEvent::Victory(end));
    }
}
