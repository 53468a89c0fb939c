//! Stopwatch state machine.
//!
//! Pure logic, no hardware dependencies. Consumes debounced key events and
//! the periodic tick, owns the elapsed value, and describes its side
//! effects as data — the firmware loop executes them against the display,
//! the record store and the log. That split keeps every transition
//! testable without a board.
//!
//! ```text
//!            release(short)           press
//!  IDLE ───────────────────▶ RUN ─────────────▶ PRE_STOP ─▶ STOP
//!   │  hold > clear           │ press, beats record          │
//!   ▼                         ▼                              ▼
//!  CLEAR_CONFIRM ─▶ CLEARED  RECORD             hold > save: SAVED
//! ```
//!
//! Every waiting state falls back to IDLE (or to sleep, from IDLE itself)
//! through the deadline table in [`crate::policy`].

use heapless::Vec;

use crate::clock::SwTime;
use crate::config::SwConfig;
use crate::keys::{Edge, Key, KeyEvent};
use crate::policy;

/// Operating states. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwState {
    /// Transient: announces the return to idle, then becomes `Idle`.
    PreIdle,
    /// Waiting for a start press (or a long hold toward erase).
    Idle,
    /// Measurement in progress.
    Run,
    /// Transient: becomes `Stop` on the next tick.
    PreStop,
    /// Measurement frozen; a long hold saves it.
    Stop,
    /// "Erase?" prompt showing.
    ClearConfirm,
    /// "Erased" acknowledgment showing.
    Cleared,
    /// Save acknowledgment showing.
    Saved,
    /// New best measurement showing.
    Record,
}

/// Side effects requested by a transition, executed by the firmware loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Render the current elapsed value.
    ShowTime,
    /// Render a fixed prompt.
    ShowText(&'static str),
    /// Append the elapsed value to storage and show its slot number.
    SaveMeasurement,
    /// Append the elapsed value and repoint the best-record pointer at it.
    PersistRecord,
    /// Logically erase all stored measurements.
    EraseRecords,
    /// Queue a host-visible notification.
    Notify(&'static str),
    /// Power down display and timer, wait for the external wake signal.
    Sleep,
}

/// Effect list of one transition.
pub type Effects = Vec<Effect, 4>;

/// The state machine proper.
pub struct Stopwatch {
    state: SwState,
    elapsed: SwTime,
    state_ticks: u32,
    cfg: SwConfig,
}

impl Stopwatch {
    /// Create a machine in `Idle` with a zero reading.
    pub fn new(cfg: SwConfig) -> Self {
        Self {
            state: SwState::Idle,
            elapsed: SwTime::ZERO,
            state_ticks: 0,
            cfg,
        }
    }

    /// Current operating state.
    #[inline]
    pub fn state(&self) -> SwState {
        self.state
    }

    /// Current elapsed value.
    #[inline]
    pub fn elapsed(&self) -> SwTime {
        self.elapsed
    }

    /// Ticks spent in the current state.
    #[inline]
    pub fn state_ticks(&self) -> u32 {
        self.state_ticks
    }

    /// One 10 ms tick: advance transient states, accumulate time while
    /// running, and apply the inactivity policy.
    pub fn tick(&mut self) -> Effects {
        let mut fx = Effects::new();
        self.state_ticks += 1;

        match self.state {
            SwState::PreIdle => {
                self.enter(SwState::Idle);
                let _ = fx.push(Effect::Notify("back to idle"));
                return fx;
            }
            SwState::PreStop => {
                self.enter(SwState::Stop);
                return fx;
            }
            SwState::Run => {
                self.elapsed.tick();
                let _ = fx.push(Effect::ShowTime);
                return fx;
            }
            _ => {}
        }

        if let Some(limit) = policy::deadline(self.state, &self.cfg) {
            if self.state_ticks > limit {
                if self.state == SwState::Idle {
                    // Restart the counter so the sleep request is made once.
                    self.enter(SwState::Idle);
                    let _ = fx.push(Effect::Sleep);
                } else {
                    self.elapsed.clear();
                    self.enter(SwState::Idle);
                    let _ = fx.push(Effect::ShowTime);
                }
            }
        }

        fx
    }

    /// A key edge arrived. Returns `None` when the current state has no
    /// matching transition (the hold counter keeps running, nothing
    /// changes).
    pub fn on_key(&mut self, key: Key, event: KeyEvent, best: Option<SwTime>) -> Option<Effects> {
        let _ = key; // both keys drive the same transitions
        let mut fx = Effects::new();

        match (self.state, event.edge) {
            (SwState::Idle, Edge::Released) => {
                if event.held_ticks <= self.cfg.clear_hold_ticks {
                    self.enter(SwState::Run);
                    Some(fx)
                } else {
                    None
                }
            }

            (SwState::Run, Edge::Pressed) => {
                if best.map_or(false, |b| self.elapsed.beats(&b)) {
                    let _ = fx.push(Effect::PersistRecord);
                    self.enter(SwState::Record);
                } else {
                    self.enter(SwState::PreStop);
                }
                Some(fx)
            }

            (SwState::Stop, Edge::Released) => {
                self.elapsed.clear();
                self.enter(SwState::Idle);
                let _ = fx.push(Effect::ShowTime);
                Some(fx)
            }

            (SwState::ClearConfirm, Edge::Pressed) => {
                let _ = fx.push(Effect::EraseRecords);
                let _ = fx.push(Effect::ShowText("Erased  "));
                self.enter(SwState::Cleared);
                Some(fx)
            }

            (SwState::Cleared, Edge::Pressed) | (SwState::Saved, Edge::Pressed) => {
                self.elapsed.clear();
                self.enter(SwState::PreIdle);
                let _ = fx.push(Effect::ShowTime);
                Some(fx)
            }

            (SwState::Record, Edge::Released) => {
                // Stay: the record banner goes up once the key is let go.
                let _ = fx.push(Effect::ShowText("Record! "));
                Some(fx)
            }

            (SwState::Record, Edge::Pressed) => {
                self.elapsed.clear();
                self.enter(SwState::PreIdle);
                let _ = fx.push(Effect::ShowTime);
                Some(fx)
            }

            _ => None,
        }
    }

    /// A key is being held (no edge this tick). Drives the two
    /// press-and-hold transitions.
    pub fn on_hold(&mut self, key: Key, held_ticks: u32) -> Option<Effects> {
        let _ = key;
        let mut fx = Effects::new();

        match self.state {
            SwState::Idle if held_ticks > self.cfg.clear_hold_ticks => {
                self.enter(SwState::ClearConfirm);
                let _ = fx.push(Effect::ShowText("Erase?  "));
                Some(fx)
            }

            SwState::Stop if held_ticks > self.cfg.save_hold_ticks => {
                let _ = fx.push(Effect::SaveMeasurement);
                self.enter(SwState::Saved);
                Some(fx)
            }

            _ => None,
        }
    }

    /// Host command: force a fresh measurement to start.
    pub fn remote_start(&mut self) -> Effects {
        let mut fx = Effects::new();
        self.elapsed.clear();
        self.enter(SwState::Run);
        let _ = fx.push(Effect::ShowTime);
        fx
    }

    /// Host command: freeze the measurement. The caller reads `elapsed`
    /// for its reply.
    pub fn remote_stop(&mut self) -> Effects {
        let mut fx = Effects::new();
        self.enter(SwState::Stop);
        let _ = fx.push(Effect::ShowTime);
        fx
    }

    /// Host command: save the current value as if the hold threshold had
    /// been crossed.
    pub fn remote_save(&mut self) -> Effects {
        let mut fx = Effects::new();
        let _ = fx.push(Effect::SaveMeasurement);
        self.enter(SwState::Saved);
        fx
    }

    /// The external wake signal fired: re-enter through `PreIdle` so the
    /// return gets announced and the display redrawn.
    pub fn wake(&mut self) -> Effects {
        let mut fx = Effects::new();
        self.elapsed.clear();
        self.enter(SwState::PreIdle);
        let _ = fx.push(Effect::ShowTime);
        fx
    }

    fn enter(&mut self, state: SwState) {
        self.state = state;
        self.state_ticks = 0;
    }
}
