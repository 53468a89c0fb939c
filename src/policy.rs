//! Inactivity deadlines per operating state.
//!
//! The deadline table is kept apart from the transition logic: the machine
//! asks "how long may this state linger" once per tick and forces the
//! fallback when the per-state counter passes the answer. A running
//! measurement never expires.

use crate::config::SwConfig;
use crate::state::SwState;

/// Inactivity deadline for a state, in ticks. `None` means the state waits
/// forever.
pub fn deadline(state: SwState, cfg: &SwConfig) -> Option<u32> {
    match state {
        SwState::Idle => Some(cfg.idle_sleep_ticks),
        SwState::Stop => Some(cfg.stop_idle_ticks),
        SwState::ClearConfirm => Some(cfg.confirm_idle_ticks),
        SwState::Cleared => Some(cfg.cleared_idle_ticks),
        SwState::Saved => Some(cfg.saved_idle_ticks),
        SwState::Record => Some(cfg.record_idle_ticks),
        SwState::Run | SwState::PreIdle | SwState::PreStop => None,
    }
}
