//! Interrupt-to-foreground signal flags.
//!
//! Each flag is set by exactly one interrupt-context producer and consumed
//! (swap to false) by the foreground loop. The loop never blocks on a flag;
//! an unset tick flag just skips that cycle's logic.

use core::sync::atomic::{AtomicBool, Ordering};

/// The three wake-up reasons delivered from interrupt context.
pub struct IrqFlags {
    /// Another 10 ms period elapsed.
    tick: AtomicBool,

    /// At least one byte arrived in the serial RX ring.
    rx: AtomicBool,

    /// External wake line fired while sleeping.
    wake: AtomicBool,
}

impl IrqFlags {
    /// All flags clear.
    pub const fn new() -> Self {
        Self {
            tick: AtomicBool::new(false),
            rx: AtomicBool::new(false),
            wake: AtomicBool::new(false),
        }
    }

    /// Producer side: mark a 10 ms period.
    #[inline]
    pub fn set_tick(&self) {
        self.tick.store(true, Ordering::Release);
    }

    /// Producer side: mark received serial data.
    #[inline]
    pub fn set_rx(&self) {
        self.rx.store(true, Ordering::Release);
    }

    /// Producer side: mark the external wake signal.
    #[inline]
    pub fn set_wake(&self) {
        self.wake.store(true, Ordering::Release);
    }

    /// Consumer side: take the tick flag, clearing it.
    #[inline]
    pub fn take_tick(&self) -> bool {
        self.tick.swap(false, Ordering::AcqRel)
    }

    /// Consumer side: take the RX flag, clearing it.
    #[inline]
    pub fn take_rx(&self) -> bool {
        self.rx.swap(false, Ordering::AcqRel)
    }

    /// Consumer side: take the wake flag, clearing it.
    #[inline]
    pub fn take_wake(&self) -> bool {
        self.wake.swap(false, Ordering::AcqRel)
    }
}

impl Default for IrqFlags {
    fn default() -> Self {
        Self::new()
    }
}
