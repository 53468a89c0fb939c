//! Millisecond timeout service.
//!
//! A small fixed pool of countdown slots. The foreground loop arms and
//! polls slots; the timer interrupt decrements every armed slot once per
//! millisecond. Both sides touch only atomics, so the pool can live in a
//! shared static like the signal flags do.
//!
//! Running out of slots is the one explicit resource-exhaustion signal in
//! the firmware: `new_timeout` returns `None` and the caller is expected to
//! be constructed so that never happens.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Number of concurrently armed timeouts supported.
pub const TIMEOUT_SLOTS: usize = 4;

/// Handle to an armed timeout slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeout(u8);

struct Slot {
    armed: AtomicBool,
    remaining_ms: AtomicU16,
}

impl Slot {
    const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            remaining_ms: AtomicU16::new(0),
        }
    }
}

/// The timeout slot pool.
pub struct TimeoutPool {
    slots: [Slot; TIMEOUT_SLOTS],
}

impl TimeoutPool {
    /// Create a pool with all slots free.
    pub const fn new() -> Self {
        Self {
            slots: [Slot::new(), Slot::new(), Slot::new(), Slot::new()],
        }
    }

    /// Arm a free slot to expire after `ms` milliseconds.
    ///
    /// Returns `None` when all slots are in use.
    pub fn new_timeout(&self, ms: u16) -> Option<Timeout> {
        for (i, slot) in self.slots.iter().enumerate() {
            if slot
                .armed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                slot.remaining_ms.store(ms, Ordering::Release);
                return Some(Timeout(i as u8));
            }
        }
        None
    }

    /// True once the slot's countdown reached zero.
    #[inline]
    pub fn elapsed(&self, handle: Timeout) -> bool {
        self.slots[handle.0 as usize]
            .remaining_ms
            .load(Ordering::Acquire)
            == 0
    }

    /// Release a slot for reuse.
    #[inline]
    pub fn clear(&self, handle: Timeout) {
        self.slots[handle.0 as usize]
            .armed
            .store(false, Ordering::Release);
    }

    /// Interrupt side: one millisecond passed, count every armed slot down.
    pub fn tick_1ms(&self) {
        for slot in &self.slots {
            if slot.armed.load(Ordering::Acquire) {
                let _ = slot.remaining_ms.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |ms| if ms > 0 { Some(ms - 1) } else { None },
                );
            }
        }
    }
}

impl Default for TimeoutPool {
    fn default() -> Self {
        Self::new()
    }
}
