//! Serial byte rings and the bounded TX drain.
//!
//! Two rings, mirroring the UART FIFOs: RX is filled by the receive
//! interrupt and drained by the foreground loop; TX is filled by the
//! foreground loop and drained toward the port. Each cursor has exactly one
//! writer, so the rings need no locking, only ordered atomics.
//!
//! The drain is the one place the foreground loop waits on hardware, and
//! the wait is bounded by a timeout slot, never infinite.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::SerialPort;
use crate::timeout::TimeoutPool;

/// Ring capacity in bytes (power of 2).
pub const SERIAL_BUF_LEN: usize = 32;

/// Single-producer single-consumer byte ring.
///
/// A full ring drops the pushed byte and counts it; cursors therefore never
/// pass each other.
pub struct ByteRing<const N: usize = SERIAL_BUF_LEN> {
    buf: UnsafeCell<[u8; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: One producer advances write_idx, one consumer advances read_idx;
// index ordering guarantees a slot is written before it becomes readable.
unsafe impl<const N: usize> Sync for ByteRing<N> {}
unsafe impl<const N: usize> Send for ByteRing<N> {}

impl<const N: usize> ByteRing<N> {
    const MASK: usize = N - 1;

    /// Create an empty ring.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Ring size must be power of 2");

        Self {
            buf: UnsafeCell::new([0; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Producer side: append one byte.
    ///
    /// Returns `false` (and counts the drop) when the ring is full.
    pub fn push(&self, byte: u8) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: Single producer; this slot is outside the readable window.
        unsafe {
            (*self.buf.get())[(write as usize) & Self::MASK] = byte;
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Producer side: append a whole string.
    ///
    /// Returns `false` if any byte was dropped.
    pub fn push_str(&self, text: &str) -> bool {
        let mut ok = true;
        for &b in text.as_bytes() {
            ok &= self.push(b);
        }
        ok
    }

    /// Consumer side: look at the next byte without taking it.
    pub fn peek(&self) -> Option<u8> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Single consumer; the slot was published by the producer.
        Some(unsafe { (*self.buf.get())[(read as usize) & Self::MASK] })
    }

    /// Consumer side: take the next byte.
    pub fn pop(&self) -> Option<u8> {
        let byte = self.peek()?;
        let read = self.read_idx.load(Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// True while bytes are queued ("transmit pending" for the TX ring).
    #[inline]
    pub fn pending(&self) -> bool {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        read != write
    }

    /// Number of queued bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// True when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.pending()
    }

    /// Count of bytes dropped on a full ring.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Push queued TX bytes toward the port until the ring empties or the
/// timeout expires.
///
/// The timer interrupt counts the timeout slot down while this loop spins
/// on a not-ready transmitter. With no free slot the drain is skipped this
/// round; the bytes stay queued.
pub fn drain_tx<P: SerialPort, const N: usize>(
    ring: &ByteRing<N>,
    port: &mut P,
    timeouts: &TimeoutPool,
    timeout_ms: u16,
) {
    let Some(deadline) = timeouts.new_timeout(timeout_ms) else {
        return;
    };

    while let Some(byte) = ring.peek() {
        if timeouts.elapsed(deadline) {
            break;
        }
        if port.try_send(byte) {
            let _ = ring.pop();
        }
    }

    timeouts.clear(deadline);
}
