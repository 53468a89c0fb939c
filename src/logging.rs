//! Lock-free debug logging.
//!
//! Log producers (the foreground loop, interrupt handlers) push fixed-size
//! entries into a ring; the foreground loop drains the ring into the serial
//! TX queue when it gets around to it. Push never blocks: a full ring drops
//! the entry and counts the drop.
//!
//! ```text
//! fw_info!() ────▶ [E0][E1][E2] ────▶ serial TX ring ────▶ host
//!  ~O(1)            lock-free          bounded drain
//! ```

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length in bytes.
pub const MAX_MSG_LEN: usize = 48;

/// Default log ring size (number of entries, power of 2).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry, stamped with the tick counter at push time.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Tick count when the entry was produced.
    pub ticks: u32,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        ticks: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// The message as UTF-8 text.
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

/// Lock-free log ring (multiple producers, single consumer).
///
/// Producers are coordinated through an atomic `fetch_add` on the write
/// index, so the foreground loop and an interrupt handler may both push.
/// Exactly one consumer drains.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Producers claim unique indices via fetch_add; the single consumer
// advances read_idx with release ordering. No aliased mutable access.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry. Never blocks.
    ///
    /// Returns `true` if the entry was queued, `false` if dropped because
    /// the ring is full.
    pub fn push(&self, ticks: u32, level: LogLevel, msg: &[u8]) -> bool {
        let idx = loop {
            let write = self.write_idx.load(Ordering::Acquire);
            let read = self.read_idx.load(Ordering::Acquire);

            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            if self
                .write_idx
                .compare_exchange_weak(
                    write,
                    write.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                break (write as usize) & Self::MASK;
            }
        };

        // SAFETY: The compare-exchange handed this producer a unique index.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.ticks = ticks;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        true
    }

    /// Drain the next entry, if any. Single consumer only.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: Single consumer, producers never touch unread slots.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Count of entries dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// True when entries are waiting to be drained.
    #[inline]
    pub fn has_entries(&self) -> bool {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        read != write
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format arguments into a byte buffer, truncating at its end.
///
/// Returns the number of bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Push a formatted entry at an explicit level.
#[macro_export]
macro_rules! fw_log {
    ($level:expr, $stream:expr, $ticks:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($ticks, $level, &buf[..len]);
    }};
}

/// Info-level log.
#[macro_export]
macro_rules! fw_info {
    ($stream:expr, $ticks:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Info, $stream, $ticks, $($arg)*)
    };
}

/// Warning-level log.
#[macro_export]
macro_rules! fw_warn {
    ($stream:expr, $ticks:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Warn, $stream, $ticks, $($arg)*)
    };
}

/// Error-level log.
#[macro_export]
macro_rules! fw_error {
    ($stream:expr, $ticks:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Error, $stream, $ticks, $($arg)*)
    };
}

/// Debug-level log.
#[macro_export]
macro_rules! fw_debug {
    ($stream:expr, $ticks:expr, $($arg:tt)*) => {
        $crate::fw_log!($crate::logging::LogLevel::Debug, $stream, $ticks, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"test message"));
        assert!(stream.has_entries());

        let entry = stream.drain().unwrap();
        assert_eq!(entry.ticks, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.text(), "test message");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_drops_when_full() {
        let stream = LogStream::<4>::new();

        for i in 0..4 {
            assert!(stream.push(i, LogLevel::Info, b"x"));
        }
        assert!(!stream.push(4, LogLevel::Info, b"dropped"));
        assert_eq!(stream.dropped(), 1);

        stream.drain();
        assert!(stream.push(5, LogLevel::Info, b"fits again"));
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new();
        let long = [b'a'; MAX_MSG_LEN + 10];

        stream.push(0, LogLevel::Warn, &long);
        let entry = stream.drain().unwrap();
        assert_eq!(entry.len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_fw_log_macros() {
        let stream = LogStream::<8>::new();

        fw_info!(stream, 42, "slot {}", 7);
        fw_error!(stream, 43, "bad state");

        let first = stream.drain().unwrap();
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(first.text(), "slot 7");

        let second = stream.drain().unwrap();
        assert_eq!(second.level, LogLevel::Error);
        assert_eq!(second.ticks, 43);
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");
    }
}
