//! Elapsed-time value for the stopwatch.
//!
//! Pure data, no hardware dependencies. One tick equals 10 ms, so the
//! smallest unit counted here is a hundredth of a second. The same 4-byte
//! encoding is used for RAM and EEPROM copies, so a value survives a
//! save/restore round trip bit-for-bit.

use core::fmt::Write;

use heapless::String;

/// Period of the hardware tick driving all time-based logic.
pub const TICK_MS: u32 = 10;

/// Size of one encoded time record on the storage device.
pub const ENCODED_LEN: usize = 4;

/// A stopwatch reading: minutes, seconds, hundredths of a second.
///
/// Field order gives the derived ordering the comparison the record check
/// needs: fewer minutes first, then seconds, then hundredths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SwTime {
    /// Minutes, 0..=99. Wraps to 0 past 99 with no higher unit.
    pub minutes: u8,
    /// Seconds, 0..=59.
    pub seconds: u8,
    /// Hundredths of a second, 0..=99. Stored wide to match the record layout.
    pub hundredths: u16,
}

impl SwTime {
    /// The zero reading.
    pub const ZERO: Self = Self {
        minutes: 0,
        seconds: 0,
        hundredths: 0,
    };

    /// Create a reading from its three fields.
    pub const fn new(minutes: u8, seconds: u8, hundredths: u16) -> Self {
        Self {
            minutes,
            seconds,
            hundredths,
        }
    }

    /// Advance by one tick (one hundredth of a second).
    ///
    /// Rollover: 99 hundredths -> +1 s, 59 s -> +1 min, 99 min -> 0.
    /// The silent minute wrap is inherited behavior, not an overflow bug.
    pub fn tick(&mut self) {
        self.hundredths += 1;

        if self.hundredths > 99 {
            self.hundredths = 0;
            self.seconds += 1;

            if self.seconds > 59 {
                self.seconds = 0;
                self.minutes += 1;

                if self.minutes > 99 {
                    self.minutes = 0;
                }
            }
        }
    }

    /// Reset to zero.
    pub fn clear(&mut self) {
        *self = Self::ZERO;
    }

    /// Strictly-faster test used for the record check. Ties do not count.
    #[inline]
    pub fn beats(&self, other: &SwTime) -> bool {
        self < other
    }

    /// Encode into the canonical 4-byte record layout:
    /// `[hundredths lo, hundredths hi, seconds, minutes]`.
    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let h = self.hundredths.to_le_bytes();
        [h[0], h[1], self.seconds, self.minutes]
    }

    /// Decode from the canonical 4-byte record layout.
    pub fn from_bytes(raw: [u8; ENCODED_LEN]) -> Self {
        Self {
            minutes: raw[3],
            seconds: raw[2],
            hundredths: u16::from_le_bytes([raw[0], raw[1]]),
        }
    }

    /// Render as the fixed-width display string `mm:ss:hh`.
    pub fn render(&self) -> String<8> {
        let mut out = String::new();
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.hundredths
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_ticks_is_one_second() {
        let mut t = SwTime::ZERO;
        for _ in 0..100 {
            t.tick();
        }
        assert_eq!(t, SwTime::new(0, 1, 0));
    }

    #[test]
    fn test_six_thousand_ticks_is_one_minute() {
        let mut t = SwTime::ZERO;
        for _ in 0..6000 {
            t.tick();
        }
        assert_eq!(t, SwTime::new(1, 0, 0));
    }

    #[test]
    fn test_minute_counter_wraps_silently() {
        let mut t = SwTime::new(99, 59, 99);
        t.tick();
        assert_eq!(t, SwTime::ZERO);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = SwTime::new(0, 59, 99);
        let b = SwTime::new(1, 0, 0);
        let c = SwTime::new(1, 0, 1);

        assert!(a.beats(&b));
        assert!(b.beats(&c));
        assert!(a.beats(&c));
        assert!(!c.beats(&a));
    }

    #[test]
    fn test_tie_is_not_faster() {
        let a = SwTime::new(2, 30, 55);
        assert!(!a.beats(&a));
    }

    #[test]
    fn test_encoding_round_trip() {
        let t = SwTime::new(12, 34, 56);
        assert_eq!(SwTime::from_bytes(t.to_bytes()), t);
    }

    #[test]
    fn test_encoding_layout() {
        let t = SwTime::new(3, 2, 1);
        assert_eq!(t.to_bytes(), [1, 0, 2, 3]);
    }

    #[test]
    fn test_render_fixed_width() {
        assert_eq!(SwTime::ZERO.render().as_str(), "00:00:00");
        assert_eq!(SwTime::new(7, 9, 5).render().as_str(), "07:09:05");
        assert_eq!(SwTime::new(99, 59, 99).render().as_str(), "99:59:99");
    }
}
