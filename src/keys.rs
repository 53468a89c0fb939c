//! Key input: raw level sampling, edge detection, hold tracking.
//!
//! The keypad is sampled once per 10 ms tick; that cadence is the whole
//! debounce (single-sample edge detection, no majority filter). `sample`
//! only toggles bits; deciding what a toggle means is left to the caller,
//! which inspects the current level.

/// Logical key identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Primary push button: start, stop, save, confirm.
    Pb,
    /// User button.
    Usr,
}

impl Key {
    /// Both keys, in scan order.
    pub const ALL: [Key; 2] = [Key::Pb, Key::Usr];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Key::Pb => 0,
            Key::Usr => 1,
        }
    }

    #[inline]
    const fn mask(self) -> u8 {
        1 << self.index()
    }
}

/// Raw key levels as a bitmask, 1 = down.
///
/// Bit 0: PB, bit 1: USR. Remaining bits unused.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyMask(u8);

impl KeyMask {
    /// No key down.
    pub const NONE: Self = Self(0);

    /// Create from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits value.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Test one key's bit.
    #[inline]
    pub const fn contains(&self, key: Key) -> bool {
        (self.0 & key.mask()) != 0
    }

    /// True when no bit is set.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// An edge reported by the keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// A consumed key event: the edge plus how long the previous level lasted.
///
/// For `Released` the duration is the press length in ticks; for `Pressed`
/// it is how long the key had been up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub edge: Edge,
    pub held_ticks: u32,
}

/// Debounced keypad state for the two keys.
pub struct Keypad {
    prev: KeyMask,
    hold: [u32; 2],
    event_hold: [u32; 2],
    pending: u8,
}

impl Keypad {
    /// Create a keypad with all keys up.
    pub const fn new() -> Self {
        Self {
            prev: KeyMask::NONE,
            hold: [0; 2],
            event_hold: [0; 2],
            pending: 0,
        }
    }

    /// Feed one raw sample.
    ///
    /// Returns the mask of keys whose level changed since the previous
    /// sample (several keys may change in one tick; each is reported).
    /// Every changed key gets a pending event and its hold counter restarts;
    /// every key currently down has its hold counter incremented.
    pub fn sample(&mut self, raw: KeyMask) -> KeyMask {
        let changed = KeyMask(raw.bits() ^ self.prev.bits());

        for key in Key::ALL {
            let i = key.index();

            if changed.contains(key) {
                self.event_hold[i] = self.hold[i];
                self.hold[i] = 0;
                self.pending |= key.mask();
            }

            if raw.contains(key) {
                self.hold[i] = self.hold[i].saturating_add(1);
            }
        }

        self.prev = raw;
        changed
    }

    /// Current debounced level of a key.
    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.prev.contains(key)
    }

    /// Ticks the key has spent at its current level.
    #[inline]
    pub fn held_ticks(&self, key: Key) -> u32 {
        self.hold[key.index()]
    }

    /// Consume the pending event for a key, if any.
    pub fn take_event(&mut self, key: Key) -> Option<KeyEvent> {
        if self.pending & key.mask() == 0 {
            return None;
        }
        self.pending &= !key.mask();

        let edge = if self.is_down(key) {
            Edge::Pressed
        } else {
            Edge::Released
        };

        Some(KeyEvent {
            edge,
            held_ticks: self.event_hold[key.index()],
        })
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
