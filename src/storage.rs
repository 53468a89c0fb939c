//! Record storage layout on the EEPROM.
//!
//! ```text
//! offset 0   u16 LE   free-slot pointer (next writable record address)
//! offset 2   u16 LE   best-record pointer, 0 = no record
//! offset 4..          append-only 4-byte elapsed-time records
//! ```
//!
//! The free-slot pointer only ever grows, one record at a time; `clear`
//! winds it back to the first record offset without touching the bytes
//! underneath, so "erased" measurements are merely unreachable. Nothing
//! outside this module knows the raw addresses.

use crate::clock::{SwTime, ENCODED_LEN};
use crate::eeprom::{Eeprom25, DEVICE_SIZE};
use crate::hal::SpiBus;

/// Address of the free-slot pointer.
pub const FREE_PTR_ADDR: u16 = 0x0000;
/// Address of the best-record pointer.
pub const RECORD_PTR_ADDR: u16 = 0x0002;
/// Address of the first measurement record.
pub const FIRST_RECORD_ADDR: u16 = 0x0004;
/// Size of one stored record.
pub const RECORD_SIZE: u16 = ENCODED_LEN as u16;

/// Result of validating the device on bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// Pointers were unusable (fresh or corrupt device); storage was
    /// formatted to the empty layout.
    Formatted,
    /// Pointers were plausible; existing records kept.
    Ready,
}

/// The persistence layer over the paged EEPROM driver.
pub struct RecordStore<B: SpiBus> {
    eeprom: Eeprom25<B>,
}

impl<B: SpiBus> RecordStore<B> {
    /// Wrap a device driver.
    pub fn new(eeprom: Eeprom25<B>) -> Self {
        Self { eeprom }
    }

    /// Access the underlying driver (tests read raw bytes through it).
    pub fn eeprom(&mut self) -> &mut Eeprom25<B> {
        &mut self.eeprom
    }

    /// Give the driver back, e.g. to rebuild the store over the same
    /// device.
    pub fn into_eeprom(self) -> Eeprom25<B> {
        self.eeprom
    }

    /// Validate the pointers, formatting the device when they are not
    /// usable. A never-programmed device reads 0xFFFF everywhere and must
    /// not be trusted as a free-slot address.
    pub fn init(&mut self) -> InitOutcome {
        let free = self.free_slot();

        let plausible = free >= FIRST_RECORD_ADDR
            && free <= DEVICE_SIZE - RECORD_SIZE
            && (free - FIRST_RECORD_ADDR) % RECORD_SIZE == 0;

        if plausible {
            InitOutcome::Ready
        } else {
            self.clear();
            InitOutcome::Formatted
        }
    }

    /// Read the free-slot pointer.
    pub fn free_slot(&mut self) -> u16 {
        let mut raw = [0u8; 2];
        self.eeprom.read(FREE_PTR_ADDR, &mut raw);
        u16::from_le_bytes(raw)
    }

    /// Write the free-slot pointer.
    pub fn set_free_slot(&mut self, addr: u16) {
        self.eeprom.write(FREE_PTR_ADDR, &addr.to_le_bytes());
    }

    /// Read the current best record, if one has been set.
    pub fn record(&mut self) -> Option<SwTime> {
        let mut raw = [0u8; 2];
        self.eeprom.read(RECORD_PTR_ADDR, &mut raw);
        let addr = u16::from_le_bytes(raw);

        if addr == 0 {
            return None;
        }

        let mut rec = [0u8; ENCODED_LEN];
        self.eeprom.read(addr, &mut rec);
        Some(SwTime::from_bytes(rec))
    }

    /// Append a measurement at the free slot and advance the pointer.
    ///
    /// Returns the address written. The very first save (free pointer still
    /// at its initial value) also initializes the record pointer, so the
    /// first measurement is the record by definition.
    pub fn save(&mut self, value: SwTime) -> u16 {
        let addr = self.free_slot();
        let first = addr == FIRST_RECORD_ADDR;

        self.eeprom.write(addr, &value.to_bytes());
        self.set_free_slot(addr + RECORD_SIZE);

        if first {
            self.set_record_ptr(addr);
        }

        addr
    }

    /// Write `value` as a record at `addr` and point the record pointer at
    /// it.
    pub fn set_as_record(&mut self, value: SwTime, addr: u16) {
        self.eeprom.write(addr, &value.to_bytes());
        self.set_record_ptr(addr);
    }

    /// Logically erase all measurements: free pointer back to the first
    /// record offset, record pointer to "none". Old bytes stay in place.
    pub fn clear(&mut self) {
        self.set_free_slot(FIRST_RECORD_ADDR);
        self.set_record_ptr(0);
    }

    /// 1-based display slot number for a record address.
    pub fn slot_index(addr: u16) -> u16 {
        (addr - FIRST_RECORD_ADDR) / RECORD_SIZE + 1
    }

    fn set_record_ptr(&mut self, addr: u16) {
        self.eeprom.write(RECORD_PTR_ADDR, &addr.to_le_bytes());
    }
}
