//! Simulated board peripherals.
//!
//! Host-side stand-ins for the four hardware seams in [`crate::hal`], used
//! by the test suite to drive the complete firmware without a board. The
//! EEPROM simulation models the parts of the device the driver's
//! correctness depends on: the write-enable latch, the asynchronous write
//! cycle behind the WIP status bit, and write wrap-around inside a 64-byte
//! page. A write issued without the enable latch is silently ignored,
//! exactly like the real part.

use core::cell::Cell;

use heapless::Vec;

use crate::eeprom::{CMD_RDSR, CMD_READ, CMD_WRDI, CMD_WREN, CMD_WRITE, DEVICE_SIZE, PAGE_SIZE};
use crate::eeprom::{STATUS_WEL, STATUS_WIP};
use crate::hal::{DisplayDriver, KeyPort, SerialPort, SpiBus};
use crate::keys::KeyMask;

/// Longest frame a transaction can carry: command, address, one page.
const FRAME_CAP: usize = PAGE_SIZE + 8;

/// How many status reads a write cycle stays busy for.
const WRITE_CYCLE_POLLS: u8 = 2;

/// 25LC256-class EEPROM behind a raw SPI bus.
pub struct SimEeprom {
    mem: [u8; DEVICE_SIZE as usize],
    selected: bool,
    frame: Vec<u8, FRAME_CAP>,
    read_served: usize,
    wel: bool,
    wip_polls: u8,
    ignored_writes: u32,
}

impl SimEeprom {
    /// A factory-fresh device: every byte 0xFF.
    pub fn new() -> Self {
        Self {
            mem: [0xFF; DEVICE_SIZE as usize],
            selected: false,
            frame: Vec::new(),
            read_served: 0,
            wel: false,
            wip_polls: 0,
            ignored_writes: 0,
        }
    }

    /// Raw memory inspection, bypassing the bus.
    pub fn peek(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    /// Raw memory preload, bypassing the bus.
    pub fn poke(&mut self, addr: u16, byte: u8) {
        self.mem[addr as usize] = byte;
    }

    /// Count of write transactions the device dropped (no enable latch, or
    /// issued mid write cycle).
    pub fn ignored_writes(&self) -> u32 {
        self.ignored_writes
    }

    fn busy(&self) -> bool {
        self.wip_polls > 0
    }

    fn status(&self) -> u8 {
        let mut s = 0;
        if self.busy() {
            s |= STATUS_WIP;
        }
        if self.wel {
            s |= STATUS_WEL;
        }
        s
    }

    fn commit(&mut self) {
        let Some(&cmd) = self.frame.first() else {
            return;
        };

        match cmd {
            CMD_WREN if !self.busy() => self.wel = true,
            CMD_WRDI if !self.busy() => self.wel = false,
            CMD_WRITE => {
                if self.busy() || !self.wel || self.frame.len() < 4 {
                    self.ignored_writes += 1;
                    return;
                }

                let addr = u16::from_be_bytes([self.frame[1], self.frame[2]]) as usize;
                let base = addr & !(PAGE_SIZE - 1);
                let offset = addr & (PAGE_SIZE - 1);

                // Data wraps inside the starting page, as on the real part.
                for (i, &byte) in self.frame[3..].iter().enumerate() {
                    self.mem[base + ((offset + i) & (PAGE_SIZE - 1))] = byte;
                }

                self.wel = false;
                self.wip_polls = WRITE_CYCLE_POLLS;
            }
            _ => {}
        }
    }
}

impl Default for SimEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiBus for SimEeprom {
    fn select(&mut self) {
        self.selected = true;
        self.frame.clear();
        self.read_served = 0;
    }

    fn deselect(&mut self) {
        if self.selected {
            self.commit();
        }
        self.selected = false;
        self.frame.clear();
        self.read_served = 0;
    }

    fn write(&mut self, bytes: &[u8]) {
        if !self.selected {
            return;
        }
        for &b in bytes {
            let _ = self.frame.push(b);
        }
    }

    fn read(&mut self, buf: &mut [u8]) {
        if !self.selected {
            return;
        }

        match self.frame.first().copied() {
            Some(CMD_RDSR) => {
                for slot in buf.iter_mut() {
                    *slot = self.status();
                    // Each status read models time passing in the device's
                    // internal write cycle.
                    self.wip_polls = self.wip_polls.saturating_sub(1);
                }
            }
            Some(CMD_READ) if self.frame.len() >= 3 => {
                let addr = u16::from_be_bytes([self.frame[1], self.frame[2]]) as usize;
                for slot in buf.iter_mut() {
                    let at = (addr + self.read_served) % DEVICE_SIZE as usize;
                    *slot = self.mem[at];
                    self.read_served += 1;
                }
            }
            _ => {
                for slot in buf.iter_mut() {
                    *slot = 0xFF;
                }
            }
        }
    }
}

/// 16-character LCD: a flat character buffer plus a power switch.
pub struct SimDisplay {
    buf: [u8; 16],
    powered: bool,
    power_cycles: u32,
}

impl SimDisplay {
    pub fn new() -> Self {
        Self {
            buf: [b' '; 16],
            powered: true,
            power_cycles: 0,
        }
    }

    /// Current display content (trailing blanks included).
    pub fn content(&self) -> &str {
        core::str::from_utf8(&self.buf).unwrap_or("")
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Number of completed off/on cycles.
    pub fn power_cycles(&self) -> u32 {
        self.power_cycles
    }
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDriver for SimDisplay {
    fn write(&mut self, text: &str, start_offset: u8) {
        if !self.powered {
            return;
        }
        let start = start_offset as usize;
        for (i, &b) in text.as_bytes().iter().enumerate() {
            if let Some(slot) = self.buf.get_mut(start + i) {
                *slot = b;
            }
        }
    }

    fn power_off(&mut self) {
        self.powered = false;
        self.buf = [b' '; 16];
    }

    fn power_on_and_reset(&mut self) {
        if !self.powered {
            self.power_cycles += 1;
        }
        self.powered = true;
        self.buf = [b' '; 16];
    }
}

/// Always-ready serial transmitter that records everything sent.
pub struct SimSerial {
    sent: Vec<u8, 256>,
}

impl SimSerial {
    pub fn new() -> Self {
        Self { sent: Vec::new() }
    }

    /// Everything transmitted so far, as text.
    pub fn output(&self) -> &str {
        core::str::from_utf8(&self.sent).unwrap_or("")
    }

    /// Forget recorded output.
    pub fn reset(&mut self) {
        self.sent.clear();
    }
}

impl Default for SimSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for SimSerial {
    fn try_send(&mut self, byte: u8) -> bool {
        let _ = self.sent.push(byte);
        true
    }
}

/// Key lines driven by the test through a shared cell.
pub struct SimKeys<'a> {
    lines: &'a Cell<u8>,
}

impl<'a> SimKeys<'a> {
    pub fn new(lines: &'a Cell<u8>) -> Self {
        Self { lines }
    }
}

impl KeyPort for SimKeys<'_> {
    fn read(&mut self) -> KeyMask {
        KeyMask::from_bits(self.lines.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_device_reads_ff() {
        let mut sim = SimEeprom::new();

        sim.select();
        sim.write(&[CMD_READ, 0x00, 0x00]);
        let mut buf = [0u8; 4];
        sim.read(&mut buf);
        sim.deselect();

        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_wren_sets_latch() {
        let mut sim = SimEeprom::new();

        sim.select();
        sim.write(&[CMD_WREN]);
        sim.deselect();

        sim.select();
        sim.write(&[CMD_RDSR]);
        let mut status = [0u8; 1];
        sim.read(&mut status);
        sim.deselect();

        assert_ne!(status[0] & STATUS_WEL, 0);
    }

    #[test]
    fn test_write_wraps_inside_page() {
        let mut sim = SimEeprom::new();

        sim.select();
        sim.write(&[CMD_WREN]);
        sim.deselect();

        // Two bytes starting at the last byte of page 0.
        sim.select();
        sim.write(&[CMD_WRITE, 0x00, 0x3F, 0xAA, 0xBB]);
        sim.deselect();

        assert_eq!(sim.peek(0x3F), 0xAA);
        // Second byte wrapped to the start of the same page, not page 1.
        assert_eq!(sim.peek(0x00), 0xBB);
        assert_eq!(sim.peek(0x40), 0xFF);
    }

    #[test]
    fn test_busy_window_expires_with_polls() {
        let mut sim = SimEeprom::new();

        sim.select();
        sim.write(&[CMD_WREN]);
        sim.deselect();
        sim.select();
        sim.write(&[CMD_WRITE, 0x00, 0x10, 0x42]);
        sim.deselect();

        let mut saw_busy = false;
        for _ in 0..8 {
            sim.select();
            sim.write(&[CMD_RDSR]);
            let mut status = [0u8; 1];
            sim.read(&mut status);
            sim.deselect();

            if status[0] & STATUS_WIP != 0 {
                saw_busy = true;
            } else {
                break;
            }
        }

        assert!(saw_busy);
        assert_eq!(sim.peek(0x10), 0x42);
    }

    #[test]
    fn test_display_write_and_power() {
        let mut lcd = SimDisplay::new();

        lcd.write("00:00:00", 0);
        assert!(lcd.content().starts_with("00:00:00"));

        lcd.power_off();
        assert_eq!(lcd.content().trim(), "");
        lcd.write("ignored", 0);
        assert_eq!(lcd.content().trim(), "");

        lcd.power_on_and_reset();
        assert!(lcd.is_powered());
        assert_eq!(lcd.power_cycles(), 1);
    }

    #[test]
    fn test_keys_follow_shared_cell() {
        let lines = Cell::new(0);
        let mut keys = SimKeys::new(&lines);

        assert!(keys.read().is_empty());
        lines.set(0b01);
        assert!(keys.read().contains(crate::keys::Key::Pb));
    }
}
