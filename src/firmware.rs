//! The foreground loop.
//!
//! Owns the state machine, the keypad, the record store and the frame
//! scanner, and wires them to the board through the [`crate::hal`] traits.
//! Interrupt context only sets flags and fills the RX ring; everything
//! else happens here, one `poll` at a time:
//!
//! ```text
//! poll ─▶ tick flag?  ─▶ sample keys ─▶ machine ─▶ effects
//!      ─▶ rx flag?    ─▶ frame scanner ─▶ command ─▶ reply
//!      ─▶ drain log + TX ring (bounded)
//! ```
//!
//! While asleep the loop does nothing but watch the wake flag.

use core::fmt::Write;

use heapless::String;

use crate::clock::SwTime;
use crate::config::SwConfig;
use crate::eeprom::Eeprom25;
use crate::fw_info;
use crate::hal::{DisplayDriver, KeyPort, SerialPort, SpiBus};
use crate::keys::{Edge, Key, Keypad};
use crate::logging::LogStream;
use crate::remote::{build_info_reply, simple_reply, stop_reply, FrameScanner, RemoteCommand};
use crate::serial::{drain_tx, ByteRing};
use crate::signals::IrqFlags;
use crate::state::{Effect, Effects, Stopwatch, SwState};
use crate::storage::{InitOutcome, RecordStore};
use crate::timeout::TimeoutPool;

/// The assembled firmware.
pub struct Firmware<'a, B, D, P, K>
where
    B: SpiBus,
    D: DisplayDriver,
    P: SerialPort,
    K: KeyPort,
{
    flags: &'a IrqFlags,
    timeouts: &'a TimeoutPool,
    rx: &'a ByteRing,
    tx: &'a ByteRing,
    log: &'a LogStream,

    store: RecordStore<B>,
    display: D,
    port: P,
    keys: K,

    keypad: Keypad,
    machine: Stopwatch,
    scanner: FrameScanner,
    cfg: SwConfig,

    ticks: u32,
    asleep: bool,
}

impl<'a, B, D, P, K> Firmware<'a, B, D, P, K>
where
    B: SpiBus,
    D: DisplayDriver,
    P: SerialPort,
    K: KeyPort,
{
    /// Assemble the firmware around its shared statics and peripherals.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        flags: &'a IrqFlags,
        timeouts: &'a TimeoutPool,
        rx: &'a ByteRing,
        tx: &'a ByteRing,
        log: &'a LogStream,
        eeprom: Eeprom25<B>,
        display: D,
        port: P,
        keys: K,
        cfg: SwConfig,
    ) -> Self {
        Self {
            flags,
            timeouts,
            rx,
            tx,
            log,
            store: RecordStore::new(eeprom),
            display,
            port,
            keys,
            keypad: Keypad::new(),
            machine: Stopwatch::new(cfg),
            scanner: FrameScanner::new(),
            cfg,
            ticks: 0,
            asleep: false,
        }
    }

    /// Bring-up: validate storage, draw the zero reading, log the boot.
    pub fn init(&mut self) {
        match self.store.init() {
            InitOutcome::Formatted => fw_info!(self.log, self.ticks, "storage formatted"),
            InitOutcome::Ready => fw_info!(self.log, self.ticks, "storage ready"),
        }

        let text = self.machine.elapsed().render();
        self.display.write(&text, 0);

        fw_info!(
            self.log,
            self.ticks,
            "boot {}",
            crate::remote::BUILD_NUMBER
        );
    }

    /// One pass of the foreground loop. Never blocks on the tick: an unset
    /// flag just skips that part.
    pub fn poll(&mut self) {
        if self.asleep {
            if self.flags.take_wake() {
                self.wake();
            } else {
                return;
            }
        }

        if self.flags.take_tick() {
            self.on_tick();
        }

        if self.flags.take_rx() {
            self.on_rx();
        }

        self.pump_log();

        if self.tx.pending() {
            drain_tx(
                self.tx,
                &mut self.port,
                self.timeouts,
                self.cfg.tx_drain_timeout_ms,
            );
        }
    }

    /// Current operating state.
    pub fn state(&self) -> SwState {
        self.machine.state()
    }

    /// Current elapsed value.
    pub fn elapsed(&self) -> SwTime {
        self.machine.elapsed()
    }

    /// True while waiting for the external wake signal.
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// The display peripheral (tests inspect the simulated one).
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The serial transmitter peripheral.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutable access to the transmitter (tests reset the recording).
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// The record store.
    pub fn store(&mut self) -> &mut RecordStore<B> {
        &mut self.store
    }

    // --- Internal ---

    fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        let raw = self.keys.read();
        self.keypad.sample(raw);

        for key in Key::ALL {
            if let Some(event) = self.keypad.take_event(key) {
                let best = if self.machine.state() == SwState::Run && event.edge == Edge::Pressed
                {
                    self.store.record()
                } else {
                    None
                };

                if let Some(fx) = self.machine.on_key(key, event, best) {
                    self.apply(&fx);
                }
            } else if self.keypad.is_down(key) {
                let held = self.keypad.held_ticks(key);
                if let Some(fx) = self.machine.on_hold(key, held) {
                    self.apply(&fx);
                }
            }
        }

        let fx = self.machine.tick();
        self.apply(&fx);
    }

    fn on_rx(&mut self) {
        while let Some(byte) = self.rx.pop() {
            if let Some(code) = self.scanner.feed(byte) {
                match RemoteCommand::from_byte(code) {
                    Some(cmd) => self.exec_remote(cmd),
                    None => {} // undefined command byte: no reply
                }
            }
        }
    }

    fn exec_remote(&mut self, cmd: RemoteCommand) {
        match cmd {
            RemoteCommand::Ping => {
                self.tx.push_str(&simple_reply(cmd));
            }

            RemoteCommand::BuildInfo => {
                self.tx.push_str(&build_info_reply());
            }

            RemoteCommand::EraseAll => {
                self.store.clear();
                fw_info!(self.log, self.ticks, "remote erase");
                self.tx.push_str(&simple_reply(cmd));
            }

            RemoteCommand::ForceStart => {
                let fx = self.machine.remote_start();
                self.apply(&fx);
                self.tx.push_str(&simple_reply(cmd));
            }

            RemoteCommand::ForceStop => {
                let fx = self.machine.remote_stop();
                self.apply(&fx);
                self.tx.push_str(&stop_reply(&self.machine.elapsed()));
            }

            RemoteCommand::ForceSave => {
                let fx = self.machine.remote_save();
                self.apply(&fx);
                self.tx.push_str(&simple_reply(cmd));
            }
        }
    }

    fn apply(&mut self, fx: &Effects) {
        for &effect in fx.iter() {
            match effect {
                Effect::ShowTime => {
                    let text = self.machine.elapsed().render();
                    self.display.write(&text, 0);
                }

                Effect::ShowText(text) => {
                    self.display.write(text, 0);
                }

                Effect::SaveMeasurement => {
                    let value = self.machine.elapsed();
                    let addr = self.store.save(value);
                    let slot = RecordStore::<B>::slot_index(addr);

                    let mut text = String::<16>::new();
                    let _ = write!(text, "Saved {:02}", slot);
                    self.display.write(&text, 0);

                    fw_info!(self.log, self.ticks, "saved slot {}", slot);
                }

                Effect::PersistRecord => {
                    let value = self.machine.elapsed();
                    let addr = self.store.save(value);
                    self.store.set_as_record(value, addr);

                    fw_info!(
                        self.log,
                        self.ticks,
                        "record slot {}",
                        RecordStore::<B>::slot_index(addr)
                    );
                }

                Effect::EraseRecords => {
                    self.store.clear();
                    fw_info!(self.log, self.ticks, "records erased");
                }

                Effect::Notify(text) => {
                    fw_info!(self.log, self.ticks, "{}", text);
                }

                Effect::Sleep => {
                    fw_info!(self.log, self.ticks, "sleep");
                    self.display.power_off();
                    // A stale wake edge must not end the sleep immediately.
                    let _ = self.flags.take_wake();
                    self.asleep = true;
                }
            }
        }
    }

    fn wake(&mut self) {
        self.asleep = false;
        self.display.power_on_and_reset();

        let fx = self.machine.wake();
        self.apply(&fx);

        // Anything that fired while asleep is stale.
        let _ = self.flags.take_tick();
        let _ = self.flags.take_rx();

        fw_info!(self.log, self.ticks, "wake");
    }

    /// Move queued log entries into the TX ring, draining between lines so
    /// the small ring does not overflow.
    fn pump_log(&mut self) {
        while let Some(entry) = self.log.drain() {
            if self.tx.pending() {
                drain_tx(
                    self.tx,
                    &mut self.port,
                    self.timeouts,
                    self.cfg.tx_drain_timeout_ms,
                );
            }

            let mut line = String::<80>::new();
            let _ = writeln!(
                line,
                "[{}] {}: {}",
                entry.ticks,
                entry.level.as_str(),
                entry.text()
            );

            self.tx.push_str(&line);
            drain_tx(
                self.tx,
                &mut self.port,
                self.timeouts,
                self.cfg.tx_drain_timeout_ms,
            );
        }
    }
}
