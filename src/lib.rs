//! # RustLcdStopwatch
//!
//! Firmware core for an LCD stopwatch with push-button input and a serial
//! EEPROM for measurements and the best record.
//!
//! ## Architecture
//!
//! A single foreground loop driven by a 10 ms tick. Interrupt context only
//! sets flags and appends to the RX ring; the loop consumes them:
//!
//! - [`Stopwatch`] is the pure state machine; its transitions return effect
//!   lists instead of touching hardware
//! - [`RecordStore`] owns the EEPROM layout; nothing else sees raw addresses
//! - [`Firmware`] executes effects against the [`hal`] traits
//!
//! Everything runs on a host: the [`sim`] module provides the board.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod eeprom;
pub mod firmware;
pub mod hal;
pub mod keys;
pub mod logging;
pub mod policy;
pub mod remote;
pub mod serial;
pub mod signals;
pub mod sim;
pub mod state;
pub mod storage;
pub mod timeout;

pub use clock::{SwTime, TICK_MS};
pub use config::SwConfig;
pub use eeprom::Eeprom25;
pub use firmware::Firmware;
pub use keys::{Edge, Key, KeyEvent, KeyMask, Keypad};
pub use remote::{FrameScanner, RemoteCommand};
pub use serial::ByteRing;
pub use signals::IrqFlags;
pub use state::{Effect, Stopwatch, SwState};
pub use storage::{InitOutcome, RecordStore};
pub use timeout::{Timeout, TimeoutPool};
