//! Command set and reply builders.

use core::fmt::Write;

use heapless::String;

use crate::clock::SwTime;

/// Build identifier reported by `<1>`.
pub const BUILD_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date reported by `<1>`.
pub const BUILD_DATE: &str = "2026-07-18";

/// The defined host commands. Anything else is silently ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteCommand {
    /// `<0>`: liveness check.
    Ping,
    /// `<1>`: report build number and date.
    BuildInfo,
    /// `<2>`: erase all stored measurements.
    EraseAll,
    /// `<4>`: start a measurement.
    ForceStart,
    /// `<5>`: stop the measurement, reply with its value.
    ForceStop,
    /// `<6>`: save the current value.
    ForceSave,
}

impl RemoteCommand {
    /// Decode a command byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(RemoteCommand::Ping),
            b'1' => Some(RemoteCommand::BuildInfo),
            b'2' => Some(RemoteCommand::EraseAll),
            b'4' => Some(RemoteCommand::ForceStart),
            b'5' => Some(RemoteCommand::ForceStop),
            b'6' => Some(RemoteCommand::ForceSave),
            _ => None,
        }
    }

    /// The command's wire digit.
    pub fn code(self) -> u8 {
        match self {
            RemoteCommand::Ping => b'0',
            RemoteCommand::BuildInfo => b'1',
            RemoteCommand::EraseAll => b'2',
            RemoteCommand::ForceStart => b'4',
            RemoteCommand::ForceStop => b'5',
            RemoteCommand::ForceSave => b'6',
        }
    }
}

/// Argument-free acknowledgment: `<c>`.
pub fn simple_reply(cmd: RemoteCommand) -> String<4> {
    let mut out = String::new();
    let _ = out.push('<');
    let _ = out.push(cmd.code() as char);
    let _ = out.push('>');
    out
}

/// Reply to `<1>`: `<1|build|date>`.
pub fn build_info_reply() -> String<32> {
    let mut out = String::new();
    let _ = write!(out, "<1|{}|{}>", BUILD_NUMBER, BUILD_DATE);
    out
}

/// Reply to `<5>`: `<5|mm:ss:hh>`.
pub fn stop_reply(value: &SwTime) -> String<16> {
    let mut out = String::new();
    let _ = write!(out, "<5|{}>", value.render());
    out
}
