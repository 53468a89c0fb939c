//! Host-facing command protocol over the serial byte channel.
//!
//! Frames are single-command ASCII: `<c>` where `c` is one digit. Replies
//! echo the command, with `|`-separated arguments where the command
//! returns data. Anything malformed is dropped without a reply; the
//! scanner resynchronizes on the next `<`.

pub mod commands;
pub mod parser;

pub use commands::{build_info_reply, simple_reply, stop_reply, RemoteCommand};
pub use commands::{BUILD_DATE, BUILD_NUMBER};
pub use parser::FrameScanner;
