//! Hardware collaborator traits.
//!
//! The firmware core never touches registers; it talks to the board through
//! these four narrow seams. Real drivers implement them on hardware, the
//! [`crate::sim`] module implements them for host tests.

use crate::keys::KeyMask;

/// Character LCD driver.
pub trait DisplayDriver {
    /// Render a fixed-width string starting at the given display-memory
    /// offset.
    fn write(&mut self, text: &str, start_offset: u8);

    /// Cut power to the display (entering sleep).
    fn power_off(&mut self);

    /// Restore power and re-run the controller init sequence (leaving
    /// sleep). Display memory content is undefined afterwards; the caller
    /// redraws.
    fn power_on_and_reset(&mut self);
}

/// Outbound byte-channel (UART TX) driver.
pub trait SerialPort {
    /// Try to hand one byte to the transmitter.
    ///
    /// Returns `false` when the transmitter is not ready; the caller
    /// retries within its drain-timeout window.
    fn try_send(&mut self, byte: u8) -> bool;
}

/// Raw SPI byte transfer with explicit chip select.
///
/// A transaction is `select`, any sequence of `write`/`read`, `deselect`.
/// The electrical details are entirely the implementor's business.
pub trait SpiBus {
    /// Assert chip select.
    fn select(&mut self);

    /// Release chip select, ending the transaction.
    fn deselect(&mut self);

    /// Clock bytes out.
    fn write(&mut self, bytes: &[u8]);

    /// Clock bytes in.
    fn read(&mut self, buf: &mut [u8]);
}

/// Raw key line levels.
pub trait KeyPort {
    /// Sample the current key levels, 1 = down.
    fn read(&mut self) -> KeyMask;
}
