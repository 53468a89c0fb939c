//! Host command protocol, driven through the full firmware loop.

use core::cell::Cell;

use rust_lcd_stopwatch::logging::LogStream;
use rust_lcd_stopwatch::sim::{SimDisplay, SimEeprom, SimKeys, SimSerial};
use rust_lcd_stopwatch::{ByteRing, Eeprom25, Firmware, IrqFlags, SwConfig, SwState, SwTime, TimeoutPool};

struct Statics {
    flags: IrqFlags,
    timeouts: TimeoutPool,
    rx: ByteRing,
    tx: ByteRing,
    log: LogStream,
    lines: Cell<u8>,
}

impl Statics {
    fn new() -> Self {
        Self {
            flags: IrqFlags::new(),
            timeouts: TimeoutPool::new(),
            rx: ByteRing::new(),
            tx: ByteRing::new(),
            log: LogStream::new(),
            lines: Cell::new(0),
        }
    }

    fn firmware(&self) -> Firmware<'_, SimEeprom, SimDisplay, SimSerial, SimKeys<'_>> {
        let mut fw = Firmware::new(
            &self.flags,
            &self.timeouts,
            &self.rx,
            &self.tx,
            &self.log,
            Eeprom25::new(SimEeprom::new()),
            SimDisplay::new(),
            SimSerial::new(),
            SimKeys::new(&self.lines),
            SwConfig::default(),
        );
        fw.init();
        fw
    }
}

/// Deliver bytes the way the receive interrupt would.
fn recv(st: &Statics, fw: &mut Firmware<'_, SimEeprom, SimDisplay, SimSerial, SimKeys<'_>>, bytes: &[u8]) {
    for &b in bytes {
        st.rx.push(b);
    }
    st.flags.set_rx();
    fw.poll();
}

fn tick(st: &Statics, fw: &mut Firmware<'_, SimEeprom, SimDisplay, SimSerial, SimKeys<'_>>) {
    st.flags.set_tick();
    fw.poll();
}

/// Flush boot logs and forget everything sent so far.
fn settle(fw: &mut Firmware<'_, SimEeprom, SimDisplay, SimSerial, SimKeys<'_>>) {
    fw.poll();
    fw.port_mut().reset();
}

#[test]
fn ping_replies_once() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<0>");
    assert_eq!(fw.port().output(), "<0>");
}

#[test]
fn unterminated_frame_never_replies() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<1");
    assert_eq!(fw.port().output(), "");
}

#[test]
fn scanner_resyncs_on_next_start_byte() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    // A dangling frame, stray noise, then one clean ping.
    recv(&st, &mut fw, b"<1");
    recv(&st, &mut fw, b"zzzz");
    recv(&st, &mut fw, b"<0>");

    assert_eq!(fw.port().output().matches("<0>").count(), 1);
    assert_eq!(fw.port().output(), "<0>");
}

#[test]
fn build_info_reports_number_and_date() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<1>");

    let expected = format!(
        "<1|{}|{}>",
        rust_lcd_stopwatch::remote::BUILD_NUMBER,
        rust_lcd_stopwatch::remote::BUILD_DATE
    );
    assert_eq!(fw.port().output(), expected);
}

#[test]
fn undefined_commands_are_silently_ignored() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<3>");
    recv(&st, &mut fw, b"<9>");
    recv(&st, &mut fw, b"<a>");
    assert_eq!(fw.port().output(), "");

    // Still responsive afterwards.
    recv(&st, &mut fw, b"<0>");
    assert_eq!(fw.port().output(), "<0>");
}

#[test]
fn erase_command_clears_records() {
    let st = Statics::new();
    let mut fw = st.firmware();
    fw.store().save(SwTime::new(0, 9, 0));
    settle(&mut fw);

    recv(&st, &mut fw, b"<2>");

    assert!(fw.port().output().contains("<2>"));
    assert!(fw.store().record().is_none());
}

#[test]
fn force_start_stop_save_round_trip() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<4>");
    assert!(fw.port().output().contains("<4>"));
    assert_eq!(fw.state(), SwState::Run);

    for _ in 0..42 {
        tick(&st, &mut fw);
    }

    fw.port_mut().reset();
    recv(&st, &mut fw, b"<5>");
    assert_eq!(fw.state(), SwState::Stop);
    assert!(fw.port().output().contains("<5|00:00:42>"));

    fw.port_mut().reset();
    recv(&st, &mut fw, b"<6>");
    assert!(fw.port().output().contains("<6>"));
    assert_eq!(fw.state(), SwState::Saved);
    assert_eq!(fw.store().record(), Some(SwTime::new(0, 0, 42)));
}

#[test]
fn split_frame_across_deliveries() {
    let st = Statics::new();
    let mut fw = st.firmware();
    settle(&mut fw);

    recv(&st, &mut fw, b"<");
    recv(&st, &mut fw, b"0");
    assert_eq!(fw.port().output(), "");
    recv(&st, &mut fw, b">");
    assert_eq!(fw.port().output(), "<0>");
}
