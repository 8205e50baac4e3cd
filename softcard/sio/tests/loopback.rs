//! Engine tests against mock hardware: the timer interrupts are driven by
//! hand, so the bit-level behavior is observable without a target.

use std::cell::RefCell;
use std::rc::Rc;

use softcard_core::{codec, CardLink, DataWidth, LinkConfig, Mode};
use softcard_hal::{BitTimer, DelayNs, IoLine};
use softcard_sio::{Sio, SioPort};

const WIDTH: DataWidth = DataWidth::Nine;

#[derive(Default)]
struct LineCell {
    level: bool,
    output: bool,
    driven: Vec<bool>,
}

/// Mock I/O line; records every level driven while in output direction.
#[derive(Clone, Default)]
struct TestLine {
    cell: Rc<RefCell<LineCell>>,
}

impl TestLine {
    fn set_level(&self, level: bool) {
        self.cell.borrow_mut().level = level;
    }

    fn driven(&self) -> Vec<bool> {
        self.cell.borrow().driven.clone()
    }

    fn is_output(&self) -> bool {
        self.cell.borrow().output
    }
}

impl IoLine for TestLine {
    fn set_high(&mut self) {
        let mut c = self.cell.borrow_mut();
        c.level = true;
        if c.output {
            c.driven.push(true);
        }
    }

    fn set_low(&mut self) {
        let mut c = self.cell.borrow_mut();
        c.level = false;
        if c.output {
            c.driven.push(false);
        }
    }

    fn is_high(&self) -> bool {
        self.cell.borrow().level
    }

    fn to_output(&mut self) {
        self.cell.borrow_mut().output = true;
    }

    fn to_input(&mut self) {
        let mut c = self.cell.borrow_mut();
        c.output = false;
        // The reader's pull-up idles the released line high.
        c.level = true;
    }
}

#[derive(Default)]
struct TimerCell {
    period: u16,
    periods: Vec<u16>,
    tx_armed: bool,
    edge_armed: bool,
    sample_armed: bool,
    sample_at: u16,
    capture: u16,
    clears: u32,
}

/// Mock bit timer; interrupt arming is plain state the test inspects.
#[derive(Clone, Default)]
struct TestTimer {
    cell: Rc<RefCell<TimerCell>>,
}

impl TestTimer {
    fn tx_armed(&self) -> bool {
        self.cell.borrow().tx_armed
    }

    fn edge_armed(&self) -> bool {
        self.cell.borrow().edge_armed
    }

    fn sample_at(&self) -> u16 {
        self.cell.borrow().sample_at
    }

    fn period(&self) -> u16 {
        self.cell.borrow().period
    }

    fn clears(&self) -> u32 {
        self.cell.borrow().clears
    }

    fn periods(&self) -> Vec<u16> {
        self.cell.borrow().periods.clone()
    }

    fn set_capture(&self, at: u16) {
        self.cell.borrow_mut().capture = at;
    }
}

impl BitTimer for TestTimer {
    fn set_period(&mut self, ticks: u16) {
        let mut c = self.cell.borrow_mut();
        c.period = ticks;
        c.periods.push(ticks);
    }

    fn period(&self) -> u16 {
        self.cell.borrow().period
    }

    fn clear_pending(&mut self) {
        self.cell.borrow_mut().clears += 1;
    }

    fn arm_tx_compare(&mut self) {
        self.cell.borrow_mut().tx_armed = true;
    }

    fn disarm_tx_compare(&mut self) {
        self.cell.borrow_mut().tx_armed = false;
    }

    fn arm_edge_capture(&mut self) {
        self.cell.borrow_mut().edge_armed = true;
    }

    fn disarm_edge_capture(&mut self) {
        self.cell.borrow_mut().edge_armed = false;
    }

    fn captured_edge(&self) -> u16 {
        self.cell.borrow().capture
    }

    fn arm_sample_compare(&mut self, at: u16) {
        let mut c = self.cell.borrow_mut();
        c.sample_armed = true;
        c.sample_at = at;
    }

    fn disarm_sample_compare(&mut self) {
        self.cell.borrow_mut().sample_armed = false;
    }
}

/// Mock delay; accumulates the requested nanoseconds.
#[derive(Clone, Default)]
struct TestDelay {
    ns: Rc<RefCell<u64>>,
}

impl TestDelay {
    fn total_ns(&self) -> u64 {
        *self.ns.borrow()
    }
}

impl DelayNs for TestDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.ns.borrow_mut() += u64::from(ns);
    }
}

struct Rig {
    line: TestLine,
    timer: TestTimer,
    delay: TestDelay,
    sio: Sio<TestLine, TestTimer>,
}

impl Rig {
    fn new() -> Self {
        let line = TestLine::default();
        let timer = TestTimer::default();
        let delay = TestDelay::default();
        let sio = Sio::new(line.clone(), timer.clone(), WIDTH);
        Self {
            line,
            timer,
            delay,
            sio,
        }
    }

    fn port(&self) -> SioPort<'_, TestLine, TestTimer, TestDelay> {
        SioPort::new(&self.sio, self.delay.clone(), LinkConfig::default())
    }

    /// Run the transmit compare interrupt until the engine disarms it.
    fn pump_tx(&self) {
        let mut guard = 0;
        while self.timer.tx_armed() {
            self.sio.on_tx_compare();
            guard += 1;
            assert!(guard <= 16, "transmit tick never disarmed");
        }
    }

    /// Feed one frame's levels through the edge/sample interrupts.
    fn feed(&self, start: bool, code: u16, stop: bool) {
        self.sio.on_rx_edge();
        self.line.set_level(start);
        self.sio.on_rx_sample();
        for bit in 0..9 {
            self.line.set_level((code >> bit) & 1 != 0);
            self.sio.on_rx_sample();
        }
        self.line.set_level(stop);
        self.sio.on_rx_sample();
    }
}

#[test]
fn transmit_emits_start_data_stop_at_the_configured_rate() {
    let rig = Rig::new();
    let mut port = rig.port();

    port.configure(Mode::Operating);
    assert_eq!(rig.timer.period(), 185);

    let code = codec::encode(0x53, WIDTH);
    port.begin_tx();
    assert!(rig.line.is_output());
    port.send_frame(code);
    rig.pump_tx();

    let bits = rig.line.driven();
    assert_eq!(bits.len(), 12, "start + 9 data + 2 stop bits");
    assert!(!bits[0], "start bit low");
    for bit in 0..9 {
        assert_eq!(bits[1 + bit], (code >> bit) & 1 != 0, "data bit {bit}");
    }
    assert!(bits[10] && bits[11], "stop bits high");

    port.end_tx();
    assert!(!rig.line.is_output());
    assert!(rig.timer.edge_armed());
}

#[test]
fn turnaround_observes_mode_scaled_delays() {
    let rig = Rig::new();
    let mut port = rig.port();

    port.configure(Mode::Operating);
    port.begin_tx();
    port.send_frame(codec::encode(0x90, WIDTH));
    // 50 us inter-byte pacing at the operating rate.
    assert_eq!(rig.delay.total_ns(), 50_000);
    rig.pump_tx();
    port.end_tx();
    // Plus the 50 us settle before re-entering receive.
    assert_eq!(rig.delay.total_ns(), 100_000);
}

#[test]
fn receive_samples_at_the_mid_bit_point() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Operating);

    // Arm the receive path (fresh ports count as transmitting).
    assert!(port.try_read().is_err());
    assert!(rig.timer.edge_armed());

    // Edge captured at 100 with a 185-tick period: 100 + 92 wraps to 7.
    rig.timer.set_capture(100);
    rig.sio.on_rx_edge();
    assert!(!rig.timer.edge_armed());
    assert_eq!(rig.timer.sample_at(), 7);
}

#[test]
fn receive_path_decodes_well_framed_bytes() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Operating);
    assert!(port.try_read().is_err());

    let code = codec::encode(0xA7, WIDTH);
    rig.feed(false, code, true);
    assert!(rig.timer.edge_armed(), "edge capture re-armed after a frame");

    let word = port.read_frame();
    assert_eq!(word, code);
    assert_eq!(codec::decode(word), 0xA7);
}

#[test]
fn framing_errors_are_discarded_silently() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Operating);
    assert!(port.try_read().is_err());

    rig.feed(true, codec::encode(0x42, WIDTH), true); // bad start bit
    rig.feed(false, codec::encode(0x42, WIDTH), false); // bad stop bit
    assert!(port.try_read().is_err());
    assert!(rig.timer.edge_armed());

    rig.feed(false, codec::encode(0x42, WIDTH), true);
    assert_eq!(codec::decode(port.read_frame()), 0x42);
}

#[test]
fn queue_overflow_drops_the_newest_word() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Operating);
    assert!(port.try_read().is_err());

    for value in 0..5u8 {
        rig.feed(false, codec::encode(value, WIDTH), true);
    }
    // Depth is four; the fifth frame was dropped without disturbing FIFO order.
    for value in 0..4u8 {
        assert_eq!(codec::decode(port.read_frame()), value);
    }
    assert!(port.try_read().is_err());
}

#[test]
fn wire_round_trip_through_both_engines() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Operating);

    port.begin_tx();
    port.send_frame(codec::encode(0x6B, WIDTH));
    rig.pump_tx();
    let bits = rig.line.driven();
    port.end_tx();

    // Replay the first eleven emitted levels (start, data, first stop) into
    // the receive sampler.
    rig.sio.on_rx_edge();
    for &level in &bits[..11] {
        rig.line.set_level(level);
        rig.sio.on_rx_sample();
    }
    assert_eq!(codec::decode(port.read_frame()), 0x6B);
}

/// Delay mock that services the transmit interrupt while the foreground
/// "waits", so the blocking dispatcher can run single-threaded.
struct PumpDelay {
    sio: Rc<Sio<TestLine, TestTimer>>,
    timer: TestTimer,
}

impl DelayNs for PumpDelay {
    fn delay_ns(&mut self, _ns: u32) {
        while self.timer.tx_armed() {
            self.sio.on_tx_compare();
        }
    }
}

#[test]
fn dispatcher_powers_on_through_the_real_engine() {
    let line = TestLine::default();
    let timer = TestTimer::default();
    let sio = Rc::new(Sio::new(line.clone(), timer.clone(), WIDTH));
    let delay = PumpDelay {
        sio: sio.clone(),
        timer: timer.clone(),
    };
    let port = SioPort::new(&sio, delay, LinkConfig::default());
    let mut card =
        softcard_proto::Dispatcher::new(port, softcard_proto::ResponseSet::default(), WIDTH);

    card.power_on();

    // Handshake period for the ATR, operating period afterwards.
    assert_eq!(timer.periods(), vec![371, 185]);

    // The very first wire activity is the 16-byte ATR, bit-exact.
    let bits = line.driven();
    assert_eq!(bits.len(), 16 * 12);
    for (i, chunk) in bits.chunks(12).enumerate() {
        assert!(!chunk[0], "start bit of ATR byte {i}");
        let mut code = 0u16;
        for bit in 0..9 {
            if chunk[1 + bit] {
                code |= 1 << bit;
            }
        }
        assert_eq!(codec::decode(code), softcard_proto::ATR[i], "ATR byte {i}");
        assert!(chunk[10] && chunk[11], "stop bits of ATR byte {i}");
    }

    // The line ends up released for the first command.
    assert!(!line.is_output());
    assert!(timer.edge_armed());
}

#[test]
fn reconfiguration_abandons_the_in_flight_frame() {
    let rig = Rig::new();
    let mut port = rig.port();
    port.configure(Mode::Handshake);
    assert_eq!(rig.timer.period(), 371);

    port.begin_tx();
    port.send_frame(codec::encode(0x00, WIDTH));
    // Only part of the frame has gone out when the rate changes.
    rig.sio.on_tx_compare();
    rig.sio.on_tx_compare();
    let clears_before = rig.timer.clears();

    port.configure(Mode::Operating);
    assert_eq!(rig.timer.period(), 185);
    assert!(rig.sio.tx_idle(), "reconfiguration empties the shift register");
    assert!(rig.timer.clears() > clears_before);
}
