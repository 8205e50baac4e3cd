//! The serial engine context object and its foreground port.
//!
//! [`Sio`] holds everything the interrupt handlers touch (line, timer,
//! shift registers, and the receive queue) behind a critical-section mutex,
//! so a `static` instance can be shared between the handlers and the main
//! loop. [`SioPort`] is the foreground half: it owns the link
//! configuration, the active [`Mode`], and the delay provider, and
//! implements the blocking [`CardLink`] operations by polling the engine in
//! short critical sections with interrupts enabled in between.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use softcard_core::{CardLink, ByteQueue, DataWidth, LinkConfig, Mode};
use softcard_hal::{BitTimer, DelayNs, IoLine};

use crate::rx::{RxSampler, SampleOutcome};
use crate::tx::TxShift;

/// Depth of the receive queue, in frame words.
pub const RX_QUEUE_DEPTH: usize = 4;

/// Which way the half-duplex line currently points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Transmit,
    Receive,
}

struct SioState<L: IoLine, T: BitTimer, const N: usize> {
    line: L,
    timer: T,
    width: DataWidth,
    tx: TxShift,
    rx: RxSampler,
    queue: ByteQueue<N>,
}

/// Interrupt-shared half of the serial engine.
pub struct Sio<L: IoLine, T: BitTimer, const N: usize = RX_QUEUE_DEPTH> {
    state: Mutex<RefCell<SioState<L, T, N>>>,
}

impl<L: IoLine, T: BitTimer, const N: usize> Sio<L, T, N> {
    /// Take ownership of the line and timer. The width must match the
    /// [`LinkConfig`] handed to the [`SioPort`] attached later.
    pub fn new(line: L, timer: T, width: DataWidth) -> Self {
        Self {
            state: Mutex::new(RefCell::new(SioState {
                line,
                timer,
                width,
                tx: TxShift::new(),
                rx: RxSampler::new(),
                queue: ByteQueue::new(),
            })),
        }
    }

    /// Periodic compare tick: emit the next transmit bit.
    ///
    /// Call from the timer compare interrupt while transmitting.
    pub fn on_tx_compare(&self) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            if s.tx.is_idle() {
                // A rate change can abandon a frame with the tick still armed.
                s.timer.disarm_tx_compare();
                return;
            }
            let tick = s.tx.tick();
            if tick.level {
                s.line.set_high();
            } else {
                s.line.set_low();
            }
            if tick.last {
                s.timer.disarm_tx_compare();
            }
        });
    }

    /// Start-edge capture: schedule mid-bit sampling.
    ///
    /// Call from the input-capture interrupt while receiving.
    pub fn on_rx_edge(&self) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            let edge = s.timer.captured_edge();
            let period = s.timer.period();
            let at = s.rx.start(edge, period);
            s.timer.disarm_edge_capture();
            s.timer.arm_sample_compare(at);
        });
    }

    /// Mid-bit sample tick: accumulate one received bit.
    ///
    /// Call from the sample compare interrupt while receiving.
    pub fn on_rx_sample(&self) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            let level = s.line.is_high();
            match s.rx.sample(level, s.width) {
                SampleOutcome::Pending => {}
                SampleOutcome::Complete(word) => {
                    // A full queue drops the word; no backpressure exists on
                    // the line.
                    let _ = s.queue.put(word);
                    s.timer.disarm_sample_compare();
                    s.timer.arm_edge_capture();
                }
                SampleOutcome::Rejected => {
                    s.timer.disarm_sample_compare();
                    s.timer.arm_edge_capture();
                }
            }
        });
    }

    /// Queue one frame unless the previous one is still draining.
    pub fn try_send(&self, code: u16) -> nb::Result<(), Infallible> {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            if !s.tx.is_idle() {
                return Err(nb::Error::WouldBlock);
            }
            s.tx.load(code, s.width);
            s.timer.arm_tx_compare();
            Ok(())
        })
    }

    /// Take the next received frame word, unmasked.
    pub fn try_take(&self) -> nb::Result<u16, Infallible> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).queue.try_get())
    }

    /// True once the transmit register has drained.
    pub fn tx_idle(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).tx.is_idle())
    }

    /// Install a new bit period. Abandons any in-flight transmit frame and
    /// discards pending timer events; the whole reconfiguration runs in one
    /// critical section so an in-flight interrupt never sees a half-updated
    /// period.
    pub fn set_period(&self, ticks: u16) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            s.timer.set_period(ticks);
            s.tx.reset();
            s.timer.clear_pending();
        });
    }

    /// Claim the line for transmission: stop receive interrupts, abort any
    /// partial frame, drive the line to its idle-high level.
    pub fn enter_tx(&self) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            s.timer.disarm_edge_capture();
            s.timer.disarm_sample_compare();
            s.rx.reset();
            s.line.set_high();
            s.line.to_output();
        });
    }

    /// Release the line to reception and arm the start-edge capture.
    pub fn enter_rx(&self) {
        critical_section::with(|cs| {
            let mut guard = self.state.borrow_ref_mut(cs);
            let s = &mut *guard;
            s.line.to_input();
            s.rx.reset();
            s.timer.clear_pending();
            s.timer.arm_edge_capture();
        });
    }
}

/// Foreground half of the serial engine; the dispatcher's [`CardLink`].
pub struct SioPort<'a, L: IoLine, T: BitTimer, D: DelayNs, const N: usize = RX_QUEUE_DEPTH> {
    sio: &'a Sio<L, T, N>,
    delay: D,
    config: LinkConfig,
    mode: Mode,
    direction: Direction,
}

impl<'a, L: IoLine, T: BitTimer, D: DelayNs, const N: usize> SioPort<'a, L, T, D, N> {
    /// Attach the foreground half.
    ///
    /// The line starts marked as transmitting so the first read performs a
    /// full turnaround and arms the receive path.
    pub fn new(sio: &'a Sio<L, T, N>, delay: D, config: LinkConfig) -> Self {
        Self {
            sio,
            delay,
            config,
            mode: Mode::Handshake,
            direction: Direction::Transmit,
        }
    }

    /// Currently selected rate/delay profile.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The link configuration this port was built with.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Wait out the in-flight frame, observe the mode's settle delay, and
    /// point the line at reception.
    fn release_line(&mut self) {
        while !self.sio.tx_idle() {}
        self.delay.delay_us(self.config.settle_us(self.mode));
        self.sio.enter_rx();
        self.direction = Direction::Receive;
    }

    fn ensure_receiving(&mut self) {
        if self.direction == Direction::Transmit {
            self.release_line();
        }
    }
}

impl<'a, L: IoLine, T: BitTimer, D: DelayNs, const N: usize> CardLink
    for SioPort<'a, L, T, D, N>
{
    fn configure(&mut self, mode: Mode) {
        self.sio.set_period(self.config.period_ticks(mode));
        self.mode = mode;
    }

    fn begin_tx(&mut self) {
        self.sio.enter_tx();
        self.direction = Direction::Transmit;
    }

    fn send_frame(&mut self, code: u16) {
        // Spin until the previous frame drains; interrupts stay enabled
        // between the polls.
        loop {
            if self.sio.try_send(code).is_ok() {
                break;
            }
        }
        self.delay.delay_us(self.config.pace_us(self.mode));
    }

    fn end_tx(&mut self) {
        self.release_line();
    }

    fn read_frame(&mut self) -> u16 {
        self.ensure_receiving();
        let word = loop {
            if let Ok(word) = self.sio.try_take() {
                break word;
            }
        };
        word & self.config.width.mask()
    }

    fn try_read(&mut self) -> nb::Result<u16, Infallible> {
        self.ensure_receiving();
        self.sio
            .try_take()
            .map(|word| word & self.config.width.mask())
    }
}
