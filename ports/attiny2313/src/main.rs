#![no_std]
#![no_main]

//! ATtiny2313 port of the softcard emulator.
//!
//! Timer1 provides all bit timing at the 3.57 MHz card clock: compare A
//! paces outgoing bits, the input capture unit (PD6, which doubles as the
//! card I/O contact) detects start edges, and compare B fires at the
//! mid-bit sample points. The three interrupt handlers forward straight to
//! the engine's hooks.

use core::ptr::{addr_of, addr_of_mut};

use avr_device::attiny2313::{Peripherals, PORTD, TC1};
use panic_halt as _;

use softcard_core::LinkConfig;
use softcard_hal::{BitTimer, DelayNs, IoLine};
use softcard_proto::{Dispatcher, ResponseSet};
use softcard_sio::{Sio, SioPort};

/// Card clock supplied by the reader.
const CPU_HZ: u32 = 3_570_000;

/// The card I/O contact on PD6.
struct CardLine {
    port: PORTD,
}

impl IoLine for CardLine {
    fn set_high(&mut self) {
        self.port.portd.modify(|_, w| w.pd6().set_bit());
    }

    fn set_low(&mut self) {
        self.port.portd.modify(|_, w| w.pd6().clear_bit());
    }

    fn is_high(&self) -> bool {
        self.port.pind.read().pd6().bit_is_set()
    }

    fn to_output(&mut self) {
        self.port.ddrd.modify(|_, w| w.pd6().set_bit());
    }

    fn to_input(&mut self) {
        self.port.ddrd.modify(|_, w| w.pd6().clear_bit());
        self.port.portd.modify(|_, w| w.pd6().clear_bit());
    }
}

/// Timer1 as the engine's bit timer.
struct CardTimer {
    tc1: TC1,
}

impl BitTimer for CardTimer {
    fn set_period(&mut self, ticks: u16) {
        self.tc1.ocr1a.write(|w| unsafe { w.bits(ticks) });
    }

    fn period(&self) -> u16 {
        self.tc1.ocr1a.read().bits()
    }

    fn clear_pending(&mut self) {
        // Interrupt flags clear on writing one.
        self.tc1
            .tifr
            .write(|w| w.icf1().set_bit().ocf1a().set_bit().ocf1b().set_bit());
    }

    fn arm_tx_compare(&mut self) {
        self.tc1.tifr.write(|w| w.ocf1a().set_bit());
        self.tc1.timsk.modify(|_, w| w.ocie1a().set_bit());
    }

    fn disarm_tx_compare(&mut self) {
        self.tc1.timsk.modify(|_, w| w.ocie1a().clear_bit());
    }

    fn arm_edge_capture(&mut self) {
        self.tc1.tifr.write(|w| w.icf1().set_bit());
        self.tc1.timsk.modify(|_, w| w.icie1().set_bit());
    }

    fn disarm_edge_capture(&mut self) {
        self.tc1.timsk.modify(|_, w| w.icie1().clear_bit());
    }

    fn captured_edge(&self) -> u16 {
        self.tc1.icr1.read().bits()
    }

    fn arm_sample_compare(&mut self, at: u16) {
        self.tc1.ocr1b.write(|w| unsafe { w.bits(at) });
        self.tc1.tifr.write(|w| w.ocf1b().set_bit());
        self.tc1.timsk.modify(|_, w| w.ocie1b().set_bit());
    }

    fn disarm_sample_compare(&mut self) {
        self.tc1.timsk.modify(|_, w| w.ocie1b().clear_bit());
    }
}

/// Cycle-counted busy delay.
struct BusyDelay;

impl DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(CPU_HZ) / 1_000_000_000) as u32;
        // The nop plus loop bookkeeping costs roughly four cycles per pass.
        let mut rounds = cycles / 4;
        while rounds > 0 {
            avr_device::asm::nop();
            rounds -= 1;
        }
    }
}

static mut SIO: Option<Sio<CardLine, CardTimer>> = None;

/// The engine singleton.
///
/// SAFETY: written exactly once in `main` before interrupts are enabled;
/// afterwards the handlers and the main loop only take shared references.
fn sio() -> &'static Sio<CardLine, CardTimer> {
    unsafe { (*addr_of!(SIO)).as_ref().unwrap() }
}

#[avr_device::interrupt(attiny2313)]
fn TIMER1_COMPA() {
    sio().on_tx_compare();
}

#[avr_device::interrupt(attiny2313)]
fn TIMER1_CAPT() {
    sio().on_rx_edge();
}

#[avr_device::interrupt(attiny2313)]
fn TIMER1_COMPB() {
    sio().on_rx_sample();
}

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();

    // Timer1: clear on compare A, no prescaling, noise-canceled capture of
    // the falling start edge (ICNC1 | WGM12 | CS10, capture edge select low).
    dp.TC1.tccr1a.write(|w| unsafe { w.bits(0) });
    dp.TC1.tccr1b.write(|w| unsafe { w.bits(0b1000_1001) });

    let config = match LinkConfig::builder().clock_hz(CPU_HZ).build() {
        Ok(config) => config,
        Err(_) => loop {},
    };

    let line = CardLine { port: dp.PORTD };
    let timer = CardTimer { tc1: dp.TC1 };
    unsafe {
        *addr_of_mut!(SIO) = Some(Sio::new(line, timer, config.width));
    }

    let port = SioPort::new(sio(), BusyDelay, config);
    let mut card = Dispatcher::new(port, ResponseSet::default(), config.width);

    // SAFETY: all shared state is initialized; handlers go live here.
    unsafe { avr_device::interrupt::enable() };

    card.run()
}
