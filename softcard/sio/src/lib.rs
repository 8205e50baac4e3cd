#![no_std]
#![forbid(unsafe_code)]

//! # softcard-sio
//!
//! The software-defined serial engine: one hardware timer provides all bit
//! timing for a half-duplex, bit-banged card I/O line. The transmit side is
//! an interrupt-driven shift register paced by a periodic compare channel;
//! the receive side is an edge-capture plus mid-bit-sampling state machine
//! feeding an interrupt-safe byte queue.
//!
//! The engine is split into two halves:
//! - [`Sio`] is the interrupt-shared context object. Placed in a `static`;
//!   the port's interrupt handlers call its `on_*` hooks.
//! - [`SioPort`] is the foreground half owned by the dispatcher. Implements
//!   the blocking [`softcard_core::CardLink`] operations by spinning between
//!   the engine's short critical sections, interrupts enabled.

pub mod engine;
pub mod rx;
pub mod tx;

pub use engine::{Sio, SioPort, RX_QUEUE_DEPTH};
pub use rx::{RxSampler, RxState, SampleOutcome};
pub use tx::{TxShift, TxTick};
