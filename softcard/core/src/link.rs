//! The seam between the serial engine and the protocol dispatcher.
//!
//! The dispatcher only ever talks to a [`CardLink`], so the whole command
//! state machine can be exercised against an in-memory mock while the real
//! implementation (`softcard-sio`) drives a hardware timer.

use crate::config::Mode;
use core::convert::Infallible;

/// Half-duplex frame transport as seen by the protocol dispatcher.
///
/// Frame words are the encoded form produced by [`crate::codec::encode`]:
/// shaped data plus the parity bit, without start/stop bits (framing is the
/// transport's concern).
pub trait CardLink {
    /// Select the active rate/delay profile.
    ///
    /// Takes effect atomically with respect to any in-flight frame timing;
    /// a partially transmitted frame is abandoned.
    fn configure(&mut self, mode: Mode);

    /// Claim the line for transmission.
    fn begin_tx(&mut self);

    /// Queue one frame for transmission.
    ///
    /// Blocks (interrupts enabled) until any previously queued frame has
    /// fully drained, then returns once the new frame is queued and the
    /// inter-byte pacing delay has elapsed. Completion of the new frame is
    /// asynchronous and observed only by the next caller's wait.
    fn send_frame(&mut self, code: u16);

    /// Release the line back to reception, observing the mode-dependent
    /// turnaround delay.
    fn end_tx(&mut self);

    /// Blocking read of the next received frame word, masked to the
    /// configured data width. There is no timeout; an unresponsive peer
    /// blocks forever (recovery is external reset).
    fn read_frame(&mut self) -> u16;

    /// Non-blocking variant of [`CardLink::read_frame`].
    fn try_read(&mut self) -> nb::Result<u16, Infallible>;
}
