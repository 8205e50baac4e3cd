//! Bidirectional half-duplex I/O line abstraction

/// The single card I/O contact.
///
/// The line idles high. In transmit direction the engine drives it per bit;
/// in receive direction it is sampled at bit-period midpoints. Only one
/// party drives the line at a time; direction changes go through the
/// engine's turnaround handling, never directly through this trait.
pub trait IoLine {
    /// Drive the line high (transmit direction only)
    fn set_high(&mut self);

    /// Drive the line low (transmit direction only)
    fn set_low(&mut self);

    /// Sample the current line level (receive direction only)
    fn is_high(&self) -> bool;

    /// Switch the pin to driven output, idling high
    fn to_output(&mut self);

    /// Release the pin to floating input
    fn to_input(&mut self);
}
