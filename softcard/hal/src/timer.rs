//! Bit-timing hardware abstraction
//!
//! One free-running 16-bit timer in clear-on-compare mode provides all
//! serial timing: the compare period is one bit period, the transmit compare
//! channel paces outgoing bits, and the edge-capture/sample-compare pair
//! locates the midpoint of incoming bits.

/// Timer resources consumed by the serial engine.
///
/// `arm_*` operations clear the corresponding pending flag before enabling
/// the interrupt, so a stale event from before the arm never fires.
pub trait BitTimer {
    /// Install the compare period for one bit, in timer ticks.
    ///
    /// The counter wraps at this value, so capture and compare values are
    /// always in `0..period`.
    fn set_period(&mut self, ticks: u16);

    /// Currently installed compare period.
    fn period(&self) -> u16;

    /// Discard any pending compare/capture events.
    fn clear_pending(&mut self);

    /// Enable the periodic transmit-bit compare interrupt.
    fn arm_tx_compare(&mut self);

    /// Disable the transmit-bit compare interrupt.
    fn disarm_tx_compare(&mut self);

    /// Enable the input-edge capture interrupt (start-bit detection).
    fn arm_edge_capture(&mut self);

    /// Disable the input-edge capture interrupt.
    fn disarm_edge_capture(&mut self);

    /// Timer value latched at the last input edge.
    fn captured_edge(&self) -> u16;

    /// Enable the sample compare interrupt to fire when the counter reaches
    /// `at` (used for mid-bit sampling, offset half a period from the edge).
    fn arm_sample_compare(&mut self, at: u16);

    /// Disable the sample compare interrupt.
    fn disarm_sample_compare(&mut self);
}
