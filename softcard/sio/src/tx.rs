//! Transmit shift register
//!
//! One encoded frame at a time: start bit, data bits (with parity at the
//! nine-bit width), and two stop bits, packed for LSB-first emission. The
//! periodic compare interrupt consumes one bit per tick.

use softcard_core::DataWidth;

/// Result of one transmit tick.
pub struct TxTick {
    /// Line level to drive for this bit period
    pub level: bool,
    /// The frame is exhausted; the tick interrupt must be disarmed
    pub last: bool,
}

/// Single-frame transmit shift register.
///
/// Invariant: at most one frame in flight. `load` must only be called once
/// the register has drained back to the empty value; callers wait on
/// [`TxShift::is_idle`].
pub struct TxShift {
    frame: u16,
}

impl TxShift {
    /// Remaining pattern when only the final stop bit is left.
    const TERMINAL: u16 = 1;

    pub const fn new() -> Self {
        Self { frame: 0 }
    }

    /// True once the previous frame has fully drained.
    pub fn is_idle(&self) -> bool {
        self.frame == 0
    }

    /// Abandon any in-flight frame (rate reconfiguration).
    pub fn reset(&mut self) {
        self.frame = 0;
    }

    /// Load one encoded frame: start bit low, `code` LSB-first, two stop
    /// bits high.
    pub fn load(&mut self, code: u16, width: DataWidth) {
        self.frame = (0b11 << (1 + width.bits())) | (code << 1);
    }

    /// Consume one bit period: returns the level to drive and whether this
    /// tick exhausted the frame.
    pub fn tick(&mut self) -> TxTick {
        let frame = self.frame;
        self.frame = frame >> 1;
        TxTick {
            level: frame & 1 != 0,
            last: frame == Self::TERMINAL,
        }
    }
}

impl Default for TxShift {
    fn default() -> Self {
        Self::new()
    }
}
