//! Link configuration: bit rates, turnaround delays, and the operating mode.

use crate::codec::DataWidth;
use crate::{ScError, ScResult};

/// Active rate/delay profile of the link.
///
/// The transition is one-way: the dispatcher switches from `Handshake` to
/// `Operating` immediately after the ATR has been sent and never reverts
/// without a full restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Initial negotiation rate; only the ATR is sent at this rate
    Handshake,
    /// Rate used for all command/response traffic after the ATR
    Operating,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Mode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Mode::Handshake => defmt::write!(fmt, "Handshake"),
            Mode::Operating => defmt::write!(fmt, "Operating"),
        }
    }
}

/// Timing profile for the software serial link.
///
/// The operating rate must be an integer multiple of the handshake rate; the
/// turnaround delays scale down by that ratio at the operating rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Timer input clock in Hz
    pub clock_hz: u32,
    /// Bit rate for the ATR
    pub handshake_baud: u32,
    /// Bit rate for command/response traffic
    pub operating_baud: u32,
    /// Data bits per frame
    pub width: DataWidth,
    /// Receive settle delay at the handshake rate, in microseconds
    pub base_settle_us: u32,
    /// Inter-byte pacing delay at the handshake rate, in microseconds
    pub base_pace_us: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            clock_hz: 3_570_000,
            handshake_baud: 9_600,
            operating_baud: 19_200,
            width: DataWidth::Nine,
            base_settle_us: 100,
            base_pace_us: 100,
        }
    }
}

impl LinkConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::default()
    }

    /// Ratio between the operating and handshake rates.
    pub fn ratio(&self) -> u32 {
        self.operating_baud / self.handshake_baud
    }

    /// Bit rate for the given mode.
    pub fn baud(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Handshake => self.handshake_baud,
            Mode::Operating => self.operating_baud,
        }
    }

    /// Timer compare period for one bit at the given mode's rate.
    pub fn period_ticks(&self, mode: Mode) -> u16 {
        (self.clock_hz / self.baud(mode)) as u16
    }

    /// Settle delay observed before the line re-enters receive mode.
    pub fn settle_us(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Handshake => self.base_settle_us,
            Mode::Operating => self.base_settle_us / self.ratio(),
        }
    }

    /// Pacing delay between consecutive transmitted bytes.
    pub fn pace_us(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Handshake => self.base_pace_us,
            Mode::Operating => self.base_pace_us / self.ratio(),
        }
    }
}

/// Builder for ergonomic link configuration construction.
#[derive(Debug, Clone, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Sets the timer input clock in Hz.
    pub fn clock_hz(mut self, hz: u32) -> Self {
        self.config.clock_hz = hz;
        self
    }

    /// Sets the handshake bit rate.
    pub fn handshake_baud(mut self, baud: u32) -> Self {
        self.config.handshake_baud = baud;
        self
    }

    /// Sets the operating bit rate.
    pub fn operating_baud(mut self, baud: u32) -> Self {
        self.config.operating_baud = baud;
        self
    }

    /// Sets the frame data width.
    pub fn width(mut self, width: DataWidth) -> Self {
        self.config.width = width;
        self
    }

    /// Sets the base settle delay in microseconds.
    pub fn settle_us(mut self, us: u32) -> Self {
        self.config.base_settle_us = us;
        self
    }

    /// Sets the base pacing delay in microseconds.
    pub fn pace_us(mut self, us: u32) -> Self {
        self.config.base_pace_us = us;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// The operating rate must be a nonzero integer multiple of the handshake
    /// rate, and one bit period must fit the 16-bit compare register at the
    /// slower rate.
    pub fn build(self) -> ScResult<LinkConfig> {
        let c = self.config;
        if c.handshake_baud == 0 || c.operating_baud == 0 || c.clock_hz == 0 {
            return Err(ScError::InvalidConfig);
        }
        if c.operating_baud % c.handshake_baud != 0 {
            return Err(ScError::InvalidConfig);
        }
        if c.clock_hz / c.handshake_baud > u16::MAX as u32 {
            return Err(ScError::InvalidConfig);
        }
        Ok(c)
    }
}
