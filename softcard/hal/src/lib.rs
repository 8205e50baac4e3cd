#![no_std]
#![forbid(unsafe_code)]

//! Hardware abstraction for the softcard serial engine
//!
//! The engine needs exactly three hardware resources: one bidirectional I/O
//! line, one 16-bit timer with a compare channel for transmit bit timing and
//! an edge-capture/compare pair for receive sampling, and a microsecond
//! delay. The traits here keep the engine vendor-agnostic; a port implements
//! them on the target's registers.
//!
//! All trait operations are infallible: they map to single GPIO or compare
//! register accesses that cannot fail on any supported target.

pub mod line;
pub mod timer;

pub use line::IoLine;
pub use timer::BitTimer;

// The delay seam is the standard embedded-hal trait; ports and tests provide
// an implementation.
pub use embedded_hal::delay::DelayNs;
