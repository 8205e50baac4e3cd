#![no_std]
#![forbid(unsafe_code)]

//! # softcard-core
//!
//! Core primitives shared by the softcard emulator firmware: the wire-format
//! codec, the interrupt-safe byte queue, the link configuration, and the
//! [`CardLink`] seam between the serial engine and the protocol dispatcher.
//!
//! Everything in this crate is hardware-independent and runs on the host, so
//! the protocol and framing logic can be tested without simulating a timer
//! interrupt.

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod codec;
pub mod config;
pub mod link;
pub mod queue;

pub use codec::DataWidth;
pub use config::{LinkConfig, LinkConfigBuilder, Mode};
pub use link::CardLink;
pub use queue::ByteQueue;

/// Result type used throughout the softcard crates
pub type ScResult<T> = Result<T, ScError>;

/// Error types for softcard operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScError {
    /// Receive queue is full; the word was dropped
    QueueFull,
    /// Command buffer cannot hold another byte
    BufferFull,
    /// Link configuration is inconsistent
    InvalidConfig,
}

impl fmt::Display for ScError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScError::QueueFull => write!(f, "receive queue is full"),
            ScError::BufferFull => write!(f, "command buffer is full"),
            ScError::InvalidConfig => write!(f, "invalid link configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ScError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ScError::QueueFull => defmt::write!(fmt, "QueueFull"),
            ScError::BufferFull => defmt::write!(fmt, "BufferFull"),
            ScError::InvalidConfig => defmt::write!(fmt, "InvalidConfig"),
        }
    }
}
