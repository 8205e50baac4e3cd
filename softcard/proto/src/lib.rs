#![no_std]
#![forbid(unsafe_code)]

//! # softcard-proto
//!
//! The half-duplex command protocol of the emulated subscriber card: the
//! 5-byte header grammar, the canned response tables, and the dispatcher
//! state machine that serves them. The dispatcher only speaks through the
//! [`softcard_core::CardLink`] seam, so everything here runs under test on
//! the host against an in-memory link.

pub mod dispatch;
pub mod proto;

pub use dispatch::{CommandBuffer, CycleState, Dispatcher, COMMAND_BUF_LEN, CW_PAYLOAD_LEN};
pub use proto::{Instruction, ResponseSet, ATR, CLA, STATUS_OK};
