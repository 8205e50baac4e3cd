//! The command dispatcher state machine.
//!
//! One cycle: `Idle` waits for the class byte, `Header` captures the rest of
//! the 5-byte header, `Dispatch` performs the instruction's action, and
//! `Respond` closes with the unconditional success trailer before zeroizing
//! the command buffer. Every byte crossing the link goes through the codec's
//! bit shaping.

use heapless::Vec;

use softcard_core::{codec, CardLink, DataWidth, Mode, ScError, ScResult};

use crate::proto::{Instruction, ResponseSet, CLA};

/// Capacity of the command capture buffer.
pub const COMMAND_BUF_LEN: usize = 32;

/// Payload size of the control-word write command.
pub const CW_PAYLOAD_LEN: usize = 32;

/// Fixed capture buffer for the active command.
///
/// Holds the header (class, instruction, P1, P2, length) and, for the
/// control-word write, the payload that overwrites it. Zeroized (contents
/// overwritten before truncation) at the end of every command cycle.
pub struct CommandBuffer {
    bytes: Vec<u8, COMMAND_BUF_LEN>,
}

impl CommandBuffer {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Append one captured byte.
    pub fn push(&mut self, byte: u8) -> ScResult<()> {
        self.bytes.push(byte).map_err(|_| ScError::BufferFull)
    }

    /// Captured bytes so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Instruction byte of the captured header, if present.
    pub fn instruction(&self) -> Option<u8> {
        self.bytes.get(1).copied()
    }

    /// Length byte of the captured header, if present. Captured but never
    /// used to size a response.
    pub fn length(&self) -> Option<u8> {
        self.bytes.get(4).copied()
    }

    /// Discard the captured bytes without zeroizing (the control-word
    /// payload reuses the buffer from the start).
    pub fn restart(&mut self) {
        self.bytes.clear();
    }

    /// Overwrite the contents with zeros, then empty the buffer.
    pub fn zeroize(&mut self) {
        for byte in self.bytes.iter_mut() {
            *byte = 0;
        }
        self.bytes.clear();
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Command cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Waiting for the class byte
    Idle,
    /// Capturing instruction, P1, P2, and length
    Header,
    /// Performing the instruction's action
    Dispatch,
    /// Sending the success trailer and closing the cycle
    Respond,
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CycleState::Idle => defmt::write!(fmt, "Idle"),
            CycleState::Header => defmt::write!(fmt, "Header"),
            CycleState::Dispatch => defmt::write!(fmt, "Dispatch"),
            CycleState::Respond => defmt::write!(fmt, "Respond"),
        }
    }
}

/// The protocol dispatcher: the firmware's single foreground task.
pub struct Dispatcher<L: CardLink> {
    link: L,
    responses: ResponseSet,
    width: DataWidth,
    cmd: CommandBuffer,
    state: CycleState,
}

impl<L: CardLink> Dispatcher<L> {
    /// Build a dispatcher over a link. `responses` is opaque table data;
    /// `width` must match the link's configured frame width.
    pub fn new(link: L, responses: ResponseSet, width: DataWidth) -> Self {
        Self {
            link,
            responses,
            width,
            cmd: CommandBuffer::new(),
            state: CycleState::Idle,
        }
    }

    /// Current cycle state.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Access the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutable access to the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Consume the dispatcher, returning the link.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Power-on sequence, run once before the command loop: the ATR goes out
    /// at the handshake rate, then the link switches one-way to the
    /// operating rate.
    pub fn power_on(&mut self) {
        self.link.configure(Mode::Handshake);
        self.transmit(self.responses.atr);
        self.link.configure(Mode::Operating);
    }

    /// Advance the command cycle by one state; returns the new state.
    pub fn step(&mut self) -> CycleState {
        match self.state {
            CycleState::Idle => {
                if self.receive_byte() == CLA {
                    self.cmd.push(CLA).ok();
                    self.state = CycleState::Header;
                }
            }
            CycleState::Header => {
                for _ in 0..4 {
                    let byte = self.receive_byte();
                    self.cmd.push(byte).ok();
                }
                self.state = CycleState::Dispatch;
            }
            CycleState::Dispatch => {
                self.dispatch();
                self.state = CycleState::Respond;
            }
            CycleState::Respond => {
                self.transmit(self.responses.trailer);
                self.cmd.zeroize();
                self.state = CycleState::Idle;
            }
        }
        self.state
    }

    /// Run one full command cycle: wait for a header, dispatch, respond.
    pub fn run_cycle(&mut self) {
        loop {
            let closing = self.state == CycleState::Respond;
            self.step();
            if closing && self.state == CycleState::Idle {
                break;
            }
        }
    }

    /// Power on, then serve command cycles forever.
    pub fn run(&mut self) -> ! {
        self.power_on();
        loop {
            self.run_cycle();
        }
    }

    fn dispatch(&mut self) {
        let ins = match self.cmd.instruction() {
            Some(byte) => byte,
            None => return,
        };
        match Instruction::from_byte(ins) {
            Some(Instruction::Serial) => self.transmit(self.responses.serial),
            Some(Instruction::Seed) => self.transmit(self.responses.seed),
            Some(Instruction::Message) => self.transmit(self.responses.message),
            Some(Instruction::Mailbox) => self.transmit(self.responses.mailbox),
            Some(Instruction::ControlWord) => self.receive_control_word(ins),
            // No authentication algorithm exists; unknown instructions get
            // the same treatment: the trailer alone answers.
            Some(Instruction::Auth) | None => {}
        }
    }

    /// Control-word write: echo the instruction, then consume the payload.
    /// The data is captured into the command buffer and discarded with the
    /// cycle's zeroize; no response body follows.
    fn receive_control_word(&mut self, ins: u8) {
        self.transmit(&[ins]);
        self.cmd.restart();
        for _ in 0..CW_PAYLOAD_LEN {
            let byte = self.receive_byte();
            self.cmd.push(byte).ok();
        }
    }

    fn transmit(&mut self, data: &[u8]) {
        self.link.begin_tx();
        for &byte in data {
            self.link.send_frame(codec::encode(byte, self.width));
        }
        self.link.end_tx();
    }

    fn receive_byte(&mut self) -> u8 {
        codec::decode(self.link.read_frame())
    }
}
