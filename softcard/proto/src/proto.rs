//! Wire constants and canned response data.
//!
//! The response tables are opaque data as far as the dispatcher is
//! concerned: it receives them through a [`ResponseSet`] and never looks
//! inside. The values here are the fixed placeholders of the emulated card:
//! no real key material or control words are derived anywhere.

/// Class byte opening every command header.
pub const CLA: u8 = 0x53;

/// Instruction byte of the 5-byte command header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Report the card serial number
    Serial,
    /// Control-word write; the card consumes a 32-byte payload
    ControlWord,
    /// Authentication challenge; answered by the bare success trailer
    Auth,
    /// Report the key seed placeholder
    Seed,
    /// Report the on-screen message placeholder
    Message,
    /// Report the mailbox placeholder
    Mailbox,
}

impl Instruction {
    /// Wire value of this instruction.
    pub const fn code(self) -> u8 {
        match self {
            Instruction::Serial => 0x70,
            Instruction::ControlWord => 0x74,
            Instruction::Auth => 0x76,
            Instruction::Seed => 0x78,
            Instruction::Message => 0x7A,
            Instruction::Mailbox => 0x7C,
        }
    }

    /// Decode a header instruction byte; `None` for anything unassigned.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x70 => Some(Instruction::Serial),
            0x74 => Some(Instruction::ControlWord),
            0x76 => Some(Instruction::Auth),
            0x78 => Some(Instruction::Seed),
            0x7A => Some(Instruction::Message),
            0x7C => Some(Instruction::Mailbox),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Instruction {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Instruction::Serial => defmt::write!(fmt, "Serial"),
            Instruction::ControlWord => defmt::write!(fmt, "ControlWord"),
            Instruction::Auth => defmt::write!(fmt, "Auth"),
            Instruction::Seed => defmt::write!(fmt, "Seed"),
            Instruction::Message => defmt::write!(fmt, "Message"),
            Instruction::Mailbox => defmt::write!(fmt, "Mailbox"),
        }
    }
}

/// Answer-To-Reset transmitted at power-up, always at the handshake rate.
pub const ATR: [u8; 16] = [
    0x3f, 0xfa, 0x12, 0x25, 0x05, 0x00, 0x01, 0xb0, 0x02, 0x3b, 0x36, 0x4d, 0x59, 0x02, 0x80,
    0x81,
];

/// Alternate ATR from the original card dumps; carried as data, never
/// selected at runtime.
pub const ATR_ALT: [u8; 16] = [
    0x3f, 0xfa, 0x11, 0x25, 0x05, 0x00, 0x01, 0xb0, 0x02, 0x3b, 0x36, 0x4d, 0x59, 0x02, 0x80,
    0x81,
];

/// Fixed serial-number report (echoes the SERIAL instruction).
pub const SERIAL_NUMBER: [u8; 7] = [0x70, 0x2b, 0x02, 0x56, 0x02, 0x03, 0x04];

/// Seed placeholder: instruction echo plus eight bytes of 0xFF.
pub const SEED_PLACEHOLDER: [u8; 9] = [0x78, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Message placeholder: instruction echo, attribute byte, 24 blanks.
pub const MESSAGE_PLACEHOLDER: [u8; 26] = [
    0x7A, 0x80, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
];

/// Mailbox placeholder: instruction echo plus sixteen zero bytes.
pub const MAILBOX_PLACEHOLDER: [u8; 17] = [
    0x7C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Success trailer closing every command cycle.
pub const STATUS_OK: [u8; 2] = [0x90, 0x00];

/// Canned response tables supplied to the dispatcher as opaque static data.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSet {
    pub atr: &'static [u8],
    pub serial: &'static [u8],
    pub seed: &'static [u8],
    pub message: &'static [u8],
    pub mailbox: &'static [u8],
    pub trailer: &'static [u8],
}

impl Default for ResponseSet {
    fn default() -> Self {
        Self {
            atr: &ATR,
            serial: &SERIAL_NUMBER,
            seed: &SEED_PLACEHOLDER,
            message: &MESSAGE_PLACEHOLDER,
            mailbox: &MAILBOX_PLACEHOLDER,
            trailer: &STATUS_OK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_codes_round_trip() {
        for ins in [
            Instruction::Serial,
            Instruction::ControlWord,
            Instruction::Auth,
            Instruction::Seed,
            Instruction::Message,
            Instruction::Mailbox,
        ] {
            assert_eq!(Instruction::from_byte(ins.code()), Some(ins));
        }
        assert_eq!(Instruction::from_byte(0x7F), None);
        assert_eq!(Instruction::from_byte(0x00), None);
    }

    #[test]
    fn tables_echo_their_instruction() {
        assert_eq!(SERIAL_NUMBER[0], Instruction::Serial.code());
        assert_eq!(SEED_PLACEHOLDER[0], Instruction::Seed.code());
        assert_eq!(MESSAGE_PLACEHOLDER[0], Instruction::Message.code());
        assert_eq!(MAILBOX_PLACEHOLDER[0], Instruction::Mailbox.code());
    }

    #[test]
    fn seed_placeholder_is_eight_ff_bytes() {
        assert_eq!(SEED_PLACEHOLDER.len(), 9);
        assert!(SEED_PLACEHOLDER[1..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn atr_tables_differ_only_in_the_version_byte() {
        assert_eq!(ATR.len(), 16);
        assert_eq!(ATR_ALT.len(), 16);
        assert_eq!(ATR[2], 0x12);
        assert_eq!(ATR_ALT[2], 0x11);
        for i in (0..16).filter(|&i| i != 2) {
            assert_eq!(ATR[i], ATR_ALT[i]);
        }
    }
}
