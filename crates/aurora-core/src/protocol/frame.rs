//! Command frame builder
//!
//! Every request sent to the inverter is a fixed 8-byte frame followed by
//! its 2-byte CRC:
//!
//! ```text
//! byte 0: inverter address
//! byte 1: command code
//! byte 2: sub-command code
//! byte 3: global flag (1 = global/system, 0 = module)
//! byte 4..8: zero padding
//! byte 8..10: CRC (low, high)
//! ```

use super::crc::append_crc;
use super::ProtocolError;

/// Length of a command frame without CRC
pub const COMMAND_LEN: usize = 8;

/// Length of a command frame as sent on the wire
pub const REQUEST_LEN: usize = COMMAND_LEN + super::crc::CRC_LEN;

/// An outbound command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; COMMAND_LEN],
}

impl CommandFrame {
    /// Build a frame from byte-sized fields
    pub fn new(address: u8, command: u8, sub_command: u8, global_flag: u8) -> Self {
        Self {
            bytes: [address, command, sub_command, global_flag, 0, 0, 0, 0],
        }
    }

    /// Build a frame from untyped values, rejecting anything that does not
    /// fit in a byte
    pub fn try_new(
        address: u32,
        command: u32,
        sub_command: u32,
        global_flag: u32,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(
            to_byte("address", address)?,
            to_byte("command", command)?,
            to_byte("sub-command", sub_command)?,
            to_byte("global flag", global_flag)?,
        ))
    }

    /// The 8 frame bytes, without CRC
    pub fn as_bytes(&self) -> &[u8; COMMAND_LEN] {
        &self.bytes
    }

    /// The frame with its CRC appended, ready to write
    pub fn to_wire(&self) -> Vec<u8> {
        append_crc(&self.bytes)
    }
}

fn to_byte(field: &str, value: u32) -> Result<u8, ProtocolError> {
    u8::try_from(value)
        .map_err(|_| ProtocolError::FormatError(format!("{field} {value} does not fit in a byte")))
}

/// Build the 8-byte command for the given fields
pub fn build_command(address: u8, command: u8, sub_command: u8, global_flag: u8) -> [u8; COMMAND_LEN] {
    *CommandFrame::new(address, command, sub_command, global_flag).as_bytes()
}
