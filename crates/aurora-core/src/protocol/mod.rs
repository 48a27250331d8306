//! Serial Protocol Communication
//!
//! Implements the Aurora inverter command/response protocol: fixed 8-byte
//! command frames and 6-byte response payloads, each protected by a CRC16.

pub mod commands;
mod connection;
pub mod crc;
pub mod decode;
mod error;
pub mod frame;
mod response;
pub mod serial;

pub use commands::{supported_readings, CommandSpec, Decoder, Reading};
pub use connection::{Connection, ConnectionConfig};
pub use error::ProtocolError;
pub use frame::CommandFrame;
pub use response::{DeviceState, ResponseData, ResponseTuple};
pub use serial::{SerialTransport, Transport};

/// Default baud rate for inverter communication
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Default timeout for responses in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default delay between writing a command and reading its response
pub const DEFAULT_COMMAND_DELAY_MS: u64 = 50;

/// Default RS-485 address of the inverter
pub const DEFAULT_ADDRESS: u8 = 2;

/// Default number of attempts per request
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Length of a response as read from the wire (payload + CRC)
pub const RESPONSE_LEN: usize = decode::PAYLOAD_LEN + crc::CRC_LEN;

/// Global flag for module-level measurements
pub const MODULE_SCOPE: u8 = 0;

/// Global flag for system-wide measurements
pub const GLOBAL_SCOPE: u8 = 1;

/// Format bytes as space separated hex pairs (e.g. "02 3B 01")
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
