//! Protocol errors

use thiserror::Error;

use super::format_hex;

/// Errors that can occur during inverter communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A command frame could not be assembled from the supplied values
    #[error("Invalid command frame: {0}")]
    FormatError(String),

    /// The trailing CRC of a received frame did not match its payload
    #[error(
        "CRC mismatch on response {}: computed {}, received {}",
        format_hex(.frame),
        format_hex(.computed),
        format_hex(.received)
    )]
    ChecksumMismatch {
        /// The full frame as received
        frame: Vec<u8>,
        /// Checksum of the payload, wire order
        computed: [u8; 2],
        /// Trailing bytes of the frame
        received: Vec<u8>,
    },

    /// Short write, short read or a fault on the channel
    #[error("Transport I/O error: {0}")]
    TransportIo(String),

    /// Reading name not in the registry
    #[error("Unknown reading: '{0}'")]
    UnknownReading(String),

    /// Every attempt failed with a transport fault
    #[error("Unable to query '{reading}' after {attempts} attempt(s)")]
    RetriesExhausted {
        /// Protocol name of the reading
        reading: String,
        /// Attempts made
        attempts: u32,
    },

    /// The serial device could not be opened
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Transport used while closed
    #[error("Not connected to inverter")]
    NotConnected,

    /// Malformed connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether a request may be repeated after this error.
    ///
    /// Only channel faults are transient. A checksum mismatch is retryable
    /// only when the caller opts in.
    pub fn is_retryable(&self, retry_on_checksum: bool) -> bool {
        match self {
            ProtocolError::TransportIo(_) => true,
            ProtocolError::ChecksumMismatch { .. } => retry_on_checksum,
            _ => false,
        }
    }
}
