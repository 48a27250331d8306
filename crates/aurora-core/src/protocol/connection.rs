//! Connection management
//!
//! Handles the transport lifecycle and request execution with the inverter:
//! build the command frame, write it, wait for the inverter to turn the bus
//! around, read the response, check its CRC and decode the payload.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{
    crc::verify_and_strip, decode::decode, format_hex, CommandFrame, ProtocolError, Reading,
    ResponseTuple, SerialTransport, Transport, DEFAULT_ADDRESS, DEFAULT_BAUD_RATE,
    DEFAULT_COMMAND_DELAY_MS, DEFAULT_MAX_TRIES, DEFAULT_TIMEOUT_MS, MODULE_SCOPE, RESPONSE_LEN,
};

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Response timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay between sending a command and reading the response
    pub command_delay_ms: u64,
    /// RS-485 address of the inverter
    pub address: u8,
    /// Attempts per request before giving up
    pub max_tries: u32,
    /// Treat a CRC mismatch like a transport fault and retry it
    pub retry_on_checksum: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            command_delay_ms: DEFAULT_COMMAND_DELAY_MS,
            address: DEFAULT_ADDRESS,
            max_tries: DEFAULT_MAX_TRIES,
            retry_on_checksum: false,
        }
    }
}

impl ConnectionConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Wait between write and read
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}

/// Inverter connection over an exclusively owned transport
///
/// The transport is closed exactly once: by [`Connection::close`] or, failing
/// that, when the connection is dropped.
pub struct Connection<T: Transport = SerialTransport> {
    transport: T,
    config: ConnectionConfig,
    /// Metrics: cumulative bytes/frames sent & received
    tx_bytes: u64,
    rx_bytes: u64,
    tx_frames: u64,
    rx_frames: u64,
}

impl Connection<SerialTransport> {
    /// Open the serial port named in the configuration
    pub fn open_serial(config: ConnectionConfig) -> Result<Self, ProtocolError> {
        let transport = SerialTransport::new(&config.port_name, config.baud_rate, config.timeout());
        Self::open(config, transport)
    }
}

impl<T: Transport> Connection<T> {
    /// Open `transport` and take ownership of it
    pub fn open(config: ConnectionConfig, mut transport: T) -> Result<Self, ProtocolError> {
        transport.open()?;
        Ok(Self {
            transport,
            config,
            tx_bytes: 0,
            rx_bytes: 0,
            tx_frames: 0,
            rx_frames: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The owned transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the transport is still open
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Get cumulative tx/rx bytes and frame counters
    pub fn get_counters(&self) -> (u64, u64, u64, u64) {
        (self.tx_bytes, self.rx_bytes, self.tx_frames, self.rx_frames)
    }

    /// Query a reading by name.
    ///
    /// Unknown names fail before the transport is touched. Transport faults
    /// are retried up to `max_tries` attempts in total; every other error is
    /// returned as is.
    pub fn execute(
        &mut self,
        reading_name: &str,
        global_flag: u8,
        address: u8,
        max_tries: u32,
    ) -> Result<ResponseTuple, ProtocolError> {
        let reading: Reading = reading_name.parse()?;
        self.execute_reading(reading, global_flag, address, max_tries)
    }

    /// Query a reading with the configured address and attempt count
    pub fn request(
        &mut self,
        reading: Reading,
        global_flag: u8,
    ) -> Result<ResponseTuple, ProtocolError> {
        self.execute_reading(reading, global_flag, self.config.address, self.config.max_tries)
    }

    /// Query a module-scope reading with the configured defaults
    pub fn read(&mut self, reading: Reading) -> Result<ResponseTuple, ProtocolError> {
        self.request(reading, MODULE_SCOPE)
    }

    /// Query a typed reading; same retry rules as [`Connection::execute`]
    pub fn execute_reading(
        &mut self,
        reading: Reading,
        global_flag: u8,
        address: u8,
        max_tries: u32,
    ) -> Result<ResponseTuple, ProtocolError> {
        let spec = reading.spec();
        let request =
            CommandFrame::new(address, spec.command, spec.sub_command, global_flag).to_wire();
        let attempts = max_tries.max(1);

        for attempt in 1..=attempts {
            match self.exchange(&request) {
                Ok(payload) => return Ok(decode(spec.decoder, &payload)),
                Err(e) if e.is_retryable(self.config.retry_on_checksum) => {
                    tracing::warn!("{}: try #{} of {} failed: {}", reading, attempt, attempts, e);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(
            "Unable to send or receive '{}' to/from the inverter after {} attempt(s)",
            reading,
            attempts
        );
        Err(ProtocolError::RetriesExhausted {
            reading: reading.name().to_string(),
            attempts,
        })
    }

    /// One write/delay/read round trip; returns the CRC-checked payload
    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        tracing::debug!("sent {}", format_hex(request));
        self.transport.write(request)?;
        self.tx_bytes += request.len() as u64;
        self.tx_frames += 1;

        std::thread::sleep(self.config.command_delay());

        let response = self.transport.read(RESPONSE_LEN)?;
        self.rx_bytes += response.len() as u64;
        self.rx_frames += 1;
        tracing::debug!("read {}", format_hex(&response));

        verify_and_strip(&response).map(<[u8]>::to_vec)
    }

    /// Close the transport
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if self.transport.is_open() {
            self.transport.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.command_delay(), Duration::from_millis(50));
        assert_eq!(config.address, 2);
        assert_eq!(config.max_tries, 3);
        assert!(!config.retry_on_checksum);
    }

    #[test]
    fn test_config_partial_json() {
        let config =
            ConnectionConfig::from_json_str(r#"{"port_name": "/dev/ttyUSB1", "max_tries": 5}"#)
                .unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB1");
        assert_eq!(config.max_tries, 5);
        assert_eq!(config.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn test_config_address_must_fit_byte() {
        let err = ConnectionConfig::from_json_str(r#"{"address": 300}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Config(_)));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aurora.json");
        std::fs::write(&path, r#"{"address": 3, "command_delay_ms": 20}"#).unwrap();

        let config = ConnectionConfig::from_file(&path).unwrap();
        assert_eq!(config.address, 3);
        assert_eq!(config.command_delay(), Duration::from_millis(20));

        assert!(matches!(
            ConnectionConfig::from_file(dir.path().join("missing.json")),
            Err(ProtocolError::IoError(_))
        ));
    }
}
