//! Serial port handling
//!
//! Provides the blocking byte channel used to talk to the inverter over an
//! RS-485 adapter.

use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use super::{format_hex, ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Byte written on close to cancel any pending inverter operation
const CANCEL_BYTE: &[u8] = b"\n";

/// Blocking duplex byte channel to the inverter
pub trait Transport {
    /// Open the channel
    fn open(&mut self) -> Result<(), ProtocolError>;

    /// Write all of `data`; a short write is a `TransportIo` error
    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Read exactly `n` bytes; fewer before the timeout is a `TransportIo` error
    fn read(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError>;

    /// Release the channel. Safe to call more than once.
    fn close(&mut self);

    /// Whether the channel is currently open
    fn is_open(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), ProtocolError> {
        (**self).open()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        (**self).write(data)
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        (**self).read(n)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Serial port transport (8N1, no flow control)
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Transport for `port_name`; nothing is opened until [`Transport::open`]
    pub fn new(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    /// Transport with the default baud rate and read timeout
    pub fn with_defaults(port_name: impl Into<String>) -> Self {
        Self::new(
            port_name,
            DEFAULT_BAUD_RATE,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Name of the underlying serial device
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ProtocolError> {
        self.port.as_mut().ok_or(ProtocolError::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), ProtocolError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|e| ProtocolError::SerialError(format!("{}: {}", self.port_name, e)))?;

        tracing::info!(
            "Opened serial port {}; baud {}; timeout {:.2}s",
            self.port_name,
            self.baud_rate,
            self.timeout.as_secs_f64()
        );
        self.port = Some(port);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let port = self.port()?;
        let written = Write::write(port, data)
            .map_err(|e| ProtocolError::TransportIo(format!("write failed: {e}")))?;
        if written != data.len() {
            return Err(ProtocolError::TransportIo(format!(
                "expected to write {} bytes; sent {} instead",
                data.len(),
                written
            )));
        }
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        let timeout = self.timeout;
        let port = self.port()?;
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; n];
        let mut filled = 0;

        while filled < n {
            match Read::read(port, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(ProtocolError::TransportIo(format!("read failed: {e}")));
                }
            }
            if Instant::now() >= deadline {
                break;
            }
        }

        if filled != n {
            return Err(ProtocolError::TransportIo(format!(
                "expected to read {} bytes; got {} instead ({})",
                n,
                filled,
                format_hex(&buf[..filled])
            )));
        }
        Ok(buf)
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.write_all(CANCEL_BYTE) {
                tracing::debug!("Ignoring cancel write failure on close: {}", e);
            }
            tracing::info!("Closed serial port {}", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
