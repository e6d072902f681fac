//! Device link
//!
//! Owns the single serial connection to the machine and implements the
//! line-oriented command/response protocol: write one command terminated by a
//! newline, then read one reply line bounded by the read timeout.

use engravekit_core::DeviceError;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

/// Byte transport underneath a [`DeviceLink`]
pub trait SerialTransport: Read + Write + Send {
    /// Drop any bytes the device sent before we started talking
    fn discard_input(&mut self) -> io::Result<()>;

    /// Human-readable port name
    fn name(&self) -> String;
}

impl SerialTransport for Box<dyn serialport::SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        serialport::SerialPort::clear(self.as_ref(), serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn name(&self) -> String {
        serialport::SerialPort::name(self.as_ref()).unwrap_or_else(|| "serial".to_string())
    }
}

/// Serial parameters for opening a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    /// Baud rate (8 data bits, no parity, 1 stop bit)
    pub baud_rate: u32,
    /// Upper bound on one reply read
    pub read_timeout: Duration,
    /// Pause after opening while the controller resets
    pub settle_delay: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(1000),
            settle_delay: Duration::from_millis(2000),
        }
    }
}

/// Link lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No open connection
    Disconnected,
    /// Connection open and ready for transactions
    Connected,
}

/// The single open connection to the machine
pub struct DeviceLink {
    port_name: String,
    transport: Option<BufReader<Box<dyn SerialTransport>>>,
    // Set after a timed-out read; the late tail of that reply must not be
    // taken as the answer to the next command.
    stale_input: bool,
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("port_name", &self.port_name)
            .field("state", &self.state())
            .finish()
    }
}

impl DeviceLink {
    /// Open `port` at 8N1 and prepare it for transactions
    pub fn connect(port: &str, settings: &LinkSettings) -> Result<Self, DeviceError> {
        tracing::info!("Opening {} at {} baud", port, settings.baud_rate);

        let serial = serialport::new(port, settings.baud_rate)
            .timeout(settings.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                tracing::error!("Failed to open serial port {}: {}", port, e);
                DeviceError::OpenFailed {
                    port: port.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Self::from_transport(Box::new(serial), settings)
    }

    /// Wrap an already-open transport: wait for the device to settle, then
    /// discard stale input
    pub fn from_transport(
        transport: Box<dyn SerialTransport>,
        settings: &LinkSettings,
    ) -> Result<Self, DeviceError> {
        let port_name = transport.name();

        if !settings.settle_delay.is_zero() {
            tracing::debug!("Waiting {:?} for {} to settle", settings.settle_delay, port_name);
            std::thread::sleep(settings.settle_delay);
        }

        let mut transport = transport;
        transport
            .discard_input()
            .map_err(|e| DeviceError::OpenFailed {
                port: port_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("Serial link established on {}", port_name);
        Ok(Self {
            port_name,
            transport: Some(BufReader::new(transport)),
            stale_input: false,
        })
    }

    /// Port this link was opened on
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        if self.transport.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    /// True while the link can carry transactions
    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// Send one command and return the trimmed reply line.
    ///
    /// A read timeout is a degraded read: the reply is empty and a warning is
    /// logged, so callers may treat `""` as "unacknowledged". Whatever arrives
    /// after a timeout is discarded before the next command is written.
    pub fn transact(&mut self, command: &str) -> Result<String, DeviceError> {
        let port_name = &self.port_name;
        let reader = self.transport.as_mut().ok_or(DeviceError::NotConnected)?;
        let io_error = |e: io::Error| DeviceError::Io {
            command: command.to_string(),
            reason: e.to_string(),
        };

        if self.stale_input {
            let buffered = reader.buffer().len();
            reader.consume(buffered);
            reader.get_mut().discard_input().map_err(io_error)?;
            self.stale_input = false;
        }

        let port = reader.get_mut();
        port.write_all(format!("{}\n", command).as_bytes())
            .map_err(io_error)?;
        port.flush().map_err(io_error)?;

        let mut reply = String::new();
        match reader.read_line(&mut reply) {
            Ok(0) => {
                tracing::warn!("No reply from {} to '{}'", port_name, command);
                return Ok(String::new());
            }
            Ok(_) => {}
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                if reply.is_empty() {
                    tracing::warn!("Read timed out on {} after '{}'", port_name, command);
                } else {
                    tracing::warn!(
                        "Read timed out on {} after '{}' with partial reply {:?}",
                        port_name,
                        command,
                        reply
                    );
                }
                self.stale_input = true;
                return Ok(String::new());
            }
            Err(e) => {
                tracing::error!("Serial read failed on {}: {}", port_name, e);
                return Err(io_error(e));
            }
        }

        let reply = reply.trim().to_string();
        tracing::debug!("{} : {}", command, reply);
        Ok(reply)
    }

    /// Close the connection; further transactions fail with `NotConnected`
    pub fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            tracing::info!("Disconnected from {}", self.port_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackPort;
    use std::collections::VecDeque;

    fn settings() -> LinkSettings {
        LinkSettings {
            settle_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let s = LinkSettings::default();
        assert_eq!(s.baud_rate, 115_200);
        assert_eq!(s.read_timeout, Duration::from_secs(1));
        assert_eq!(s.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_transact_writes_line_and_trims_reply() {
        let port = LoopbackPort::new();
        let sent = port.sent();
        let mut link = DeviceLink::from_transport(Box::new(port), &settings()).unwrap();

        assert_eq!(link.transact("G21").unwrap(), "ok");
        assert_eq!(link.transact("G90").unwrap(), "ok");
        assert_eq!(sent.lines(), vec!["G21", "G90"]);
    }

    #[test]
    fn test_timeout_is_empty_reply() {
        let port = LoopbackPort::new().silent();
        let mut link = DeviceLink::from_transport(Box::new(port), &settings()).unwrap();
        assert_eq!(link.transact("M5").unwrap(), "");
    }

    // Replies "o" to the first command and delivers the rest of that line only
    // after the read has timed out; later commands get a prompt "ok".
    struct LateTail {
        incoming: VecDeque<u8>,
        late: Vec<u8>,
        writes: usize,
    }

    impl Write for LateTail {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes == 1 {
                self.incoming.extend(b"o");
                self.late = b"k\r\n".to_vec();
            } else {
                self.incoming.extend(b"ok\r\n");
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for LateTail {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.incoming.is_empty() {
                self.incoming.extend(self.late.drain(..));
                return Err(io::ErrorKind::TimedOut.into());
            }
            let n = buf.len().min(self.incoming.len());
            for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl SerialTransport for LateTail {
        fn discard_input(&mut self) -> io::Result<()> {
            self.incoming.clear();
            Ok(())
        }

        fn name(&self) -> String {
            "late-tail".to_string()
        }
    }

    #[test]
    fn test_reply_tail_after_timeout_is_not_next_reply() {
        let port = LateTail {
            incoming: VecDeque::new(),
            late: Vec::new(),
            writes: 0,
        };
        let mut link = DeviceLink::from_transport(Box::new(port), &settings()).unwrap();
        assert_eq!(link.transact("G21").unwrap(), "");
        assert_eq!(link.transact("G90").unwrap(), "ok");
        assert_eq!(link.transact("M5").unwrap(), "ok");
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let port = LoopbackPort::new().fail_after(1);
        let mut link = DeviceLink::from_transport(Box::new(port), &settings()).unwrap();
        assert!(link.transact("G21").is_ok());
        let err = link.transact("G90").unwrap_err();
        assert!(matches!(err, DeviceError::Io { ref command, .. } if command == "G90"));
    }

    #[test]
    fn test_disconnect() {
        let mut link =
            DeviceLink::from_transport(Box::new(LoopbackPort::new()), &settings()).unwrap();
        assert_eq!(link.state(), LinkState::Connected);
        link.disconnect();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(matches!(
            link.transact("M5"),
            Err(DeviceError::NotConnected)
        ));
    }
}
