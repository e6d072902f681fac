//! In-memory loopback transport
//!
//! Stands in for a machine: records every command line it receives and answers
//! each with `ok`. Used for dry runs and tests.

use crate::link::SerialTransport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

/// Shared view of the lines a [`LoopbackPort`] has received
#[derive(Debug, Clone, Default)]
pub struct SentLines(Arc<Mutex<Vec<String>>>);

impl SentLines {
    /// Snapshot of received lines, in order
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Number of received lines
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// True if nothing has been received
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Forget received lines
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Transport that acknowledges every line with `ok`
#[derive(Debug, Default)]
pub struct LoopbackPort {
    sent: SentLines,
    partial: Vec<u8>,
    pending: VecDeque<u8>,
    silent: bool,
    fail_after: Option<usize>,
    latency: Duration,
}

impl LoopbackPort {
    /// Create a loopback that acknowledges everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Never reply; every read times out
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Accept `lines` complete lines, then fail every write
    pub fn fail_after(mut self, lines: usize) -> Self {
        self.fail_after = Some(lines);
        self
    }

    /// Delay each reply, simulating the device executing the command
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle to the received lines that stays valid after the port is moved
    pub fn sent(&self) -> SentLines {
        self.sent.clone()
    }

    fn write_limit_reached(&self) -> bool {
        self.fail_after
            .is_some_and(|limit| self.sent.len() >= limit)
    }
}

impl Write for LoopbackPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.write_limit_reached() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "loopback write limit reached",
            ));
        }

        for &byte in buf {
            if byte != b'\n' {
                self.partial.push(byte);
                continue;
            }
            let line = String::from_utf8_lossy(&self.partial).trim().to_string();
            self.partial.clear();
            self.sent.0.lock().push(line);
            if !self.silent {
                self.pending.extend(b"ok\r\n");
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for LoopbackPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "loopback read timed out"));
        }
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl SerialTransport for LoopbackPort {
    fn discard_input(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn name(&self) -> String {
        "loopback".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_lines_and_acks() {
        let mut port = LoopbackPort::new();
        port.write_all(b"G21\nG9").unwrap();
        port.write_all(b"0\n").unwrap();
        assert_eq!(port.sent().lines(), vec!["G21", "G90"]);

        let mut buf = [0u8; 16];
        let n = port.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ok\r\nok\r\n");
    }

    #[test]
    fn test_silent_read_times_out() {
        let mut port = LoopbackPort::new().silent();
        port.write_all(b"M5\n").unwrap();
        let err = port.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_fail_after() {
        let mut port = LoopbackPort::new().fail_after(1);
        port.write_all(b"G21\n").unwrap();
        assert!(port.write_all(b"G90\n").is_err());
        assert_eq!(port.sent().len(), 1);
    }
}
