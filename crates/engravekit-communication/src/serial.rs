//! Serial port discovery
//!
//! Builds the default probe list for the host platform, finds the first port
//! that opens, and enumerates ports that look like CNC controllers.

use engravekit_core::{DeviceError, Error, Result};
use std::time::Duration;

/// Baud rate used when probing candidates
pub const PROBE_BAUD_RATE: u32 = 115_200;

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor/product IDs if applicable
    pub usb_ids: Option<(u16, u16)>,
}

/// Default probe list for this platform, in probe order.
///
/// - Linux: `/dev/ttyUSB0..19` then `/dev/ttyACM0..19`
/// - Windows: `COM1..COM50`
/// - Elsewhere (macOS): enumerated ports matching CNC patterns
pub fn candidate_ports() -> Vec<String> {
    if cfg!(target_os = "linux") {
        (0..20)
            .map(|i| format!("/dev/ttyUSB{}", i))
            .chain((0..20).map(|i| format!("/dev/ttyACM{}", i)))
            .collect()
    } else if cfg!(target_os = "windows") {
        (1..=50).map(|i| format!("COM{}", i)).collect()
    } else {
        match list_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                tracing::warn!("Port enumeration failed, no candidates: {}", e);
                Vec::new()
            }
        }
    }
}

/// Return the first candidate that opens and closes cleanly
pub fn discover(candidates: &[String]) -> std::result::Result<String, DeviceError> {
    discover_with(candidates, |port| {
        match serialport::new(port, PROBE_BAUD_RATE)
            .timeout(Duration::from_millis(100))
            .open()
        {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!("Probe of {} failed: {}", port, e);
                false
            }
        }
    })
}

/// [`discover`] with a caller-supplied probe
pub fn discover_with<F>(
    candidates: &[String],
    mut probe: F,
) -> std::result::Result<String, DeviceError>
where
    F: FnMut(&str) -> bool,
{
    for port in candidates {
        if probe(port) {
            tracing::info!("Discovered serial device on {}", port);
            return Ok(port.clone());
        }
    }

    tracing::error!("No serial device found among {} candidates", candidates.len());
    Err(DeviceError::Unavailable {
        tried: candidates.len(),
    })
}

/// List available serial ports that match CNC controller patterns
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_valid_cnc_port(&port.port_name))
        .map(|port| {
            let (manufacturer, usb_ids) = match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    (usb.manufacturer.clone(), Some((usb.vid, usb.pid)))
                }
                _ => (None, None),
            };
            SerialPortInfo {
                port_name: port.port_name.clone(),
                description: describe(&port.port_type),
                manufacturer,
                usb_ids,
            }
        })
        .collect())
}

/// Check if a port name matches CNC controller patterns
///
/// - Windows: COM* (COM1, COM2, etc.)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn is_valid_cnc_port(port_name: &str) -> bool {
    if let Some(num) = port_name.strip_prefix("COM") {
        return !num.is_empty() && num.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn describe(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}
