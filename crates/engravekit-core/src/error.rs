//! Error handling for EngraveKit
//!
//! Provides error types for every layer of the motion pipeline:
//! - Validation errors (bad caller arguments and malformed configuration)
//! - Device errors (serial discovery and link transactions)
//! - Program errors (motion-program parsing)
//! - Session errors (streaming admission)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Validation error type
///
/// A caller mistake detected at the call boundary, before any device I/O.
/// Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Axis is not one of X, Y, Z
    #[error("Axis must be X, Y, or Z (got '{axis}')")]
    InvalidAxis {
        /// The rejected axis text.
        axis: String,
    },

    /// Jog direction is not '+' or '-'
    #[error("Direction must be '+' or '-' (got '{direction}')")]
    InvalidDirection {
        /// The rejected direction text.
        direction: String,
    },

    /// Control command is not recognized
    #[error("Invalid command: {command}")]
    InvalidCommand {
        /// The rejected command text.
        command: String,
    },

    /// Jog increment is not a positive finite number
    #[error("Jog increment must be a positive number (got {increment})")]
    InvalidIncrement {
        /// The rejected increment.
        increment: f64,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration '{field}': {reason}")]
    InvalidConfig {
        /// The configuration field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A color string is not `#rrggbb`
    #[error("Invalid color '{value}': expected #rrggbb")]
    InvalidColor {
        /// The rejected color text.
        value: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidConfig`]
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Device error type
///
/// Failures of the serial device: discovery at startup and transactions on an
/// established link.
#[derive(Error, Debug, Clone)]
pub enum DeviceError {
    /// No candidate port could be opened during discovery
    #[error("No available serial port found ({tried} candidates probed)")]
    Unavailable {
        /// Number of candidate ports that were probed.
        tried: usize,
    },

    /// The selected port could not be opened
    #[error("Failed to open port {port}: {reason}")]
    OpenFailed {
        /// The port identifier.
        port: String,
        /// The reason reported by the OS.
        reason: String,
    },

    /// A write or read on the established link failed
    #[error("Serial I/O error on '{command}': {reason}")]
    Io {
        /// The command being transacted when the failure occurred.
        command: String,
        /// The underlying I/O failure.
        reason: String,
    },

    /// The link has been closed
    #[error("Serial connection not established")]
    NotConnected,
}

/// Motion-program error type
#[derive(Error, Debug, Clone)]
pub enum ProgramError {
    /// A line carries a coordinate word that cannot be parsed
    #[error("Malformed program at line {line_number}: {reason}")]
    MalformedProgram {
        /// 1-based line number.
        line_number: usize,
        /// What could not be parsed.
        reason: String,
    },
}

/// Execution-session error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already streaming to the device
    #[error("An execution session is already streaming")]
    Busy,
}

/// Main error type for EngraveKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Device error
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Program error
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a device error
    pub fn is_device_error(&self) -> bool {
        matches!(self, Error::Device(_))
    }

    /// Check if this is a session admission error
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Session(SessionError::Busy))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_error() {
        let err: Error = ValidationError::InvalidAxis {
            axis: "A".to_string(),
        }
        .into();
        assert!(err.is_validation_error());
        assert!(!err.is_device_error());
        assert_eq!(err.to_string(), "Axis must be X, Y, or Z (got 'A')");
    }

    #[test]
    fn test_busy_is_detected() {
        let err: Error = SessionError::Busy.into();
        assert!(err.is_busy());
    }

    #[test]
    fn test_config_shorthand() {
        let err = ValidationError::config("scale", "must be > 0");
        assert_eq!(err.to_string(), "Invalid configuration 'scale': must be > 0");
    }
}
