//! Machine vocabulary for jog and control operations
//!
//! Caller-facing strings ("X", "+", "start") are parsed into these types at the
//! call boundary so that invalid input is rejected before any device I/O.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A linear machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Axis letter as used in G-code words
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Axis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            other => Err(ValidationError::InvalidAxis {
                axis: other.to_string(),
            }),
        }
    }
}

/// Direction of a relative jog move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JogDirection {
    /// Towards positive coordinates
    Positive,
    /// Towards negative coordinates
    Negative,
}

impl JogDirection {
    /// Sign character used in the jog word
    pub fn sign(self) -> char {
        match self {
            JogDirection::Positive => '+',
            JogDirection::Negative => '-',
        }
    }
}

impl fmt::Display for JogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sign())
    }
}

impl FromStr for JogDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(JogDirection::Positive),
            "-" => Ok(JogDirection::Negative),
            other => Err(ValidationError::InvalidDirection {
                direction: other.to_string(),
            }),
        }
    }
}

/// Immediate tool/position control commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlCommand {
    /// Enable the tool at the default control speed
    Start,
    /// Disable the tool
    Stop,
    /// Zero the current position as the new origin
    SetOrigin,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::SetOrigin => write!(f, "setOrigin"),
        }
    }
}

impl FromStr for ControlCommand {
    type Err = ValidationError;

    /// Accepts `start`, `stop`, and `setOrigin` (plus the short form `set`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "setOrigin" | "set" => Ok(Self::SetOrigin),
            other => Err(ValidationError::InvalidCommand {
                command: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_parsing() {
        assert_eq!("X".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("Z".parse::<Axis>().unwrap(), Axis::Z);
        assert!(matches!(
            "A".parse::<Axis>(),
            Err(ValidationError::InvalidAxis { .. })
        ));
        // Case sensitive, like the device protocol
        assert!("x".parse::<Axis>().is_err());
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("+".parse::<JogDirection>().unwrap(), JogDirection::Positive);
        assert_eq!("-".parse::<JogDirection>().unwrap(), JogDirection::Negative);
        assert!(matches!(
            "*".parse::<JogDirection>(),
            Err(ValidationError::InvalidDirection { .. })
        ));
    }

    #[test]
    fn test_control_parsing() {
        assert_eq!("start".parse::<ControlCommand>().unwrap(), ControlCommand::Start);
        assert_eq!("set".parse::<ControlCommand>().unwrap(), ControlCommand::SetOrigin);
        assert_eq!(
            "setOrigin".parse::<ControlCommand>().unwrap(),
            ControlCommand::SetOrigin
        );
        assert!("home".parse::<ControlCommand>().is_err());
    }
}
