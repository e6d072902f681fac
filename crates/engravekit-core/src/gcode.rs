//! Typed motion commands
//!
//! Every line sent to the machine is built from a [`MotionCommand`] so that
//! axis letters, signs and number formatting are never assembled by hand.

use crate::machine::{Axis, JogDirection};
use std::fmt;

/// Format a coordinate or rate for a G-code word.
///
/// Rounds to 4 decimals, trims trailing zeros and never produces `-0`.
pub fn format_number(value: f64) -> String {
    let mut s = format!("{:.4}", value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// One command of the motion language
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    /// `G21` - units are millimeters
    SetUnitsMillimeters,
    /// `G90` - absolute positioning
    AbsolutePositioning,
    /// `G91` - relative positioning (jog moves only)
    RelativePositioning,
    /// `G0` - rapid (pen-up) move
    Rapid {
        /// Target X
        x: Option<f64>,
        /// Target Y
        y: Option<f64>,
        /// Target Z
        z: Option<f64>,
        /// Feed rate
        feed: Option<f64>,
    },
    /// `G1` - linear (pen-down) move
    Linear {
        /// Target X
        x: Option<f64>,
        /// Target Y
        y: Option<f64>,
        /// Target Z
        z: Option<f64>,
        /// Feed rate
        feed: Option<f64>,
    },
    /// `G0 <axis><sign><distance>` - single-axis relative rapid
    Jog {
        /// Axis to move
        axis: Axis,
        /// Direction of travel
        direction: JogDirection,
        /// Positive distance
        distance: f64,
    },
    /// `M3 S<speed>` - tool on
    SpindleOn {
        /// Tool speed
        speed: u32,
    },
    /// `M5` - tool off
    SpindleOff,
    /// `G92 X0 Y0 Z0` - current position becomes the origin
    SetOrigin,
}

impl MotionCommand {
    /// Rapid move to Z only
    pub fn rapid_z(z: f64) -> Self {
        Self::Rapid {
            x: None,
            y: None,
            z: Some(z),
            feed: None,
        }
    }

    /// Rapid move in the XY plane
    pub fn rapid_xy(x: f64, y: f64, feed: Option<f64>) -> Self {
        Self::Rapid {
            x: Some(x),
            y: Some(y),
            z: None,
            feed,
        }
    }
}

fn write_words(
    f: &mut fmt::Formatter<'_>,
    code: &str,
    words: [(char, Option<f64>); 4],
) -> fmt::Result {
    write!(f, "{}", code)?;
    for (letter, value) in words {
        if let Some(v) = value {
            write!(f, " {}{}", letter, format_number(v))?;
        }
    }
    Ok(())
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetUnitsMillimeters => write!(f, "G21"),
            Self::AbsolutePositioning => write!(f, "G90"),
            Self::RelativePositioning => write!(f, "G91"),
            Self::Rapid { x, y, z, feed } => {
                write_words(f, "G0", [('X', *x), ('Y', *y), ('Z', *z), ('F', *feed)])
            }
            Self::Linear { x, y, z, feed } => {
                write_words(f, "G1", [('X', *x), ('Y', *y), ('Z', *z), ('F', *feed)])
            }
            Self::Jog {
                axis,
                direction,
                distance,
            } => write!(f, "G0 {}{}{}", axis, direction, format_number(*distance)),
            Self::SpindleOn { speed } => write!(f, "M3 S{}", speed),
            Self::SpindleOff => write!(f, "M5"),
            Self::SetOrigin => write!(f, "G92 X0 Y0 Z0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.15), "-0.15");
        assert_eq!(format_number(228.6), "228.6");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(-0.00001), "0");
    }

    #[test]
    fn test_command_text() {
        assert_eq!(MotionCommand::SetUnitsMillimeters.to_string(), "G21");
        assert_eq!(MotionCommand::SpindleOn { speed: 8000 }.to_string(), "M3 S8000");
        assert_eq!(MotionCommand::rapid_z(2.0).to_string(), "G0 Z2");
        assert_eq!(
            MotionCommand::Rapid {
                x: Some(1.0),
                y: Some(3.5),
                z: Some(0.0),
                feed: Some(228.6)
            }
            .to_string(),
            "G0 X1 Y3.5 Z0 F228.6"
        );
        assert_eq!(
            MotionCommand::Linear {
                x: Some(0.5),
                y: Some(2.0),
                z: Some(-0.15),
                feed: Some(228.6)
            }
            .to_string(),
            "G1 X0.5 Y2 Z-0.15 F228.6"
        );
        assert_eq!(MotionCommand::SetOrigin.to_string(), "G92 X0 Y0 Z0");
    }

    #[test]
    fn test_jog_text() {
        let jog = MotionCommand::Jog {
            axis: Axis::X,
            direction: JogDirection::Positive,
            distance: 5.0,
        };
        assert_eq!(jog.to_string(), "G0 X+5");

        let jog = MotionCommand::Jog {
            axis: Axis::Z,
            direction: JogDirection::Negative,
            distance: 0.25,
        };
        assert_eq!(jog.to_string(), "G0 Z-0.25");
    }

    proptest! {
        #[test]
        fn formatted_numbers_parse_back_close(v in -1000.0f64..1000.0) {
            let text = format_number(v);
            let parsed: f64 = text.parse().unwrap();
            prop_assert!((parsed - v).abs() <= 0.00005 + f64::EPSILON);
            prop_assert!(text != "-0");
        }
    }
}
