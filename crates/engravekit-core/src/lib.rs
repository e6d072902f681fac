//! # EngraveKit Core
//!
//! Core types shared by every EngraveKit crate: the error taxonomy, the
//! machine vocabulary used by jog/control operations, typed motion commands
//! and the motion-program artifact.

pub mod error;
pub mod gcode;
pub mod machine;
pub mod program;

pub use error::{DeviceError, Error, ProgramError, Result, SessionError, ValidationError};
pub use gcode::{format_number, MotionCommand};
pub use machine::{Axis, ControlCommand, JogDirection};
pub use program::MotionProgram;
