//! # EngraveKit Communication
//!
//! The serial side of the engraving pipeline:
//! - [`serial`] - port discovery and enumeration
//! - [`link`] - the line-oriented command/response device link
//! - [`loopback`] - an in-memory device for dry runs and tests
//! - [`controller`] - jog/control commands, safety stop and streaming sessions

pub mod controller;
pub mod link;
pub mod loopback;
pub mod serial;

pub use controller::{ExecutionSession, MachineController, MachineSettings, SessionStatus};
pub use link::{DeviceLink, LinkSettings, LinkState, SerialTransport};
pub use loopback::{LoopbackPort, SentLines};
pub use serial::{candidate_ports, discover, discover_with, list_ports, SerialPortInfo};
