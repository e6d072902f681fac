//! # EngraveKit Settings
//!
//! Loads, validates and saves the application configuration.

pub mod config;
pub mod error;

pub use config::{Config, ConnectionSettings, AUTO_PORT};
pub use error::{Result, SettingsError};
