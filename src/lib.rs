//! # EngraveKit
//!
//! Engraves text on a small CNC machine:
//!
//! 1. **engravekit-core** - error taxonomy, typed motion commands, motion programs
//! 2. **engravekit-designer** - glyph catalog and text-to-toolpath generation
//! 3. **engravekit-communication** - serial device link, jog/control, safety stop,
//!    streaming execution sessions
//! 4. **engravekit-visualizer** - program parsing and mirrored raster previews
//! 5. **engravekit-settings** - JSON/TOML configuration
//! 6. **engravekit** - this crate: logging setup and the command-line front end

pub mod cli;
pub mod commands;

pub use engravekit_communication::{
    ExecutionSession, LinkSettings, LoopbackPort, MachineController, MachineSettings,
    SessionStatus,
};
pub use engravekit_core::{Error, MotionProgram, Result};
pub use engravekit_designer::{GeneratorConfig, GlyphCatalog, TextFieldRecord, ToolpathGenerator};
pub use engravekit_settings::Config;
pub use engravekit_visualizer::{PreviewConfig, PreviewRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output on stderr, leaving stdout for command results
/// - RUST_LOG environment variable support (default `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
