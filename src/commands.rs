//! Command implementations behind the CLI

use crate::cli::LinkArgs;
use anyhow::{Context, Result};
use engravekit_communication::{
    candidate_ports, discover, DeviceLink, LoopbackPort, MachineController, SessionStatus,
};
use engravekit_core::MotionProgram;
use engravekit_designer::{TextFieldRecord, ToolpathGenerator};
use engravekit_settings::Config;
use engravekit_visualizer::{PreviewOutput, PreviewRenderer};
use std::path::Path;
use std::time::Duration;

/// Load the config named on the command line, or the platform default if
/// present, or built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => match Config::default_path() {
            Ok(default) => Ok(Config::load_or_default(&default)?),
            Err(e) => {
                tracing::debug!("{}; using built-in defaults", e);
                Ok(Config::default())
            }
        },
    }
}

/// Generate a program from a text field record and write it to `output`
pub fn generate(config: &Config, fields: &Path, output: &Path) -> Result<MotionProgram> {
    let record = TextFieldRecord::load(fields)?;
    let generator = ToolpathGenerator::new(config.engraving.clone())?;
    let program = generator.generate(&record);
    program
        .save(output)
        .with_context(|| format!("Failed to write program {}", output.display()))?;
    tracing::info!(
        "Wrote {} commands for {} fields to {}",
        program.len(),
        record.present().count(),
        output.display()
    );
    Ok(program)
}

/// Render the canonical and mirrored previews of a program file
pub fn preview(config: &Config, program: &Path, output: &Path) -> Result<PreviewOutput> {
    let renderer = PreviewRenderer::new(config.preview.clone())?;
    Ok(renderer.generate_preview(program, output)?)
}

/// Open the device link and wrap it in a controller.
///
/// Port precedence: `--port`, then the configured port, then discovery.
pub fn open_controller(config: &Config, link: &LinkArgs) -> Result<MachineController> {
    let device = if link.dry_run {
        let settings = engravekit_communication::LinkSettings {
            settle_delay: Duration::ZERO,
            ..config.connection.link_settings()
        };
        tracing::info!("Dry run: using loopback device");
        DeviceLink::from_transport(Box::new(LoopbackPort::new()), &settings)?
    } else {
        let port = match &link.port {
            Some(port) => port.clone(),
            None if config.connection.is_auto() => discover(&candidate_ports())?,
            None => config.connection.port.clone(),
        };
        DeviceLink::connect(&port, &config.connection.link_settings())?
    };
    Ok(MachineController::new(device, config.machine.clone()))
}

/// Stream a program until it finishes; Ctrl-C triggers a safety stop and the
/// session then ends as cancelled
pub async fn run(controller: &MachineController, program: MotionProgram) -> Result<SessionStatus> {
    let mut session = controller.start_execution(program)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut listen_for_interrupt = true;

    loop {
        tokio::select! {
            status = session.wait() => {
                if let Some(e) = session.error() {
                    tracing::error!("Streaming failed: {}", e);
                }
                return Ok(status);
            }
            signal = tokio::signal::ctrl_c(), if listen_for_interrupt => {
                if let Err(e) = signal {
                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                    listen_for_interrupt = false;
                    continue;
                }
                tracing::warn!("Interrupted, issuing safety stop");
                let controller = controller.clone();
                tokio::task::spawn_blocking(move || controller.safety_stop()).await??;
            }
            _ = ticker.tick() => {
                let (sent, total) = session.progress();
                tracing::info!("Progress: {}/{}", sent, total);
            }
        }
    }
}

/// Load a program file and stream it
pub async fn run_file(controller: &MachineController, program: &Path) -> Result<SessionStatus> {
    let program = MotionProgram::load(program)
        .with_context(|| format!("Failed to read program {}", program.display()))?;
    run(controller, program).await
}
