use clap::Parser;
use engravekit::cli::{Cli, Command};
use engravekit::{commands, init_logging, SessionStatus, BUILD_DATE, VERSION};
use engravekit_communication::{candidate_ports, discover, list_ports};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::debug!("engravekit {} (built {})", VERSION, BUILD_DATE);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Generate { fields, output } => {
            let program = commands::generate(&config, &fields, &output)?;
            println!("{} ({} commands)", output.display(), program.len());
        }
        Command::Preview { program, output } => {
            let written = commands::preview(&config, &program, &output)?;
            println!("{}", written.canonical.display());
            println!("{}", written.mirrored.display());
        }
        Command::Ports => {
            for port in list_ports()? {
                println!("{}\t{}", port.port_name, port.description);
            }
            match discover(&candidate_ports()) {
                Ok(port) => println!("discovered: {}", port),
                Err(e) => println!("discovered: none ({})", e),
            }
        }
        Command::Run { program, link } => {
            let controller = commands::open_controller(&config, &link)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let status = runtime.block_on(commands::run_file(&controller, &program))?;
            println!("{}", status);
            return Ok(match status {
                SessionStatus::Completed => ExitCode::SUCCESS,
                SessionStatus::Cancelled => ExitCode::from(130),
                SessionStatus::Failed | SessionStatus::Streaming => ExitCode::FAILURE,
            });
        }
        Command::Jog {
            axis,
            increment,
            direction,
            link,
        } => {
            let controller = commands::open_controller(&config, &link)?;
            println!("{}", controller.jog_move_str(&axis, increment, &direction)?);
        }
        Command::Control { command, link } => {
            let controller = commands::open_controller(&config, &link)?;
            println!("{}", controller.control_str(&command)?);
        }
        Command::SafetyStop { link } => {
            let controller = commands::open_controller(&config, &link)?;
            controller.safety_stop()?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
