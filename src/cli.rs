//! Command-line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "engravekit")]
#[command(version)]
#[command(about = "Engrave text on a small CNC machine: generate, preview and stream G-code", long_about = None)]
pub struct Cli {
    /// Path to a config file (.toml or .json)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Device selection shared by every command that talks to the machine
#[derive(Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Serial port to use instead of the configured or discovered one
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,

    /// Talk to an in-memory device that acknowledges everything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a G-code program from a JSON object of text fields
    Generate {
        /// JSON file, e.g. {"name": "Ada Lovelace", "phone": "555 0100"}
        fields: PathBuf,

        /// Output program path
        #[arg(short, long, value_name = "FILE", default_value = "card.nc")]
        output: PathBuf,
    },

    /// Render a program to a PNG preview and its mirrored twin
    Preview {
        /// Program to render
        program: PathBuf,

        /// Output image path; the mirror is written beside it
        #[arg(short, long, value_name = "FILE", default_value = "card_preview.png")]
        output: PathBuf,
    },

    /// List serial ports that look like CNC controllers
    Ports,

    /// Stream a program to the machine; Ctrl-C triggers a safety stop
    Run {
        /// Program to stream
        program: PathBuf,

        #[command(flatten)]
        link: LinkArgs,
    },

    /// Relative single-axis move
    Jog {
        /// X, Y or Z
        axis: String,

        /// Distance in mm
        increment: f64,

        /// + or -
        #[arg(allow_hyphen_values = true)]
        direction: String,

        #[command(flatten)]
        link: LinkArgs,
    },

    /// Tool and origin control: start, stop, setOrigin
    Control {
        /// Command name
        command: String,

        #[command(flatten)]
        link: LinkArgs,
    },

    /// Stop the tool and retract to the origin at safe height
    SafetyStop {
        #[command(flatten)]
        link: LinkArgs,
    },
}
