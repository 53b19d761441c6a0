use std::path::PathBuf;

use clap::Parser;
use lab_config::LabConfig;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{CatalogCommands, Commands};

/// Top-level CLI parser for the `labx` binary.
#[derive(Debug, Parser)]
#[command(name = "labx", version, about = "labx - exam catalog and result engine toolbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw (defaults to general.default_format)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra configuration file layered over the project and user files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve global flags, filling gaps from configuration.
    #[must_use]
    pub fn global_flags(&self, config: &LabConfig) -> GlobalFlags {
        GlobalFlags {
            format: self
                .format
                .unwrap_or_else(|| OutputFormat::from_config(&config.general.default_format)),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
