use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use lab_core::enums::DataType;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Catalog files.
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
    /// Evaluate one value against a reference expression.
    Range(RangeArgs),
    /// Replay a request scenario and print the resulting views.
    Request(RequestArgs),
}

/// Catalog file commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CatalogCommands {
    /// Load a catalog file into a fresh engine and print the stored catalog.
    Check {
        /// TOML or JSON catalog file
        file: PathBuf,
        /// Include deactivated definitions
        #[arg(long)]
        all: bool,
    },
    /// Show one definition's fields grouped into titled sections.
    Sections {
        /// TOML or JSON catalog file
        file: PathBuf,
        /// Definition code
        code: String,
    },
}

#[derive(Clone, Debug, Args)]
pub struct RangeArgs {
    /// Captured value as typed by a technician
    pub value: String,
    /// Reference expression, e.g. 70-110, <200, negativo
    pub reference: String,
    /// Data type the value is parsed as
    #[arg(long, value_enum, default_value = "number")]
    pub data_type: DataTypeArg,
}

#[derive(Clone, Debug, Args)]
pub struct RequestArgs {
    /// TOML or JSON scenario file (catalog plus requests)
    pub file: PathBuf,
}

/// CLI spelling of [`DataType`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DataTypeArg {
    Text,
    Number,
    Select,
    Boolean,
    Longtext,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Text => Self::Text,
            DataTypeArg::Number => Self::Number,
            DataTypeArg::Select => Self::Select,
            DataTypeArg::Boolean => Self::Boolean,
            DataTypeArg::Longtext => Self::Longtext,
        }
    }
}
