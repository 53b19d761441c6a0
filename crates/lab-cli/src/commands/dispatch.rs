use lab_config::LabConfig;

use crate::cli::{CatalogCommands, Commands, GlobalFlags};

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error when the selected command fails.
pub fn dispatch(command: Commands, config: &LabConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Catalog { action } => match action {
            CatalogCommands::Check { file, all } => super::catalog::handle_check(&file, all, config, flags),
            CatalogCommands::Sections { file, code } => {
                super::catalog::handle_sections(&file, &code, config, flags)
            }
        },
        Commands::Range(args) => super::range::handle(&args, flags),
        Commands::Request(args) => super::request::handle(&args, config, flags),
    }
}
