use std::path::Path;

use anyhow::Context;
use lab_config::LabConfig;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::output::output;
use crate::scenario::{self, CatalogFile};

/// Handle `labx catalog check`.
pub fn handle_check(file: &Path, all: bool, config: &LabConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let catalog: CatalogFile = scenario::read_file(file)?;
    let service = bootstrap::service(config);
    let created = scenario::load_catalog(&service, &catalog)?;
    tracing::info!(count = created.len(), file = %file.display(), "catalog loaded");

    output(&service.list_definitions(all), flags.format)
}

/// Handle `labx catalog sections`.
pub fn handle_sections(
    file: &Path,
    code: &str,
    config: &LabConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let catalog: CatalogFile = scenario::read_file(file)?;
    let service = bootstrap::service(config);
    scenario::load_catalog(&service, &catalog)?;

    let def = service
        .find_by_code(code)
        .with_context(|| format!("no exam with code {code} in {}", file.display()))?;
    let sections = service.definition_sections(def.id, &config.sections.titles())?;
    output(&sections, flags.format)
}
