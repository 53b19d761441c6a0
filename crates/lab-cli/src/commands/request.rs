use lab_config::LabConfig;
use lab_core::responses::RequestView;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::RequestArgs;
use crate::output::output;
use crate::scenario::{self, ScenarioFile};

/// Handle `labx request`.
pub fn handle(args: &RequestArgs, config: &LabConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let file: ScenarioFile = scenario::read_file(&args.file)?;
    let views = replay(&file, config)?;
    output(&views, flags.format)
}

/// Replay a scenario into a fresh engine and render each request.
///
/// # Errors
///
/// Fails on the first catalog entry, order, or capture the engine rejects.
pub fn replay(file: &ScenarioFile, config: &LabConfig) -> anyhow::Result<Vec<RequestView>> {
    let service = bootstrap::service(config);
    scenario::load_catalog(&service, &file.catalog)?;
    let requests = scenario::replay_requests(&service, &file.requests)?;

    let titles = config.sections.titles();
    requests
        .into_iter()
        .map(|id| service.render_request(id, &titles).map_err(anyhow::Error::from))
        .collect()
}
