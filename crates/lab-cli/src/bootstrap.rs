use std::path::Path;

use anyhow::Context;
use lab_config::LabConfig;
use lab_engine::{EngineSettings, LabService};

/// Load configuration, layering an explicit `--config` file when given.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<LabConfig> {
    match explicit {
        Some(path) => LabConfig::load_from(path)
            .with_context(|| format!("failed to load config file {}", path.display())),
        None => LabConfig::load_with_dotenv().context("failed to load configuration"),
    }
}

pub fn engine_settings(config: &LabConfig) -> EngineSettings {
    EngineSettings {
        max_code_len: config.catalog.max_code_len,
        allow_inactive_children: config.catalog.allow_inactive_children,
    }
}

/// A fresh, empty engine configured from `config`.
pub fn service(config: &LabConfig) -> LabService {
    LabService::new(engine_settings(config))
}
