//! # lab-config
//!
//! Layered configuration loading using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LABX_*` prefix, `__` as separator)
//! 2. Project-level `.labx/config.toml`
//! 3. User-level `~/.config/labx/config.toml`
//! 4. Built-in defaults
//!
//! `LABX_CATALOG__MAX_CODE_LEN` maps to `catalog.max_code_len`,
//! `LABX_SECTIONS__UNSECTIONED_LABEL` to `sections.unsectioned_label`, and so on.
//!
//! ```no_run
//! use lab_config::LabConfig;
//!
//! let config = LabConfig::load_with_dotenv().expect("config");
//! println!("codes up to {} chars", config.catalog.max_code_len);
//! ```

mod catalog;
mod error;
mod general;
mod sections;

pub use catalog::CatalogConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use sections::SectionsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = ".labx/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LabConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sections: SectionsConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl LabConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; use [`Self::load_with_dotenv`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of bounds.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading a `.env` file, if one exists.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with an explicit extra TOML file merged above the
    /// project-local file and below the environment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Self::file_layers()
            .merge(Toml::file(path))
            .merge(Self::env_provider());
        Self::from_figment(&figment)
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the full provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        Self::file_layers().merge(Self::env_provider())
    }

    /// Reject values that extract cleanly but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        self.general.validate()
    }

    fn file_layers() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_PATH);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn env_provider() -> Env {
        Env::prefixed("LABX_").split("__")
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("labx").join("config.toml"))
    }
}
