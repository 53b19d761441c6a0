//! Catalog authoring limits.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_max_code_len() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Maximum length of a definition code, in characters.
    #[serde(default = "default_max_code_len")]
    pub max_code_len: usize,

    /// Whether a composite may reference a deactivated child.
    #[serde(default)]
    pub allow_inactive_children: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_code_len: default_max_code_len(),
            allow_inactive_children: false,
        }
    }
}

impl CatalogConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_code_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.max_code_len".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
