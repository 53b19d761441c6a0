//! General application configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const FORMATS: [&str; 2] = ["json", "raw"];

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Output format used when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

impl GeneralConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if FORMATS.contains(&self.default_format.as_str()) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                field: "general.default_format".into(),
                reason: format!("expected one of {}", FORMATS.join(", ")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let config = GeneralConfig {
            default_format: "table".into(),
        };
        assert!(config.validate().is_err());
    }
}
