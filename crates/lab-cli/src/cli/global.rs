use clap::ValueEnum;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Compact single-line JSON.
    Raw,
}

impl OutputFormat {
    /// Parse the configured default. Unknown values fall back to JSON.
    pub fn from_config(value: &str) -> Self {
        Self::from_str(value, true).unwrap_or(Self::Json)
    }
}

/// Global flags resolved against configuration.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}
