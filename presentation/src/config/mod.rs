//! Presentation-level configuration
//!
//! Resolved output settings: config file values with CLI overrides applied.

use crate::cli::commands::OutputFormat as CliOutputFormat;
use dialogos_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

impl OutputConfig {
    pub fn new(format: Option<OutputFormat>, color: bool) -> Self {
        Self {
            format: format.unwrap_or_default(),
            color,
        }
    }

    /// Apply the `--output` flag over the configured format.
    pub fn with_cli_override(mut self, format: Option<CliOutputFormat>) -> Self {
        if let Some(format) = format {
            self.format = format.into();
        }
        self
    }

    /// Set the global color override for this process.
    ///
    /// JSON output is never colored.
    pub fn apply_color(&self) {
        colored::control::set_override(self.color && self.format == OutputFormat::Text);
    }
}
