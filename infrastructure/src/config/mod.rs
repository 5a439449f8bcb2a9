//! Configuration file loading for dialogos
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./dialogos.toml` or `./.dialogos.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/dialogos/config.toml`
//! 4. Fallback: `~/.config/dialogos/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileLoggingConfig, FileOutputConfig, FileSafetyConfig, FileSessionConfig,
};
pub use loader::ConfigLoader;
