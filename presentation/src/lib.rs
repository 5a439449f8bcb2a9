//! Presentation layer for dialogos
//!
//! This crate contains CLI definitions and output formatters for
//! session views and rotation tables.

pub mod cli;
pub mod config;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, PartitionArg, RotationArgs, SimulateArgs};
pub use config::OutputConfig;
pub use output::console::ConsoleFormatter;
pub use output::formatter::{OutputFormatter, formatter_for};
pub use output::json::JsonFormatter;
pub use output::rotation_table::{RotationTable, SeatRow};
