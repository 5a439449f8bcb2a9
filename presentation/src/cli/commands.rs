//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use dialogos_domain::PartitionStrategy;
use std::path::PathBuf;

/// Output format for session views and tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    Text,
    /// JSON output
    Json,
}

impl From<OutputFormat> for dialogos_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => dialogos_domain::OutputFormat::Text,
            OutputFormat::Json => dialogos_domain::OutputFormat::Json,
        }
    }
}

/// Host decision for a five-person group
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionArg {
    /// Two sub-sessions of two and three participants
    Split,
    /// One group of five with two observers per round
    Together,
}

impl From<PartitionArg> for PartitionStrategy {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Split => PartitionStrategy::Split,
            PartitionArg::Together => PartitionStrategy::Together,
        }
    }
}

/// CLI arguments for dialogos
#[derive(Parser, Debug)]
#[command(name = "dialogos")]
#[command(author, version, about = "Listening practice sessions with rotating roles")]
#[command(long_about = r#"
Dialogos runs structured listening-practice sessions. Small groups rotate
through speaker, listener, scribe and observer roles across timed rounds,
with a host-controlled phase sequence and a safety pause any active
participant can call.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./dialogos.toml     Project-level config
3. ~/.config/dialogos/config.toml   Global config

Example:
  dialogos rotation --participants 4 --passive-observer
  dialogos simulate --participants 5 --partition split
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (overrides [output] format in the config file)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print who plays which role in every round
    Rotation(RotationArgs),
    /// Run a scripted session against the in-memory store
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
pub struct RotationArgs {
    /// Number of rotating participants (2 to 5)
    #[arg(short, long, default_value_t = 3)]
    pub participants: usize,

    /// Add a permanent observer who never rotates
    #[arg(long)]
    pub passive_observer: bool,

    /// Keep a five-person group together instead of splitting it
    #[arg(long)]
    pub together: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of rotating participants, host included (2 to 5)
    #[arg(short, long, default_value_t = 3)]
    pub participants: usize,

    /// Partition decision for five participants
    #[arg(long, value_enum, default_value = "split")]
    pub partition: PartitionArg,

    /// Add a permanent observer who never rotates
    #[arg(long)]
    pub passive_observer: bool,

    /// Round length in minutes (defaults to the configured value)
    #[arg(long, value_name = "MINUTES")]
    pub round_minutes: Option<u32>,
}
