//! CLI entrypoint for dialogos
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod simulate;

use anyhow::{Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use dialogos_application::SessionStoreGateway;
use dialogos_domain::{DomainError, RotationPolicy, Severity};
use dialogos_infrastructure::{
    AutoAdvanceScheduler, ConfigLoader, InMemorySessionStore, JsonlSessionLogger,
};
use dialogos_presentation::{
    Cli, Command, OutputConfig, RotationArgs, RotationTable, formatter_for,
};
use simulate::Simulation;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting dialogos");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => error!("{}", issue.message),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        bail!("Configuration has {} error(s); see the log above", errors);
    }

    let output = OutputConfig::new(config.output.format, config.output.color)
        .with_cli_override(cli.output);
    output.apply_color();
    let formatter = formatter_for(output.format);

    match cli.command {
        Some(Command::Rotation(args)) => {
            let table = RotationTable::build(rotation_policy(&args)?, args.passive_observer);
            println!("{}", formatter.format_rotation(&table));
        }
        Some(Command::Simulate(args)) => {
            // === Dependency Injection ===
            let mut store = InMemorySessionStore::new();
            if let Some(path) = config.logging.audit_log_path() {
                match JsonlSessionLogger::new(&path) {
                    Some(logger) => {
                        info!("Writing session audit log to {}", logger.path().display());
                        store = store.with_logger(Arc::new(logger));
                    }
                    None => warn!("Audit log disabled: {} is not writable", path.display()),
                }
            }
            let store: Arc<dyn SessionStoreGateway> = Arc::new(store);

            let policy = config.to_session_policy();
            let scheduler =
                AutoAdvanceScheduler::new(Arc::clone(&store), policy.transition_auto_advance);

            let simulation = Simulation::new(store, scheduler, policy, formatter);
            simulation.run(&args).await?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn rotation_policy(args: &RotationArgs) -> Result<RotationPolicy> {
    if args.together {
        if args.participants != 5 {
            bail!("--together only applies to five participants");
        }
        return Ok(RotationPolicy::FiveTogether);
    }

    match RotationPolicy::for_active_count(args.participants) {
        Ok(policy) => Ok(policy),
        Err(DomainError::GroupPartitionRequired) => bail!(
            "Five participants need a partition decision: pass --together, \
             or print the split groups with --participants 2 and --participants 3"
        ),
        Err(e) => Err(e.into()),
    }
}
