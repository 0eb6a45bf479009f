//! YardWatch CLI - command-line interface to the yard tracking engine.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::alerts::AlertsArgs;
use commands::config::ConfigCommands;
use commands::entities::EntitiesArgs;
use commands::run::RunArgs;
use commands::sensors::SensorCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "yardwatch", version, about = "Track vehicles across a zoned yard")]
struct Cli {
    /// Path to config.ini (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the tracking service until Ctrl+C or the duration elapses
    Run(RunArgs),

    /// List tracked entities, most recently seen first
    Entities(EntitiesArgs),

    /// List alerts, most recent first
    Alerts(AlertsArgs),

    /// Mark an alert resolved
    Resolve {
        /// Alert id (UUID)
        alert_id: String,
    },

    /// Show or change the sensor roster
    Sensors {
        #[command(subcommand)]
        command: Option<SensorCommands>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    // config commands must work even when the file does not parse
    let command = match cli.command {
        Commands::Config { command } => return commands::config::run(cli.config, command),
        other => other,
    };

    let runner = CliRunner::new(cli.config)?;
    match command {
        Commands::Run(args) => commands::run::run(runner, args, cli.verbose),
        Commands::Entities(args) => commands::entities::run(&runner, args),
        Commands::Alerts(args) => commands::alerts::run(&runner, args),
        Commands::Resolve { alert_id } => commands::alerts::resolve(&runner, &alert_id),
        Commands::Sensors { command } => {
            commands::sensors::run(runner, command.unwrap_or(SensorCommands::List))
        }
        Commands::Config { .. } => Ok(()),
    }
}
