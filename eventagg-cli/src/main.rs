use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventagg::EngineConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CommandArgs, InputArgs};

#[derive(Parser, Debug)]
#[command(name = "eventagg")]
#[command(about = "eventagg - calendar-bucketed aggregation of monitoring events")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "eventagg.toml", env = "EVENTAGG_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate an event dump
    Run {
        #[command(flatten)]
        command: CommandArgs,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Aggregate an event dump with a command given as query parameters
    Query {
        /// URL-encoded parameters, e.g. "aType=COUNT&aInterval=DAYS&..."
        query: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Print a summary of an XML aggregation result
    Inspect {
        /// XML file to read ("-" for stdin)
        input: PathBuf,
    },

    /// Print the query-parameter encoding of a command
    Params {
        #[command(flatten)]
        command: CommandArgs,

        /// Print a single URL-encoded string instead of JSON
        #[arg(long)]
        query_string: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;

    init_logging(&config);

    match cli.command {
        Commands::Run { command, input } => {
            let command = command.into_command();
            commands::run_aggregation(&command, &input, &config)?;
        }
        Commands::Query { query, input } => {
            let command = eventagg::AggregationCommand::from_query_string(&query)
                .context("Invalid aggregation query")?;
            commands::run_aggregation(&command, &input, &config)?;
        }
        Commands::Inspect { input } => {
            commands::run_inspect(&input)?;
        }
        Commands::Params {
            command,
            query_string,
        } => {
            commands::run_params(&command.into_command(), query_string)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for results.
fn init_logging(config: &EngineConfig) {
    let log_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
