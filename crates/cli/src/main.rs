//! maildraft CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: write a starter config file
//! - `serve`: start the public HTTP gateway
//! - `orchestrator`: start the standalone orchestrator endpoint
//! - `draft`: draft one reply from the terminal
//! - `doctor`: diagnose configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use maildraft_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "maildraft",
    about = "maildraft — knowledge-grounded customer service email drafts",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.maildraft/config.toml
    #[arg(short, long, global = true, env = "MAILDRAFT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Onboard,

    /// Start the public HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Forward drafts to a remote orchestrator instead of drafting in-process
        #[arg(long)]
        upstream: Option<String>,
    },

    /// Start the standalone orchestrator endpoint
    Orchestrator {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Draft a single reply and print it
    Draft {
        /// The customer's question
        question: String,

        /// Model identifier (see `GET /models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Session id echoed back in the output
        #[arg(short, long)]
        session: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration
    Doctor,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Serve { port, upstream } => {
            commands::serve::run(load_config(config_path)?, port, upstream).await?
        }
        Commands::Orchestrator { port } => {
            commands::orchestrator::run(load_config(config_path)?, port).await?
        }
        Commands::Draft {
            question,
            model,
            session,
            json,
        } => commands::draft::run(load_config(config_path)?, question, model, session, json).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
