//! SalesPulse CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config
//! - `serve`   — Start the HTTP API
//! - `rep`     — Analyze one sales representative
//! - `team`    — Team-wide performance rollup
//! - `trends`  — Monthly or quarterly trend narrative
//! - `doctor`  — Diagnose config, API key and dataset

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "salespulse",
    about = "SalesPulse — LLM-narrated sales performance analytics",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.salespulse/config.toml)
    #[arg(short, long, global = true, env = "SALESPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the dataset CSV path
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Performance analysis for one employee
    Rep {
        /// Employee identifier
        employee_id: i64,
    },

    /// Team-wide performance summary
    Team,

    /// Trend narrative over time
    Trends {
        /// `monthly` or `quaterly`
        time_period: String,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Secrets such as OPENAI_API_KEY may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    let dataset = cli.dataset;

    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Serve { port, host } => {
            let config = commands::load_config(config_path, dataset)?;
            commands::serve::run(config, host, port).await?
        }
        Commands::Rep { employee_id } => {
            let config = commands::load_config(config_path, dataset)?;
            commands::query::rep(config, employee_id).await?
        }
        Commands::Team => {
            let config = commands::load_config(config_path, dataset)?;
            commands::query::team(config).await?
        }
        Commands::Trends { time_period } => {
            let config = commands::load_config(config_path, dataset)?;
            commands::query::trends(config, &time_period).await?
        }
        Commands::Doctor => commands::doctor::run(config_path, dataset).await?,
    }

    Ok(())
}
