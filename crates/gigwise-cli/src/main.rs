//! Gigwise CLI - Budgeting insights for gig workers
//!
//! Usage:
//!   gigwise serve --port 5000          Start web server
//!   gigwise train --data FILE          Fit and persist models
//!   gigwise forecast --data FILE       Print the income forecast
//!   gigwise models                     List persisted models

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let policy = commands::load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            model_dir,
            data_dir,
            seed,
        } => {
            let config = commands::server_config(policy, model_dir, data_dir, seed)?;
            commands::cmd_serve(&host, port, config).await
        }
        Commands::Train {
            data,
            user,
            model_dir,
        } => commands::cmd_train(&data, user.as_deref(), &model_dir, &policy),
        Commands::Forecast {
            data,
            seed,
            model_dir,
            json,
        } => commands::cmd_forecast(&data, seed, model_dir.as_deref(), json, &policy),
        Commands::Models { model_dir } => commands::cmd_models(&model_dir),
    }
}
