//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gigwise - Budgeting insights for gig workers
#[derive(Parser)]
#[command(name = "gigwise")]
#[command(about = "Income forecasts and budgeting insights for gig workers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Policy override file (TOML)
    ///
    /// Falls back to GIGWISE_POLICY, then the user data directory,
    /// then the policy compiled into the binary.
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory for persisted models (default: models, or GIGWISE_MODEL_DIR)
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Directory with user_<n>_data.json sample files (default: data, or GIGWISE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Seed the random source for reproducible responses (or GIGWISE_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Fit and persist the income forecaster and expense clusters
    Train {
        /// Dataset file (JSON with incomeData/expenseData, or CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Train per-user models for this user id
        #[arg(short, long)]
        user: Option<String>,

        /// Directory for persisted models
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },

    /// Print the 90-day income forecast for a dataset
    Forecast {
        /// Dataset file (JSON with incomeData/expenseData, or CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Seed the random source for a reproducible forecast
        #[arg(long)]
        seed: Option<u64>,

        /// Use a persisted model from this directory when one exists
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List persisted model files
    Models {
        /// Directory for persisted models
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },
}
