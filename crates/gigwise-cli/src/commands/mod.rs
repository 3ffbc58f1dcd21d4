//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `forecast` - Print an income forecast for a dataset
//! - `models` - List persisted model files
//! - `serve` - Web server command and its environment configuration
//! - `train` - Fit and persist models from a dataset

pub mod forecast;
pub mod models;
pub mod serve;
pub mod train;

// Re-export command functions for main.rs
pub use forecast::*;
pub use models::*;
pub use serve::*;
pub use train::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gigwise_core::PolicyConfig;

/// Load the policy from `--policy`, then `GIGWISE_POLICY`, then the defaults
pub fn load_policy(flag: Option<&Path>) -> Result<PolicyConfig> {
    let from_env = std::env::var_os("GIGWISE_POLICY")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let path = flag.map(Path::to_path_buf).or(from_env);

    PolicyConfig::load(path.as_deref()).context("Failed to load policy")
}

/// Human-readable age of a timestamp, e.g. `3h ago`
pub fn format_age(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(when);
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}
