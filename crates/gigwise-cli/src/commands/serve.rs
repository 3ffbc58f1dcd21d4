//! Server command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use gigwise_core::{PolicyConfig, SavingsStrategy};
use gigwise_server::ServerConfig;

/// Build the server configuration from flags, falling back to environment
/// variables and then defaults
pub fn server_config(
    mut policy: PolicyConfig,
    model_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<ServerConfig> {
    let defaults = ServerConfig::default();

    // Parse allowed origins from environment (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("GIGWISE_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let model_dir = model_dir
        .or_else(|| env_path("GIGWISE_MODEL_DIR"))
        .or(defaults.model_dir);
    let data_dir = data_dir
        .or_else(|| env_path("GIGWISE_DATA_DIR"))
        .unwrap_or(defaults.data_dir);

    let seed = match seed {
        Some(seed) => Some(seed),
        None => match env_value("GIGWISE_SEED") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("Invalid GIGWISE_SEED: {}", raw))?,
            ),
            None => None,
        },
    };

    if let Some(raw) = env_value("GIGWISE_SAVINGS_STRATEGY") {
        policy.savings.strategy = raw
            .parse::<SavingsStrategy>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    Ok(ServerConfig {
        allowed_origins,
        model_dir,
        data_dir,
        seed,
        policy,
    })
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_value(name).map(PathBuf::from)
}

pub async fn cmd_serve(host: &str, port: u16, config: ServerConfig) -> Result<()> {
    println!("🚀 Starting Gigwise web server...");
    println!("   Listening: http://{}:{}", host, port);
    match &config.model_dir {
        Some(dir) => println!("   Models: {}", dir.display()),
        None => println!("   Models: in memory only"),
    }
    println!("   Sample data: {}", config.data_dir.display());
    println!("   Savings strategy: {}", config.policy.savings.strategy);
    if let Some(seed) = config.seed {
        println!("   Random seed: {}", seed);
    }
    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (GIGWISE_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    gigwise_server::serve_with_config(host, port, config).await?;

    Ok(())
}
