//! Model listing command

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use gigwise_core::{ModelKey, ModelStore};

use super::format_age;

pub fn cmd_models(model_dir: &Path) -> Result<()> {
    let store = ModelStore::new(model_dir);
    let models = store
        .list()
        .with_context(|| format!("Failed to list models in {}", model_dir.display()))?;

    if models.is_empty() {
        println!("No models in {}", model_dir.display());
        println!("Train some with: gigwise train --data dataset.json");
        return Ok(());
    }

    println!("📦 Models in {}", model_dir.display());
    println!();
    println!(
        "   {:<18} {:<12} {:>9}  {}",
        "Kind", "User", "Size", "Updated"
    );

    let now = Utc::now();
    for model in &models {
        let user = match &model.key {
            ModelKey::Generic => "-".to_string(),
            ModelKey::User(id) => id.clone(),
        };
        let updated = model
            .modified
            .map(|m| format_age(m, now))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "   {:<18} {:<12} {:>7} B  {}",
            model.kind.as_str(),
            user,
            model.size,
            updated
        );
    }

    Ok(())
}
