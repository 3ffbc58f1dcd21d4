//! Training command implementation

use std::path::Path;

use anyhow::{Context, Result};
use gigwise_core::{Dataset, ModelKey, ModelKind, ModelRegistry, ModelStore, PolicyConfig};

/// Fit the income forecaster and expense clusters for a dataset and
/// persist them in `model_dir`
pub fn cmd_train(
    data: &Path,
    user: Option<&str>,
    model_dir: &Path,
    policy: &PolicyConfig,
) -> Result<()> {
    let dataset = Dataset::load(data)
        .with_context(|| format!("Failed to load dataset {}", data.display()))?;
    let key = ModelKey::for_user(user)?;

    println!("🧠 Training models from {}...", data.display());
    println!(
        "   Records: {} income, {} expense",
        dataset.income_data.len(),
        dataset.expense_data.len()
    );

    let store = ModelStore::new(model_dir);
    let registry = ModelRegistry::new(store.clone());

    let forecaster = registry
        .retrain_forecaster(&key, &dataset.income_data, &policy.forecast.boosting)
        .context("Failed to train income forecaster")?;
    println!(
        "   ✓ Income forecaster ({} samples) → {}",
        forecaster.samples,
        store
            .path_for(ModelKind::IncomeForecaster, &key)
            .display()
    );

    match registry
        .retrain_clusterer(&key, &dataset.expense_data, &policy.expenses)
        .context("Failed to train expense clusters")?
    {
        Some(clusters) => println!(
            "   ✓ Expense clusters ({} tiers) → {}",
            clusters.k(),
            store.path_for(ModelKind::ExpenseAnalyzer, &key).display()
        ),
        None => println!(
            "   - Expense clusters skipped (need at least {} expenses)",
            policy.expenses.min_cluster_records
        ),
    }

    println!("✅ Training complete");
    Ok(())
}
