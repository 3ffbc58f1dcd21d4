//! Forecast command implementation

use std::path::Path;

use anyhow::{Context, Result};
use gigwise_core::{
    default_source, project_income, Dataset, IncomeForecast, ModelKey, ModelRegistry, ModelStore,
    PolicyConfig,
};

/// Forecast income for a dataset, reusing a persisted generic model from
/// `model_dir` when one exists
pub fn cmd_forecast(
    data: &Path,
    seed: Option<u64>,
    model_dir: Option<&Path>,
    json: bool,
    policy: &PolicyConfig,
) -> Result<()> {
    let forecast = build_forecast(data, seed, model_dir, policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }

    println!("📈 Income forecast ({} working days)", forecast.daily.len());
    println!();
    println!("   {:<10} {:>12}", "Month", "Predicted");
    for month in &forecast.monthly {
        println!("   {:<10} {:>12.2}", month.month, month.predicted_amount);
    }
    println!("   {:<10} {:>12.2}", "Total", forecast.total());

    Ok(())
}

pub fn build_forecast(
    data: &Path,
    seed: Option<u64>,
    model_dir: Option<&Path>,
    policy: &PolicyConfig,
) -> Result<IncomeForecast> {
    let dataset = Dataset::load(data)
        .with_context(|| format!("Failed to load dataset {}", data.display()))?;

    let registry = match model_dir {
        Some(dir) => ModelRegistry::new(ModelStore::new(dir)),
        None => ModelRegistry::in_memory(),
    };
    let model = registry.forecaster(
        &ModelKey::Generic,
        &dataset.income_data,
        &policy.forecast.boosting,
    )?;

    let mut rng = default_source(seed);
    let forecast = project_income(model.as_ref(), &dataset.income_data, &policy.forecast, &mut rng)?;
    Ok(forecast)
}
