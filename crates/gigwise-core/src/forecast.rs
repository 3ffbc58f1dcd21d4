//! Income forecasting
//!
//! Fits a gradient boosted regressor on (weekday, day of month, month) →
//! amount and projects it over the days following the latest known
//! income date. Gig income does not arrive every day, so only a random
//! share of weekdays is kept in the projection.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::features::{derive_features, CalendarFeatures};
use crate::ml::{BoostingParams, GradientBoostingRegressor};
use crate::models::{
    parse_dates, round2, DailyForecast, IncomeForecast, IncomeRecord, MonthlyForecast,
    PREDICTED_INCOME_LABEL,
};
use crate::policy::ForecastPolicy;
use crate::random::RandomSource;

/// Anything that can estimate the income for a calendar day
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &CalendarFeatures) -> Result<f64>;
}

/// Fitted income model plus a little provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeForecaster {
    model: GradientBoostingRegressor,
    /// Number of records the model was fitted on
    pub samples: usize,
    pub trained_at: DateTime<Utc>,
}

impl IncomeForecaster {
    /// Fit on income records. Needs at least one record; every record
    /// must carry a valid date.
    pub fn fit(records: &[IncomeRecord], params: BoostingParams) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::validation("No income data provided"));
        }

        let features = derive_features(records)?;
        let x: Vec<Vec<f64>> = features.iter().map(|f| f.to_vector().to_vec()).collect();
        let y: Vec<f64> = records.iter().map(|r| r.amount).collect();

        let model = GradientBoostingRegressor::fit(&x, &y, params)?;
        debug!(
            samples = records.len(),
            trees = model.n_trees(),
            "Fitted income forecaster"
        );

        Ok(Self {
            model,
            samples: records.len(),
            trained_at: Utc::now(),
        })
    }
}

impl Predictor for IncomeForecaster {
    fn predict(&self, features: &CalendarFeatures) -> Result<f64> {
        self.model.predict(&features.to_vector())
    }
}

/// Latest date among the income records
pub fn last_income_date(records: &[IncomeRecord]) -> Result<NaiveDate> {
    parse_dates(records)?
        .into_iter()
        .max()
        .ok_or_else(|| Error::validation("No income data provided"))
}

/// Project `predictor` over the forecast horizon after the latest income date.
///
/// A day is kept only when it is a weekday and a uniform draw exceeds the
/// retention threshold. Kept amounts are clamped at zero and rounded to
/// cents. A day whose prediction fails is logged and skipped.
pub fn project_income(
    predictor: &dyn Predictor,
    records: &[IncomeRecord],
    policy: &ForecastPolicy,
    rng: &mut dyn RandomSource,
) -> Result<IncomeForecast> {
    let last_date = last_income_date(records)?;
    let mut daily = Vec::new();

    for offset in 1..=i64::from(policy.horizon_days) {
        let date = last_date
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| {
                Error::validation(format!("Income date is out of range: {}", last_date))
            })?;
        let features = CalendarFeatures::from_date(date);

        let predicted = match predictor.predict(&features) {
            Ok(value) => value,
            Err(e) => {
                warn!(date = %date, error = %e, "Prediction failed, skipping day");
                continue;
            }
        };

        if features.is_weekday() && rng.uniform() > policy.retention_threshold {
            daily.push(DailyForecast {
                date,
                amount: round2(predicted.max(0.0)),
                source: PREDICTED_INCOME_LABEL.to_string(),
            });
        }
    }

    let monthly = aggregate_monthly(&daily);
    debug!(
        last_date = %last_date,
        days = daily.len(),
        months = monthly.len(),
        "Projected income"
    );

    Ok(IncomeForecast { daily, monthly })
}

/// Sum daily forecasts per `YYYY-MM`, in order of first appearance
pub fn aggregate_monthly(daily: &[DailyForecast]) -> Vec<MonthlyForecast> {
    let mut monthly: Vec<MonthlyForecast> = Vec::new();

    for day in daily {
        let month = day.date.format("%Y-%m").to_string();
        match monthly.iter_mut().find(|m| m.month == month) {
            Some(bucket) => bucket.predicted_amount += day.amount,
            None => monthly.push(MonthlyForecast {
                month,
                predicted_amount: day.amount,
            }),
        }
    }

    for bucket in &mut monthly {
        bucket.predicted_amount = round2(bucket.predicted_amount);
    }
    monthly
}
