//! Income forecast handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{json_body, model_key, UserId};
use crate::{AppError, AppState};
use gigwise_core::{project_income, IncomeForecast, IncomeRecord};

/// Request body for income forecasts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    #[serde(default)]
    pub income_data: Vec<IncomeRecord>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub forecast: IncomeForecast,
}

/// POST /api/forecast-income - Project income over the next 90 days
pub async fn forecast_income(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>, AppError> {
    let request = json_body(payload)?;
    if request.income_data.is_empty() {
        return Err(AppError::bad_request("No income data provided"));
    }
    let key = model_key(request.user_id.as_ref())?;

    let policy = &state.config.policy.forecast;
    let model = state
        .registry
        .forecaster(&key, &request.income_data, &policy.boosting)?;

    let forecast = state.with_random(|rng| {
        project_income(model.as_ref(), &request.income_data, policy, rng)
    })?;

    info!(
        key = %key,
        records = request.income_data.len(),
        days = forecast.daily.len(),
        "Income forecast served"
    );

    Ok(Json(ForecastResponse { forecast }))
}
