//! Low-income preparation handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use super::{json_body, BudgetRequest};
use crate::{AppError, AppState};
use gigwise_core::insights::{prepare_for_low_income, LowIncomePreparation};

#[derive(Debug, Serialize)]
pub struct LowIncomeResponse {
    pub low_income_preparation: LowIncomePreparation,
}

/// POST /api/low-income-preparation - Low months, buffer and strategies
pub async fn low_income_preparation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> Result<Json<LowIncomeResponse>, AppError> {
    let request = json_body(payload)?;
    let low_income_preparation = prepare_for_low_income(
        &request.income_data,
        &request.expense_data,
        &state.config.policy.low_income,
    )?;
    Ok(Json(LowIncomeResponse {
        low_income_preparation,
    }))
}
