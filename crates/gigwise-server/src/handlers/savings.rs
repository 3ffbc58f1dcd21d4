//! Savings plan handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{AppError, AppState};
use gigwise_core::insights::{plan_savings, SavingsPlan};
use gigwise_core::{ExpenseRecord, IncomeRecord};

/// Request body carrying both income and expenses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    #[serde(default)]
    pub income_data: Vec<IncomeRecord>,
    #[serde(default)]
    pub expense_data: Vec<ExpenseRecord>,
}

#[derive(Debug, Serialize)]
pub struct SavingsResponse {
    pub savings_plan: SavingsPlan,
}

/// POST /api/savings-plan - Savings rate, target and emergency fund
pub async fn savings_plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> Result<Json<SavingsResponse>, AppError> {
    let request = json_body(payload)?;
    let savings_plan = plan_savings(
        &request.income_data,
        &request.expense_data,
        &state.config.policy.savings,
    )?;
    Ok(Json(SavingsResponse { savings_plan }))
}
