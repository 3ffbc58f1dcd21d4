//! Expense analysis handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{json_body, model_key, UserId};
use crate::{AppError, AppState};
use gigwise_core::insights::{analyze_expenses as analyze, ExpenseAnalysis};
use gigwise_core::ExpenseRecord;

/// Request body for expense analysis
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    #[serde(default)]
    pub expense_data: Vec<ExpenseRecord>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub analysis: ExpenseAnalysis,
}

/// POST /api/analyze-expenses - Category breakdown and reduction suggestions
pub async fn analyze_expenses(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let request = json_body(payload)?;
    let key = model_key(request.user_id.as_ref())?;
    let policy = &state.config.policy.expenses;

    let mut analysis =
        state.with_random(|rng| analyze(&request.expense_data, policy, rng))?;

    // Amount tiers need enough records to cluster
    if let Some(model) = state
        .registry
        .clusterer(&key, &request.expense_data, policy)?
    {
        analysis = analysis.with_clusters(model.summarize(&request.expense_data));
    } else {
        debug!(
            records = request.expense_data.len(),
            "Too few expenses for amount clusters"
        );
    }

    Ok(Json(ExpenseResponse { analysis }))
}
