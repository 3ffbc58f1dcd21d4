//! Tax suggestion handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::{AppError, AppState};
use gigwise_core::insights::{suggest_tax_savings, TaxAnalysis, TaxSuggestion};
use gigwise_core::IncomeRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    #[serde(default)]
    pub income_data: Vec<IncomeRecord>,
}

/// Suggestions are also listed at the top level for older clients
#[derive(Debug, Serialize)]
pub struct TaxResponse {
    pub tax_analysis: TaxAnalysis,
    pub tax_suggestions: Vec<TaxSuggestion>,
}

/// POST /api/tax-suggestions - Projected tax and deduction suggestions
pub async fn tax_suggestions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TaxRequest>, JsonRejection>,
) -> Result<Json<TaxResponse>, AppError> {
    let request = json_body(payload)?;
    let tax_analysis = suggest_tax_savings(&request.income_data, &state.config.policy.tax)?;
    let tax_suggestions = tax_analysis.suggestions.clone();
    Ok(Json(TaxResponse {
        tax_analysis,
        tax_suggestions,
    }))
}
