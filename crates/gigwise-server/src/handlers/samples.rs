//! Sample dataset handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use gigwise_core::Dataset;

/// Query parameters for sample data
#[derive(Debug, Deserialize)]
pub struct TestDataQuery {
    /// Gig category, e.g. `Food Delivery` (any dataset when omitted)
    pub category: Option<String>,
}

/// GET /api/test-data - Sample dataset for a gig category
pub async fn get_test_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TestDataQuery>,
) -> Result<Json<Dataset>, AppError> {
    let dataset = state.samples.find(params.category.as_deref())?;
    Ok(Json(dataset))
}
