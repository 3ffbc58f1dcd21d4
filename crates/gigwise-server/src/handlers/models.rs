//! Model registry handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState};
use gigwise_core::StoredModel;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded: usize,
}

/// GET /api/models - Persisted model files
pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredModel>>, AppError> {
    let models = match state.registry.store() {
        Some(store) => store.list()?,
        None => Vec::new(),
    };
    Ok(Json(models))
}

/// POST /api/models/reload - Drop cached models and reload from the store
pub async fn reload_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, AppError> {
    let loaded = state.registry.reload()?;
    info!(loaded, "Models reloaded");
    Ok(Json(ReloadResponse { loaded }))
}
