//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod expenses;
pub mod forecast;
pub mod health;
pub mod low_income;
pub mod models;
pub mod samples;
pub mod savings;
pub mod tax;

// Re-export all handlers for use in router
pub use expenses::*;
pub use forecast::*;
pub use health::*;
pub use low_income::*;
pub use models::*;
pub use samples::*;
pub use savings::*;
pub use tax::*;

use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;

use crate::AppError;
use gigwise_core::ModelKey;

/// `userId` as sent by clients: either a string or a bare number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(u64),
    Text(String),
}

impl UserId {
    fn as_text(&self) -> String {
        match self {
            UserId::Number(n) => n.to_string(),
            UserId::Text(s) => s.clone(),
        }
    }
}

/// Registry key for an optional `userId` (generic model when absent)
pub(crate) fn model_key(user_id: Option<&UserId>) -> Result<ModelKey, AppError> {
    let text = user_id.map(UserId::as_text);
    Ok(ModelKey::for_user(text.as_deref())?)
}

/// Unwrap a JSON body, reporting malformed input as a 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(AppError::bad_request(&rejection.body_text())),
    }
}
