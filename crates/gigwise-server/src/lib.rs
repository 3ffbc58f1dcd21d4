//! Gigwise Web Server
//!
//! Axum-based REST API serving budgeting insights for gig workers.
//!
//! - Income forecasting with per-user models
//! - Expense, savings, tax and low-income insights
//! - Sample datasets for trying the API out
//! - Restrictive CORS policy and sanitized error responses

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use gigwise_core::{
    default_source, ModelRegistry, ModelStore, PolicyConfig, RandomSource, SampleLibrary,
};

mod handlers;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Directory for persisted models (`None` keeps models in memory only)
    pub model_dir: Option<PathBuf>,
    /// Directory holding `user_<n>_data.json` sample datasets
    pub data_dir: PathBuf,
    /// Seed for the random source; unseeded draws from OS entropy
    pub seed: Option<u64>,
    pub policy: PolicyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            model_dir: Some(PathBuf::from("models")),
            data_dir: PathBuf::from("data"),
            seed: None,
            policy: PolicyConfig::embedded(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub registry: ModelRegistry,
    pub samples: SampleLibrary,
    /// Draws for the workday filter and reduction suggestions
    pub rng: Mutex<Box<dyn RandomSource>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let rng: Box<dyn RandomSource> = Box::new(default_source(config.seed));
        Self::with_rng(config, rng)
    }

    /// State with an explicit random source (stubbed in tests)
    pub fn with_rng(config: ServerConfig, rng: Box<dyn RandomSource>) -> Self {
        let registry = match &config.model_dir {
            Some(dir) => ModelRegistry::new(ModelStore::new(dir)),
            None => ModelRegistry::in_memory(),
        };
        let samples = SampleLibrary::new(&config.data_dir);
        Self {
            config,
            registry,
            samples,
            rng: Mutex::new(rng),
        }
    }

    /// Run `f` with exclusive access to the random source (a poisoned
    /// lock is recovered)
    pub fn with_random<T>(
        &self,
        f: impl FnOnce(&mut dyn RandomSource) -> gigwise_core::Result<T>,
    ) -> Result<T, AppError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(rng.as_mut())?)
    }
}

/// Create the application router
pub fn create_router(config: ServerConfig) -> Router {
    create_router_with_state(Arc::new(AppState::new(config)))
}

/// Create the router around prepared state (for testing)
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Forecasting
        .route("/forecast-income", post(handlers::forecast_income))
        // Insights
        .route("/analyze-expenses", post(handlers::analyze_expenses))
        .route("/savings-plan", post(handlers::savings_plan))
        .route("/tax-suggestions", post(handlers::tax_suggestions))
        .route(
            "/low-income-preparation",
            post(handlers::low_income_preparation),
        )
        // Sample data
        .route("/test-data", get(handlers::get_test_data))
        // Models
        .route("/models", get(handlers::list_models))
        .route("/models/reload", post(handlers::reload_models));

    // Build CORS layer
    let cors = if state.config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // Allow specified origins
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config));

    // Pick up models persisted by `gigwise train` or an earlier run
    match state.registry.reload() {
        Ok(count) => info!("Loaded {} persisted model(s)", count),
        Err(e) => error!(error = %e, "Failed to load persisted models"),
    }

    let app = create_router_with_state(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Caller mistakes are reported as-is
        if let Some(core) = err.downcast_ref::<gigwise_core::Error>() {
            match core {
                gigwise_core::Error::Validation(msg) => return Self::bad_request(msg),
                gigwise_core::Error::NotFound(msg) => return Self::not_found(msg),
                _ => {}
            }
        }
        if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
            return Self::bad_request(&rejection.body_text());
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
