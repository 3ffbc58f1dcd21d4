//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use gigwise_core::FixedSource;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config(data_dir: &Path) -> ServerConfig {
    ServerConfig {
        allowed_origins: vec![],
        model_dir: None,
        data_dir: data_dir.to_path_buf(),
        seed: Some(7),
        policy: PolicyConfig::embedded(),
    }
}

/// Router with in-memory models and a stub random source that keeps
/// every weekday and always suggests a 10% reduction
fn setup_test_app() -> Router {
    let config = test_config(Path::new("/nonexistent/gigwise-data"));
    let state = AppState::with_rng(config, Box::new(FixedSource::new(0.9, 10)));
    create_router_with_state(Arc::new(state))
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: Router, uri: &str, body: Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

fn three_month_income() -> Value {
    json!([
        {"amount": 1000, "date": "2024-01-01", "category": "Food Delivery"},
        {"amount": 1200, "date": "2024-02-01", "category": "Food Delivery"},
        {"amount": 1100, "date": "2024-03-01", "category": "Food Delivery"}
    ])
}

fn small_expenses() -> Value {
    json!([
        {"amount": 500, "date": "2024-01-01", "category": "Housing"},
        {"amount": 200, "date": "2024-01-05", "category": "Food"}
    ])
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

// ========== Forecast API Tests ==========

#[tokio::test]
async fn test_forecast_income() {
    let app = setup_test_app();

    let response = post_json(
        app,
        "/api/forecast-income",
        json!({"incomeData": three_month_income()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let daily = json["forecast"]["daily"].as_array().unwrap();
    let monthly = json["forecast"]["monthly"].as_array().unwrap();

    // Stub draw of 0.9 keeps every weekday from 2024-03-02 to 2024-05-30
    assert_eq!(daily.len(), 64);

    let last = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    for day in daily {
        let date: NaiveDate = day["date"].as_str().unwrap().parse().unwrap();
        assert!(date > last);
        assert!(day["amount"].as_f64().unwrap() >= 0.0);
        assert_eq!(day["source"], "Predicted Income");
    }

    let months: Vec<&str> = monthly
        .iter()
        .map(|m| m["month"].as_str().unwrap())
        .collect();
    assert_eq!(months, vec!["2024-03", "2024-04", "2024-05"]);

    let daily_total: f64 = daily.iter().map(|d| d["amount"].as_f64().unwrap()).sum();
    let monthly_total: f64 = monthly
        .iter()
        .map(|m| m["predicted_amount"].as_f64().unwrap())
        .sum();
    assert!((daily_total - monthly_total).abs() < 0.01);
}

#[tokio::test]
async fn test_forecast_rejects_missing_and_empty_income() {
    for body in [json!({}), json!({"incomeData": []})] {
        let response = post_json(setup_test_app(), "/api/forecast-income", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = get_body_json(response).await;
        assert_eq!(json["error"], "No income data provided");
    }
}

#[tokio::test]
async fn test_forecast_rejects_bad_date() {
    let response = post_json(
        setup_test_app(),
        "/api/forecast-income",
        json!({"incomeData": [{"amount": 100, "date": "2024-13-45"}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_forecast_date_at_calendar_limit_keeps_server_usable() {
    let app = setup_test_app();

    let response = post_json(
        app.clone(),
        "/api/forecast-income",
        json!({"incomeData": [{"amount": 100, "date": NaiveDate::MAX.to_string()}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The random source is still available to later requests
    let response = post_json(
        app,
        "/api/analyze-expenses",
        json!({"expenseData": [{"amount": 5, "category": "Food"}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_poisoned_random_source_is_recovered() {
    let state = Arc::new(AppState::with_rng(
        test_config(Path::new("/nonexistent/gigwise-data")),
        Box::new(FixedSource::new(0.9, 10)),
    ));

    let poisoner = state.clone();
    let joined = std::thread::spawn(move || {
        let _guard = poisoner.rng.lock().unwrap();
        panic!("request panicked while drawing");
    })
    .join();
    assert!(joined.is_err());
    assert!(state.rng.is_poisoned());

    let draw = state.with_random(|rng| Ok(rng.int_inclusive(5, 15))).unwrap();
    assert_eq!(draw, 10);
}

#[tokio::test]
async fn test_forecast_rejects_bad_user_id() {
    let response = post_json(
        setup_test_app(),
        "/api/forecast-income",
        json!({"incomeData": three_month_income(), "userId": "../etc"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/forecast-income")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(!json["error"].as_str().unwrap().is_empty());
}

// ========== Insight API Tests ==========

#[tokio::test]
async fn test_analyze_expenses() {
    let response = post_json(
        setup_test_app(),
        "/api/analyze-expenses",
        json!({"expenseData": small_expenses()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let analysis = &json["analysis"];
    assert_eq!(
        analysis["by_category"],
        json!({
            "Housing": {"total": 500.0, "average": 500.0, "count": 1},
            "Food": {"total": 200.0, "average": 200.0, "count": 1}
        })
    );

    let recommendations = analysis["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 2);
    assert_eq!(recommendations[0]["category"], "Housing");
    assert_eq!(recommendations[0]["current_spending"], 500.0);
    assert_eq!(recommendations[0]["potential_savings"], 50.0);
    assert_eq!(recommendations[1]["category"], "Food");
    assert_eq!(recommendations[1]["current_spending"], 200.0);
    assert_eq!(recommendations[1]["potential_savings"], 20.0);

    // Two records are too few to cluster
    assert!(analysis.get("amount_clusters").is_none());
}

#[tokio::test]
async fn test_analyze_expenses_is_stable() {
    let body = json!({"expenseData": small_expenses()});
    let first = get_body_json(post_json(setup_test_app(), "/api/analyze-expenses", body.clone()).await).await;
    let second = get_body_json(post_json(setup_test_app(), "/api/analyze-expenses", body).await).await;
    assert_eq!(first["analysis"]["by_category"], second["analysis"]["by_category"]);
}

#[tokio::test]
async fn test_analyze_expenses_with_clusters() {
    let expenses: Vec<Value> = [40, 55, 60, 900, 950, 4000, 4100]
        .iter()
        .map(|amount| json!({"amount": amount, "category": "Misc"}))
        .collect();

    let response = post_json(
        setup_test_app(),
        "/api/analyze-expenses",
        json!({"expenseData": expenses, "userId": 12}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let clusters = json["analysis"]["amount_clusters"].as_array().unwrap();
    let counted: u64 = clusters.iter().map(|c| c["count"].as_u64().unwrap()).sum();
    assert_eq!(counted, 7);
}

#[tokio::test]
async fn test_analyze_expenses_rejects_empty() {
    let response = post_json(
        setup_test_app(),
        "/api/analyze-expenses",
        json!({"expenseData": []}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No expense data provided");
}

#[tokio::test]
async fn test_savings_plan() {
    let response = post_json(
        setup_test_app(),
        "/api/savings-plan",
        json!({"incomeData": three_month_income(), "expenseData": small_expenses()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let plan = &json["savings_plan"];
    assert_eq!(plan["strategy"], "incremental");
    assert_eq!(plan["monthly_income"], 1100.0);
    assert!(plan["emergency_fund"]["recommended_amount"].is_number());
    assert!(plan["recommendations"].is_array());
}

#[tokio::test]
async fn test_savings_plan_requires_both_lists() {
    for body in [
        json!({"incomeData": three_month_income()}),
        json!({"expenseData": small_expenses()}),
    ] {
        let response = post_json(setup_test_app(), "/api/savings-plan", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_body_json(response).await;
        assert_eq!(json["error"], "Insufficient data provided");
    }
}

#[tokio::test]
async fn test_tax_suggestions() {
    let response = post_json(
        setup_test_app(),
        "/api/tax-suggestions",
        json!({"incomeData": three_month_income()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["tax_analysis"]["projected_annual_income"], 13200.0);
    assert_eq!(json["tax_analysis"]["estimated_tax"], 0.0);
    assert_eq!(json["tax_analysis"]["suggestions"], json["tax_suggestions"]);
}

#[tokio::test]
async fn test_tax_suggestions_requires_income() {
    let response = post_json(setup_test_app(), "/api/tax-suggestions", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_low_income_preparation() {
    let response = post_json(
        setup_test_app(),
        "/api/low-income-preparation",
        json!({"incomeData": three_month_income(), "expenseData": small_expenses()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let prep = &json["low_income_preparation"];
    assert_eq!(prep["average_monthly_income"], 1100.0);
    assert!(prep["identified_low_months"].as_array().unwrap().is_empty());
    assert!(!prep["strategies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_low_income_rejects_bad_date() {
    let response = post_json(
        setup_test_app(),
        "/api/low-income-preparation",
        json!({
            "incomeData": [{"amount": 100, "date": "not-a-date"}],
            "expenseData": small_expenses()
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Sample Data API Tests ==========

#[tokio::test]
async fn test_test_data_embedded_fallback() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test-data?category=Cab%20Driver")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let income = json["incomeData"].as_array().unwrap();
    assert!(!income.is_empty());
    assert!(income.iter().all(|r| r["category"] == "Cab Driver"));
    assert!(!json["expenseData"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_test_data_from_data_dir() {
    let data_dir = TempDir::new().unwrap();
    std::fs::write(
        data_dir.path().join("user_3_data.json"),
        json!({
            "incomeData": [{"amount": 321, "date": "2024-04-02", "category": "Cab Driver"}],
            "expenseData": []
        })
        .to_string(),
    )
    .unwrap();
    let app = create_router_with_state(Arc::new(AppState::with_rng(
        test_config(data_dir.path()),
        Box::new(FixedSource::new(0.9, 10)),
    )));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test-data?category=cab%20driver")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["incomeData"][0]["amount"], 321.0);
}

#[tokio::test]
async fn test_test_data_unknown_category() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test-data?category=Astronaut")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No test data for category: Astronaut");
}

// ========== Model API Tests ==========

#[tokio::test]
async fn test_models_persist_and_reload() {
    let model_dir = TempDir::new().unwrap();
    let config = ServerConfig {
        model_dir: Some(model_dir.path().to_path_buf()),
        ..test_config(Path::new("/nonexistent/gigwise-data"))
    };
    let app = create_router_with_state(Arc::new(AppState::with_rng(
        config,
        Box::new(FixedSource::new(0.9, 10)),
    )));

    let response = post_json(
        app.clone(),
        "/api/forecast-income",
        json!({"incomeData": three_month_income(), "userId": 7}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let models = json.as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["file_name"], "income_forecaster_user_7.json");

    let response = post_json(app, "/api/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["loaded"], 1);
}

#[tokio::test]
async fn test_models_reload_skips_corrupt_file() {
    let model_dir = TempDir::new().unwrap();
    std::fs::write(
        model_dir.path().join("expense_analyzer_user_a.json"),
        "{not a model",
    )
    .unwrap();
    let config = ServerConfig {
        model_dir: Some(model_dir.path().to_path_buf()),
        ..test_config(Path::new("/nonexistent/gigwise-data"))
    };
    let app = create_router_with_state(Arc::new(AppState::with_rng(
        config,
        Box::new(FixedSource::new(0.9, 10)),
    )));

    let response = post_json(
        app.clone(),
        "/api/forecast-income",
        json!({"incomeData": three_month_income(), "userId": "b"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(app, "/api/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["loaded"], 1);
}

#[tokio::test]
async fn test_models_without_store() {
    let response = post_json(setup_test_app(), "/api/models/reload", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["loaded"], 0);
}

// ========== Error Mapping ==========

#[test]
fn test_core_errors_map_to_status() {
    let err: AppError = gigwise_core::Error::validation("bad input").into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err: AppError = gigwise_core::Error::NotFound("missing".into()).into();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err: AppError = gigwise_core::Error::Store("disk full".into()).into();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message, "An internal error occurred");
}
