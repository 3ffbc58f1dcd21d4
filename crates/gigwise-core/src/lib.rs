//! Gigwise Core Library
//!
//! Shared functionality for the Gigwise gig-worker budgeting tool:
//! - Income/expense records and dataset files (JSON or CSV)
//! - Calendar feature derivation
//! - Gradient boosted income forecasting with a 90-day projection
//! - Expense amount clustering
//! - Model registry with on-disk model store
//! - Budgeting insights (expenses, savings, tax, low-income months)
//! - Policy configuration with embedded defaults
//! - Sample datasets

pub mod clustering;
pub mod error;
pub mod features;
pub mod forecast;
pub mod insights;
pub mod ml;
pub mod models;
pub mod policy;
pub mod random;
pub mod registry;
pub mod samples;

pub use clustering::{AmountCluster, ExpenseClusterModel};
pub use error::{Error, Result};
pub use features::{derive_features, CalendarFeatures};
pub use forecast::{project_income, IncomeForecaster, Predictor};
pub use models::{
    DailyForecast, Dataset, ExpenseRecord, IncomeForecast, IncomeRecord, MonthlyForecast,
};
pub use policy::{DeductionRule, PolicyConfig, SavingsStrategy};
pub use random::{default_source, FixedSource, RandomSource};
pub use registry::{ModelKey, ModelKind, ModelRegistry, ModelStore, StoredModel};
pub use samples::SampleLibrary;
