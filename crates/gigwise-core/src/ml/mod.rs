//! Small statistical estimators used by the insight pipeline
//!
//! - `gbm` - least-squares gradient boosted regression trees
//! - `kmeans` - standardized one-dimensional k-means

pub mod gbm;
pub mod kmeans;

pub use gbm::{BoostingParams, GradientBoostingRegressor, RegressionTree};
pub use kmeans::{KMeans, KMeansParams, StandardScaler};
