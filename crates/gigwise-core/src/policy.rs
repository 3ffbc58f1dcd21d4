//! Insight policy configuration
//!
//! Every tunable number behind the insights (forecast horizon, workday
//! retention, reduction range, tax brackets, low-income threshold) lives
//! here instead of inline in the rules.
//!
//! ## Configuration Resolution
//!
//! Policy is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/gigwise/config/policy.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Missing keys in an override keep their default values.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ml::BoostingParams;

/// Embedded default policy (compiled into binary)
const DEFAULT_POLICY: &str = include_str!("../../../config/policy.toml");

/// How the target savings rate is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsStrategy {
    /// Current savings rate plus a step, capped at a maximum
    Incremental,
    /// A flat configured rate regardless of current behaviour
    Fixed,
}

impl SavingsStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsStrategy::Incremental => "incremental",
            SavingsStrategy::Fixed => "fixed",
        }
    }
}

impl fmt::Display for SavingsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SavingsStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(SavingsStrategy::Incremental),
            "fixed" => Ok(SavingsStrategy::Fixed),
            _ => Err(format!("Unknown savings strategy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    pub horizon_days: u32,
    pub retention_threshold: f64,
    pub boosting: BoostingParams,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            horizon_days: 90,
            retention_threshold: 0.7,
            boosting: BoostingParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpensePolicy {
    pub top_categories: usize,
    pub reduction_min_pct: u32,
    pub reduction_max_pct: u32,
    pub min_cluster_records: usize,
    pub max_clusters: usize,
}

impl Default for ExpensePolicy {
    fn default() -> Self {
        Self {
            top_categories: 3,
            reduction_min_pct: 5,
            reduction_max_pct: 15,
            min_cluster_records: 6,
            max_clusters: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsPolicy {
    pub strategy: SavingsStrategy,
    pub months_of_data: f64,
    pub rate_step: f64,
    pub max_rate: f64,
    pub fixed_rate: f64,
    pub emergency_months: f64,
    pub max_volatility_factor: f64,
    pub low_savings_rate: f64,
    pub high_volatility: f64,
    pub min_monthly_surplus: f64,
}

impl Default for SavingsPolicy {
    fn default() -> Self {
        Self {
            strategy: SavingsStrategy::Incremental,
            months_of_data: 3.0,
            rate_step: 0.05,
            max_rate: 0.30,
            fixed_rate: 0.20,
            emergency_months: 3.0,
            max_volatility_factor: 1.5,
            low_savings_rate: 0.10,
            high_volatility: 0.30,
            min_monthly_surplus: 5000.0,
        }
    }
}

/// One progressive tax bracket; `limit` of `None` means unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(default)]
    pub limit: Option<f64>,
    pub rate: f64,
}

/// A deduction suggested when projected annual income exceeds
/// `min_income`. The saving shown is `min(cap, tax * share)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRule {
    /// `None` applies at every income
    #[serde(default)]
    pub min_income: Option<f64>,
    pub title: String,
    pub description: String,
    pub cap: f64,
    pub share: f64,
}

impl DeductionRule {
    pub fn applies_to(&self, annual_income: f64) -> bool {
        self.min_income.map_or(true, |min| annual_income > min)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    pub months_of_data: f64,
    /// Annual income above which GST registration is suggested
    pub gst_threshold: f64,
    pub brackets: Vec<TaxBracket>,
    pub deductions: Vec<DeductionRule>,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        let bracket = |limit: Option<f64>, rate: f64| TaxBracket { limit, rate };
        let deduction =
            |min_income: Option<f64>, title: &str, description: &str, cap: f64, share: f64| {
                DeductionRule {
                    min_income,
                    title: title.to_string(),
                    description: description.to_string(),
                    cap,
                    share,
                }
            };
        Self {
            months_of_data: 3.0,
            gst_threshold: 2_000_000.0,
            deductions: vec![
                deduction(
                    Some(300_000.0),
                    "Section 80C Investments",
                    "Invest in PPF, ELSS, or insurance to avail tax deduction up to ₹1,50,000.",
                    30_000.0,
                    0.3,
                ),
                deduction(
                    None,
                    "Health Insurance Premium (Section 80D)",
                    "Pay for health insurance to claim a deduction up to ₹25,000 (₹50,000 for senior citizens).",
                    5_000.0,
                    0.1,
                ),
                deduction(
                    Some(500_000.0),
                    "Home Loan Interest (Section 24)",
                    "If you have a home loan, you can claim deduction on interest paid up to ₹2,00,000.",
                    40_000.0,
                    0.4,
                ),
                deduction(
                    Some(800_000.0),
                    "National Pension Scheme (Section 80CCD)",
                    "Invest in NPS to get an additional deduction of ₹50,000 over and above Section 80C limit.",
                    10_000.0,
                    0.15,
                ),
            ],
            brackets: vec![
                bracket(Some(250_000.0), 0.0),
                bracket(Some(500_000.0), 0.05),
                bracket(Some(750_000.0), 0.10),
                bracket(Some(1_000_000.0), 0.15),
                bracket(Some(1_250_000.0), 0.20),
                bracket(Some(1_500_000.0), 0.25),
                bracket(None, 0.30),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowIncomePolicy {
    pub threshold_ratio: f64,
    pub buffer_factor: f64,
    pub months_of_data: f64,
    pub essential_categories: Vec<String>,
}

impl Default for LowIncomePolicy {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.7,
            buffer_factor: 1.2,
            months_of_data: 3.0,
            essential_categories: ["Housing", "Utilities", "Groceries", "Transportation", "Healthcare"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LowIncomePolicy {
    pub fn is_essential(&self, category: &str) -> bool {
        self.essential_categories.iter().any(|c| c == category)
    }
}

/// Complete insight policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub forecast: ForecastPolicy,
    pub expenses: ExpensePolicy,
    pub savings: SavingsPolicy,
    pub tax: TaxPolicy,
    pub low_income: LowIncomePolicy,
}

impl PolicyConfig {
    /// Load the policy (override first, then embedded default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_policy_path().filter(|p| p.exists()),
        };

        let policy = match path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                tracing::debug!(path = %path.display(), "Loaded policy override");
                Self::parse(&content)?
            }
            Some(path) => {
                return Err(Error::Config(format!(
                    "Policy file not found: {}",
                    path.display()
                )))
            }
            None => Self::embedded(),
        };

        policy.validate()?;
        Ok(policy)
    }

    /// The policy compiled into the binary
    pub fn embedded() -> Self {
        Self::parse(DEFAULT_POLICY).unwrap_or_default()
    }

    /// Parse policy from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid policy TOML: {}", e)))
    }

    /// Reject values that would make the rules meaningless
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.forecast.retention_threshold) {
            return Err(Error::Config(
                "forecast.retention_threshold must be within [0, 1]".into(),
            ));
        }
        if self.expenses.reduction_min_pct > self.expenses.reduction_max_pct {
            return Err(Error::Config(
                "expenses.reduction_min_pct exceeds reduction_max_pct".into(),
            ));
        }
        if self.savings.months_of_data <= 0.0
            || self.tax.months_of_data <= 0.0
            || self.low_income.months_of_data <= 0.0
        {
            return Err(Error::Config("months_of_data must be positive".into()));
        }
        if self
            .tax
            .deductions
            .iter()
            .any(|d| d.cap < 0.0 || !(0.0..=1.0).contains(&d.share))
        {
            return Err(Error::Config(
                "tax.deductions need a non-negative cap and a share within [0, 1]".into(),
            ));
        }
        match self.tax.brackets.last() {
            Some(last) if last.limit.is_none() => {}
            _ => {
                return Err(Error::Config(
                    "tax.brackets must end with an unbounded bracket".into(),
                ))
            }
        }
        Ok(())
    }
}

/// Default policy override path
pub fn default_policy_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("gigwise").join("config").join("policy.toml"))
}
