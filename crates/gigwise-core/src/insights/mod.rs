//! Budgeting insights
//!
//! Each insight is a plain function of the caller's records, the policy
//! and (where a rule draws random numbers) an injected [`RandomSource`].
//!
//! - **Expenses** - per-category totals and reduction suggestions
//! - **Savings** - savings rate, target and emergency fund
//! - **Tax** - projected annual tax and deduction suggestions
//! - **Low income** - seasonal low months and preparation strategies
//!
//! [`RandomSource`]: crate::random::RandomSource

pub mod expenses;
pub mod low_income;
pub mod savings;
pub mod tax;

use serde::{Deserialize, Serialize};

pub use expenses::{analyze_expenses, CategoryBreakdown, CategoryMetrics, ExpenseAnalysis, ExpenseRecommendation};
pub use low_income::{prepare_for_low_income, LowIncomePreparation, Strategy};
pub use savings::{plan_savings, EmergencyFund, Priority, SavingsPlan, SavingsRecommendation};
pub use tax::{estimate_tax, suggest_tax_savings, SuggestionType, TaxAnalysis, TaxSuggestion};

/// A figure that is sometimes only available as prose (`"N/A"`,
/// `"Variable based on business expenses"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Estimate {
    Value(f64),
    Note(String),
}

impl Estimate {
    pub fn not_available() -> Self {
        Estimate::Note("N/A".to_string())
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Value(v) => Some(*v),
            Estimate::Note(_) => None,
        }
    }
}

/// Render an amount for display text: whole numbers keep one decimal
/// (`500.0`), everything else uses the shortest exact form (`50.75`)
pub(crate) fn display_amount(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
