//! Savings plan

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{round1, round2, ExpenseRecord, IncomeRecord};
use crate::policy::{SavingsPolicy, SavingsStrategy};

use super::Estimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    Important,
    Consideration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecommendation {
    #[serde(rename = "type")]
    pub priority: Priority,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyFund {
    pub recommended_amount: f64,
    /// Months of saving at the target rate, or `"N/A"` when nothing is saved
    pub months_to_achieve: Estimate,
}

/// Rates and volatility are percentages rounded to one decimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub strategy: SavingsStrategy,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub current_savings_rate: f64,
    pub recommended_savings_rate: f64,
    pub monthly_savings_target: f64,
    pub emergency_fund: EmergencyFund,
    pub income_volatility: f64,
    pub recommendations: Vec<SavingsRecommendation>,
}

/// Population standard deviation over mean; 0 for an empty or zero-mean sample
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Build a savings plan from the income and expenses of the last
/// `policy.months_of_data` months
pub fn plan_savings(
    income: &[IncomeRecord],
    expenses: &[ExpenseRecord],
    policy: &SavingsPolicy,
) -> Result<SavingsPlan> {
    if income.is_empty() || expenses.is_empty() {
        return Err(Error::validation("Insufficient data provided"));
    }

    let total_income: f64 = income.iter().map(|r| r.amount).sum();
    let total_expenses: f64 = expenses.iter().map(|r| r.amount).sum();
    let monthly_income = total_income / policy.months_of_data;
    let monthly_expenses = total_expenses / policy.months_of_data;

    let current_rate = if monthly_income > 0.0 {
        ((monthly_income - monthly_expenses) / monthly_income).max(0.0)
    } else {
        0.0
    };
    let target_rate = match policy.strategy {
        SavingsStrategy::Incremental => (current_rate + policy.rate_step).min(policy.max_rate),
        SavingsStrategy::Fixed => policy.fixed_rate,
    };

    let amounts: Vec<f64> = income.iter().map(|r| r.amount).collect();
    let volatility = coefficient_of_variation(&amounts);
    let volatility_factor = (1.0 + volatility).min(policy.max_volatility_factor);
    let emergency_fund = monthly_expenses * policy.emergency_months * volatility_factor;

    let monthly_target = monthly_income * target_rate;
    let months_to_achieve = if monthly_target > 0.0 {
        Estimate::Value(round1(emergency_fund / monthly_target))
    } else {
        Estimate::not_available()
    };

    let mut recommendations = Vec::new();
    if current_rate < policy.low_savings_rate {
        recommendations.push(SavingsRecommendation {
            priority: Priority::Urgent,
            title: "Increase Your Savings Rate".into(),
            description: format!(
                "Your current savings rate is less than {}%. Try to increase your savings by reducing non-essential expenses.",
                round1(policy.low_savings_rate * 100.0)
            ),
        });
    }
    if volatility > policy.high_volatility {
        recommendations.push(SavingsRecommendation {
            priority: Priority::Important,
            title: "Build a Larger Emergency Fund".into(),
            description: "Your income is highly variable. Aim for 6 months of expenses in your emergency fund.".into(),
        });
    }
    if monthly_income - monthly_expenses < policy.min_monthly_surplus {
        recommendations.push(SavingsRecommendation {
            priority: Priority::Consideration,
            title: "Increase Income Sources".into(),
            description: "Your income barely covers expenses. Consider adding new income streams or gigs.".into(),
        });
    }

    tracing::debug!(
        strategy = %policy.strategy,
        current_rate,
        target_rate,
        volatility,
        "Built savings plan"
    );

    Ok(SavingsPlan {
        strategy: policy.strategy,
        monthly_income: round2(monthly_income),
        monthly_expenses: round2(monthly_expenses),
        current_savings_rate: round1(current_rate * 100.0),
        recommended_savings_rate: round1(target_rate * 100.0),
        monthly_savings_target: round2(monthly_target),
        emergency_fund: EmergencyFund {
            recommended_amount: round2(emergency_fund),
            months_to_achieve,
        },
        income_volatility: round1(volatility * 100.0),
        recommendations,
    })
}
