//! Low-income period preparation
//!
//! Finds months whose income fell well below the monthly average and
//! suggests how to prepare for the next one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{parse_dates, round2, ExpenseRecord, IncomeRecord};
use crate::policy::LowIncomePolicy;

use super::display_amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub title: String,
    pub description: String,
    pub action_items: Vec<String>,
}

impl Strategy {
    fn new(title: &str, description: impl Into<String>, action_items: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            action_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowIncomePreparation {
    pub average_monthly_income: f64,
    pub low_income_threshold: f64,
    /// `YYYY-MM`, chronological
    pub identified_low_months: Vec<String>,
    pub essential_monthly_expenses: f64,
    pub recommended_monthly_buffer: f64,
    pub strategies: Vec<Strategy>,
}

/// Gig categories with their own seasonal advice, in detection priority
const JOB_CATEGORIES: [&str; 3] = ["Food Delivery", "Cab Driver", "House Cleaner"];

/// Build the low-income preparation plan. Every income record needs a
/// valid date; expense dates are not used.
pub fn prepare_for_low_income(
    income: &[IncomeRecord],
    expenses: &[ExpenseRecord],
    policy: &LowIncomePolicy,
) -> Result<LowIncomePreparation> {
    if income.is_empty() || expenses.is_empty() {
        return Err(Error::validation("Insufficient data provided"));
    }

    let dates = parse_dates(income)?;
    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
    for (record, date) in income.iter().zip(&dates) {
        *monthly.entry(date.format("%Y-%m").to_string()).or_insert(0.0) += record.amount;
    }

    let average = monthly.values().sum::<f64>() / monthly.len() as f64;
    let threshold = average * policy.threshold_ratio;
    let low_months: Vec<String> = monthly
        .iter()
        .filter(|(_, amount)| **amount < threshold)
        .map(|(month, _)| month.clone())
        .collect();

    let essentials = expenses
        .iter()
        .filter(|r| policy.is_essential(r.category()))
        .map(|r| r.amount)
        .sum::<f64>()
        / policy.months_of_data;
    let buffer = essentials * policy.buffer_factor;

    let mut strategies = Vec::new();

    if average > 0.0 {
        let save_percent = seasonal_save_percent(low_months.len());
        strategies.push(Strategy::new(
            "Build a Seasonal Buffer",
            format!(
                "Save {}% of income during high-earning months to cover low-income periods.",
                save_percent
            ),
            vec![
                format!(
                    "Set aside ₹{} monthly during normal/high income periods",
                    display_amount(round2(average * f64::from(save_percent) / 100.0))
                ),
                "Keep this buffer in a separate high-interest savings account".into(),
                "Use this buffer only during identified low-income months".into(),
            ],
        ));
    }

    if !low_months.is_empty() {
        strategies.push(Strategy::new(
            "Diversify Income Sources",
            "Add additional income streams that are counter-cyclical to your current work pattern.",
            vec![
                "Look for gigs that are in high demand during your typical low-income months".into(),
                "Develop skills that allow for remote work regardless of season".into(),
                "Create passive income streams through investments or digital products".into(),
            ],
        ));
    }

    strategies.push(Strategy::new(
        "Expense Management Plan",
        "Create a reduced expense budget for low-income months.",
        vec![
            "Identify non-essential expenses that can be temporarily reduced".into(),
            format!(
                "Plan for essential expenses of ₹{} monthly",
                display_amount(round2(essentials))
            ),
            "Prepay major bills during high-income months when possible".into(),
        ],
    ));

    if let Some(strategy) = job_category(income).and_then(job_strategy) {
        strategies.push(strategy);
    }

    tracing::debug!(
        months = monthly.len(),
        low_months = low_months.len(),
        strategies = strategies.len(),
        "Built low-income plan"
    );

    Ok(LowIncomePreparation {
        average_monthly_income: round2(average),
        low_income_threshold: round2(threshold),
        identified_low_months: low_months,
        essential_monthly_expenses: round2(essentials),
        recommended_monthly_buffer: round2(buffer),
        strategies,
    })
}

/// 20% scaled up by the share of low months in a year, kept within 10..=30
pub fn seasonal_save_percent(low_months: usize) -> u32 {
    let scaled = (20.0 * (1.0 + low_months as f64 / 12.0)).round();
    scaled.clamp(10.0, 30.0) as u32
}

/// The worker's gig category, if any income record names a known one
pub fn job_category(income: &[IncomeRecord]) -> Option<&'static str> {
    JOB_CATEGORIES
        .iter()
        .copied()
        .find(|job| income.iter().any(|r| r.category() == *job))
}

fn job_strategy(category: &str) -> Option<Strategy> {
    let strategy = match category {
        "Food Delivery" => Strategy::new(
            "Plan for the Monsoon Slowdown",
            "Delivery earnings usually dip in the rainy months (June to August) and peak in the festival season.",
            vec![
                "Save extra from October to December when order volumes are highest".into(),
                "Register with more than one delivery platform to smooth out demand".into(),
                "Budget for rain gear and vehicle maintenance before the monsoon".into(),
            ],
        ),
        "Cab Driver" => Strategy::new(
            "Make the Most of Peak Seasons",
            "Ride demand tends to rise in the rainy season and around festivals.",
            vec![
                "Work extra hours during monsoon and festival peaks and bank the surplus".into(),
                "Set aside money every month for fuel price swings and vehicle servicing".into(),
                "Switch between ride apps during slow weeks to catch incentives".into(),
            ],
        ),
        "House Cleaner" => Strategy::new(
            "Build Steady Recurring Clients",
            "Cleaning work is less seasonal, so regular clients are the best protection against slow months.",
            vec![
                "Offer monthly packages to repeat customers".into(),
                "Ask satisfied clients for referrals before the festival season".into(),
                "Add deep-cleaning services for higher-value jobs".into(),
            ],
        ),
        _ => return None,
    };
    Some(strategy)
}
