//! Tax estimate and deduction suggestions
//!
//! Simplified progressive slabs; not tax advice.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{round1, round2, IncomeRecord};
use crate::policy::{TaxBracket, TaxPolicy};

use super::Estimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    TaxDeduction,
    BusinessStructure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub title: String,
    pub description: String,
    pub potential_saving: Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAnalysis {
    pub projected_annual_income: f64,
    pub estimated_tax: f64,
    /// Percent of projected income, one decimal
    pub effective_tax_rate: f64,
    pub suggestions: Vec<TaxSuggestion>,
}

/// Progressive tax over `brackets` (ascending limits, last one unbounded)
pub fn estimate_tax(annual_income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut tax = 0.0;
    let mut lower = 0.0;

    for bracket in brackets {
        if annual_income <= lower {
            break;
        }
        let upper = bracket.limit.unwrap_or(f64::INFINITY);
        tax += (annual_income.min(upper) - lower) * bracket.rate;
        lower = upper;
    }
    tax
}

/// Project annual income from `policy.months_of_data` months of records
/// and suggest the policy's deductions
pub fn suggest_tax_savings(income: &[IncomeRecord], policy: &TaxPolicy) -> Result<TaxAnalysis> {
    if income.is_empty() {
        return Err(Error::validation("No income data provided"));
    }

    let total: f64 = income.iter().map(|r| r.amount).sum();
    let annual = total / policy.months_of_data * 12.0;
    let tax = estimate_tax(annual, &policy.brackets);

    let mut suggestions: Vec<TaxSuggestion> = policy
        .deductions
        .iter()
        .filter(|rule| rule.applies_to(annual))
        .map(|rule| TaxSuggestion {
            kind: SuggestionType::TaxDeduction,
            title: rule.title.clone(),
            description: rule.description.clone(),
            potential_saving: Estimate::Value(rule.cap.min(tax * rule.share)),
        })
        .collect();

    if annual > policy.gst_threshold {
        suggestions.push(TaxSuggestion {
            kind: SuggestionType::BusinessStructure,
            title: "Consider GST Registration".into(),
            description: "If your annual turnover is over ₹20 lakhs, GST registration allows you to claim input tax credits.".into(),
            potential_saving: Estimate::Note("Variable based on business expenses".into()),
        });
    }

    let effective_tax_rate = if annual > 0.0 {
        round1(tax / annual * 100.0)
    } else {
        0.0
    };

    tracing::debug!(annual, tax, suggestions = suggestions.len(), "Estimated tax");

    Ok(TaxAnalysis {
        projected_annual_income: round2(annual),
        estimated_tax: round2(tax),
        effective_tax_rate,
        suggestions,
    })
}
