//! Expense analysis
//!
//! Groups expenses by category and suggests a reduction for the top
//! spending categories.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::clustering::AmountCluster;
use crate::error::{Error, Result};
use crate::models::{round2, ExpenseRecord};
use crate::policy::ExpensePolicy;
use crate::random::RandomSource;

use super::display_amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub total: f64,
    pub average: f64,
    pub count: usize,
}

/// Per-category metrics in first-seen order; serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown(Vec<(String, CategoryMetrics)>);

impl CategoryBreakdown {
    pub fn get(&self, category: &str) -> Option<&CategoryMetrics> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, metrics)| metrics)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryMetrics)> {
        self.0.iter().map(|(name, metrics)| (name.as_str(), metrics))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, metrics) in &self.0 {
            map.serialize_entry(name, metrics)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecommendation {
    pub category: String,
    pub current_spending: f64,
    pub recommendation: String,
    pub potential_savings: f64,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseAnalysis {
    pub by_category: CategoryBreakdown,
    pub recommendations: Vec<ExpenseRecommendation>,
    /// Spending tiers, present when enough expenses were available to cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_clusters: Option<Vec<AmountCluster>>,
}

impl ExpenseAnalysis {
    pub fn with_clusters(mut self, clusters: Vec<AmountCluster>) -> Self {
        self.amount_clusters = Some(clusters);
        self
    }
}

/// Analyze expenses and recommend reductions for the top categories.
///
/// Each recommended category gets a random whole-percent reduction drawn
/// from the policy range.
pub fn analyze_expenses(
    records: &[ExpenseRecord],
    policy: &ExpensePolicy,
    rng: &mut dyn RandomSource,
) -> Result<ExpenseAnalysis> {
    if records.is_empty() {
        return Err(Error::validation("No expense data provided"));
    }

    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    for record in records {
        let category = record.category();
        match groups.iter_mut().find(|(name, _, _)| name == category) {
            Some((_, total, count)) => {
                *total += record.amount;
                *count += 1;
            }
            None => groups.push((category.to_string(), record.amount, 1)),
        }
    }

    let by_category = CategoryBreakdown(
        groups
            .into_iter()
            .map(|(name, total, count)| {
                let metrics = CategoryMetrics {
                    total: round2(total),
                    average: round2(total / count as f64),
                    count,
                };
                (name, metrics)
            })
            .collect(),
    );

    // Stable sort keeps first-seen order among equal totals
    let mut ranked: Vec<(&str, &CategoryMetrics)> = by_category.iter().collect();
    ranked.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));

    let mut recommendations = Vec::new();
    for (category, metrics) in ranked.into_iter().take(policy.top_categories) {
        if metrics.total <= 0.0 {
            continue;
        }
        let pct = rng.int_inclusive(policy.reduction_min_pct, policy.reduction_max_pct);
        let potential_savings = round2(metrics.total * f64::from(pct) / 100.0);

        recommendations.push(ExpenseRecommendation {
            category: category.to_string(),
            current_spending: metrics.total,
            recommendation: format!("Reduce {} spending by {}%", category, pct),
            potential_savings,
            details: format!(
                "You spent ₹{} on {} recently. Cutting this by {}% would save ₹{}.",
                display_amount(metrics.total),
                category,
                pct,
                display_amount(potential_savings)
            ),
        });
    }

    tracing::debug!(
        categories = by_category.len(),
        recommendations = recommendations.len(),
        "Analyzed expenses"
    );

    Ok(ExpenseAnalysis {
        by_category,
        recommendations,
        amount_clusters: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{default_source, FixedSource};

    #[test]
    fn test_housing_and_food() {
        let records = vec![
            ExpenseRecord::new(500.0, "Housing"),
            ExpenseRecord::new(200.0, "Food"),
        ];
        let mut rng = FixedSource::new(0.5, 10);
        let analysis = analyze_expenses(&records, &ExpensePolicy::default(), &mut rng).unwrap();

        assert_eq!(
            analysis.by_category.get("Housing"),
            Some(&CategoryMetrics { total: 500.0, average: 500.0, count: 1 })
        );
        assert_eq!(
            analysis.by_category.get("Food"),
            Some(&CategoryMetrics { total: 200.0, average: 200.0, count: 1 })
        );

        assert_eq!(analysis.recommendations.len(), 2);
        let housing = &analysis.recommendations[0];
        assert_eq!(housing.category, "Housing");
        assert_eq!(housing.current_spending, 500.0);
        assert_eq!(housing.potential_savings, 50.0);
        assert_eq!(housing.recommendation, "Reduce Housing spending by 10%");
        assert_eq!(
            housing.details,
            "You spent ₹500.0 on Housing recently. Cutting this by 10% would save ₹50.0."
        );
        assert_eq!(analysis.recommendations[1].potential_savings, 20.0);
    }

    #[test]
    fn test_grouping_and_top_three() {
        let records = vec![
            ExpenseRecord::new(10.0, "Food"),
            ExpenseRecord::new(100.0, "Rent"),
            ExpenseRecord::new(15.5, "Food"),
            ExpenseRecord::new(40.0, "Fuel"),
            ExpenseRecord::new(5.0, "Phone"),
            ExpenseRecord { amount: 7.0, date: None, category: None },
        ];
        let mut rng = default_source(Some(5));
        let analysis = analyze_expenses(&records, &ExpensePolicy::default(), &mut rng).unwrap();

        let names: Vec<&str> = analysis.by_category.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Food", "Rent", "Fuel", "Phone", "Uncategorized"]);

        let food = analysis.by_category.get("Food").unwrap();
        assert_eq!(food.total, 25.5);
        assert_eq!(food.average, 12.75);
        assert_eq!(food.count, 2);

        let top: Vec<&str> = analysis
            .recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(top, vec!["Rent", "Fuel", "Food"]);
        for rec in &analysis.recommendations {
            let ratio = rec.potential_savings / rec.current_spending;
            assert!((0.049..=0.151).contains(&ratio));
        }
    }

    #[test]
    fn test_zero_totals_are_not_recommended() {
        let records = vec![
            ExpenseRecord::new(0.0, "Gifts"),
            ExpenseRecord::new(-20.0, "Refunds"),
        ];
        let mut rng = FixedSource::new(0.5, 10);
        let analysis = analyze_expenses(&records, &ExpensePolicy::default(), &mut rng).unwrap();
        assert_eq!(analysis.by_category.len(), 2);
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_by_category_is_deterministic() {
        let records = vec![
            ExpenseRecord::new(12.0, "Food"),
            ExpenseRecord::new(30.0, "Fuel"),
        ];
        let policy = ExpensePolicy::default();
        let a = analyze_expenses(&records, &policy, &mut default_source(None)).unwrap();
        let b = analyze_expenses(&records, &policy, &mut default_source(None)).unwrap();
        assert_eq!(a.by_category, b.by_category);
    }

    #[test]
    fn test_empty_is_validation_error() {
        let mut rng = FixedSource::new(0.5, 10);
        let err = analyze_expenses(&[], &ExpensePolicy::default(), &mut rng).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "No expense data provided");
    }

    #[test]
    fn test_serializes_in_first_seen_order() {
        let records = vec![
            ExpenseRecord::new(1.0, "Zeta"),
            ExpenseRecord::new(2.0, "Alpha"),
        ];
        let mut rng = FixedSource::new(0.5, 10);
        let analysis = analyze_expenses(&records, &ExpensePolicy::default(), &mut rng).unwrap();
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
        assert!(!json.contains("amount_clusters"));
    }
}
