//! Expense amount clustering
//!
//! Groups expense amounts into up to three spending tiers. Small
//! samples are not clustered at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::{KMeans, KMeansParams};
use crate::models::{round2, ExpenseRecord};
use crate::policy::ExpensePolicy;

/// Fitted expense clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseClusterModel {
    kmeans: KMeans,
    pub samples: usize,
    pub trained_at: DateTime<Utc>,
}

/// Summary of one spending tier in a set of expenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountCluster {
    pub tier: String,
    pub centroid_amount: f64,
    pub count: usize,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl ExpenseClusterModel {
    /// Cluster expense amounts with `k = min(max_clusters, n)`.
    ///
    /// Returns `Ok(None)` when there are fewer than
    /// `policy.min_cluster_records` records.
    pub fn train(records: &[ExpenseRecord], policy: &ExpensePolicy) -> Result<Option<Self>> {
        if records.len() < policy.min_cluster_records.max(1) {
            tracing::debug!(
                records = records.len(),
                required = policy.min_cluster_records,
                "Too few expenses to cluster"
            );
            return Ok(None);
        }

        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let k = policy.max_clusters.max(1).min(amounts.len());
        let kmeans = KMeans::fit(&amounts, k, KMeansParams::default())?;

        Ok(Some(Self {
            kmeans,
            samples: records.len(),
            trained_at: Utc::now(),
        }))
    }

    pub fn k(&self) -> usize {
        self.kmeans.k()
    }

    /// Tier index for an amount (0 = lowest spending tier)
    pub fn tier_of(&self, amount: f64) -> usize {
        self.kmeans.predict(amount)
    }

    /// Describe how `records` fall into this model's tiers
    pub fn summarize(&self, records: &[ExpenseRecord]) -> Vec<AmountCluster> {
        let centroids = self.kmeans.centroids_raw();
        let labels = tier_labels(centroids.len());

        centroids
            .iter()
            .enumerate()
            .filter_map(|(idx, centroid)| {
                let members: Vec<f64> = records
                    .iter()
                    .map(|r| r.amount)
                    .filter(|a| self.tier_of(*a) == idx)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                Some(AmountCluster {
                    tier: labels[idx].to_string(),
                    centroid_amount: round2(*centroid),
                    count: members.len(),
                    min_amount: round2(members.iter().cloned().fold(f64::INFINITY, f64::min)),
                    max_amount: round2(members.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
                })
            })
            .collect()
    }
}

fn tier_labels(k: usize) -> &'static [&'static str] {
    match k {
        1 => &["typical"],
        2 => &["low", "high"],
        _ => &["low", "medium", "high"],
    }
}
