//! One-dimensional k-means over standardized values

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Zero-mean, unit-variance scaling (population variance)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::Training("cannot scale an empty sample".into()));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        // Constant input keeps its offset but is not stretched
        let scale = if std > f64::EPSILON { std } else { 1.0 };
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    pub fn inverse(&self, value: f64) -> f64 {
        value * self.scale + self.mean
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeansParams {
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Fitted k-means model; centroids are in standardized space, ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    pub scaler: StandardScaler,
    pub centroids: Vec<f64>,
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeans {
    /// Standardize `values` and cluster them into `k` groups
    pub fn fit(values: &[f64], k: usize, params: KMeansParams) -> Result<Self> {
        if k == 0 || k > values.len() {
            return Err(Error::Training(format!(
                "k must be between 1 and {} (got {})",
                values.len(),
                k
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Training("sample contains non-finite values".into()));
        }

        let scaler = StandardScaler::fit(values)?;
        let points: Vec<f64> = values.iter().map(|v| scaler.transform(*v)).collect();

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut centroids = seed_plus_plus(&points, k, &mut rng);
        let mut labels = vec![0usize; points.len()];
        let mut n_iter = 0;

        for _ in 0..params.max_iter {
            n_iter += 1;
            for (label, p) in labels.iter_mut().zip(&points) {
                *label = nearest(&centroids, *p);
            }

            let mut shift: f64 = 0.0;
            for (c, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<f64> = points
                    .iter()
                    .zip(&labels)
                    .filter(|(_, l)| **l == c)
                    .map(|(p, _)| *p)
                    .collect();
                // An empty cluster keeps its previous centroid
                if members.is_empty() {
                    continue;
                }
                let updated = members.iter().sum::<f64>() / members.len() as f64;
                shift = shift.max((updated - *centroid).abs());
                *centroid = updated;
            }

            if shift <= params.tolerance {
                break;
            }
        }

        centroids.sort_by(|a, b| a.total_cmp(b));
        let inertia = points
            .iter()
            .map(|p| (p - centroids[nearest(&centroids, *p)]).powi(2))
            .sum();

        Ok(Self {
            scaler,
            centroids,
            inertia,
            n_iter,
        })
    }

    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Cluster index for a raw (unscaled) value
    pub fn predict(&self, value: f64) -> usize {
        nearest(&self.centroids, self.scaler.transform(value))
    }

    /// Centroids mapped back to the original units
    pub fn centroids_raw(&self) -> Vec<f64> {
        self.centroids.iter().map(|c| self.scaler.inverse(*c)).collect()
    }
}

fn nearest(centroids: &[f64], point: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = (point - c).abs();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the closest chosen one
fn seed_plus_plus(points: &[f64], k: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())]];

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| (p - c).powi(2))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let next = if total <= 0.0 {
            points[rng.gen_range(0..points.len())]
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points[points.len() - 1];
            for (p, w) in points.iter().zip(&weights) {
                if target < *w {
                    chosen = *p;
                    break;
                }
                target -= w;
            }
            chosen
        };
        centroids.push(next);
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_population_variance() {
        let scaler = StandardScaler::fit(&[1.0, 3.0]).unwrap();
        assert_eq!(scaler.mean, 2.0);
        assert_eq!(scaler.scale, 1.0);
        assert_eq!(scaler.transform(3.0), 1.0);
        assert_eq!(scaler.inverse(-1.0), 1.0);
    }

    #[test]
    fn test_scaler_constant_input() {
        let scaler = StandardScaler::fit(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(scaler.scale, 1.0);
        assert_eq!(scaler.transform(5.0), 0.0);
    }

    #[test]
    fn test_separates_obvious_groups() {
        let values = [10.0, 12.0, 11.0, 500.0, 510.0, 505.0, 5000.0, 5100.0];
        let model = KMeans::fit(&values, 3, KMeansParams::default()).unwrap();
        assert_eq!(model.k(), 3);

        assert_eq!(model.predict(11.0), 0);
        assert_eq!(model.predict(505.0), 1);
        assert_eq!(model.predict(5050.0), 2);

        let raw = model.centroids_raw();
        assert!((raw[0] - 11.0).abs() < 1e-6);
        assert!((raw[2] - 5050.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_is_deterministic_with_seed() {
        let values = [3.0, 8.0, 1.0, 20.0, 22.0, 7.0, 40.0];
        let a = KMeans::fit(&values, 3, KMeansParams::default()).unwrap();
        let b = KMeans::fit(&values, 3, KMeansParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_points() {
        let values = [7.0; 6];
        let model = KMeans::fit(&values, 3, KMeansParams::default()).unwrap();
        assert_eq!(model.k(), 3);
        assert_eq!(model.inertia, 0.0);
    }

    #[test]
    fn test_invalid_k() {
        assert!(KMeans::fit(&[1.0, 2.0], 0, KMeansParams::default()).is_err());
        assert!(KMeans::fit(&[1.0, 2.0], 3, KMeansParams::default()).is_err());
    }
}
