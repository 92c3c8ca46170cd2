use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::HashSet;

use crate::error::{Result, RiskError};

/// Seeded k-means over an already scaled feature matrix.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub n_runs: usize,
}

impl KMeansClusterer {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            seed,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }

    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.n_runs = n_runs;
        self
    }

    /// Returns one cluster label in `0..n_clusters` per row of `features`.
    pub fn cluster(&self, features: &Array2<f64>) -> Result<Array1<usize>> {
        if !has_distinct_rows(features, self.n_clusters) {
            return Err(RiskError::Clustering(format!(
                "fewer than {} distinct points in {} rows",
                self.n_clusters,
                features.nrows()
            )));
        }

        let rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let dataset = DatasetBase::from(features.clone());
        let model = KMeans::params_with_rng(self.n_clusters, rng)
            .max_n_iterations(self.max_iterations)
            .tolerance(self.tolerance)
            .n_runs(self.n_runs)
            .fit(&dataset)
            .map_err(|e| RiskError::Clustering(e.to_string()))?;

        let labels = model.predict(features);
        tracing::debug!(centroids = ?model.centroids(), "k-means converged");

        Ok(labels)
    }
}

/// True once `wanted` bitwise-distinct rows have been seen.
fn has_distinct_rows(features: &Array2<f64>, wanted: usize) -> bool {
    let mut seen: HashSet<Vec<u64>> = HashSet::with_capacity(wanted);
    for row in features.rows() {
        if seen.len() >= wanted {
            break;
        }
        seen.insert(row.iter().map(|v| v.to_bits()).collect());
    }
    seen.len() >= wanted
}
