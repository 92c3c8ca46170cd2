//! Risk tiering of a student cohort.
//!
//! Students are placed in a two-feature space, absence rate and GPA, which is
//! standardized against the cohort itself. k-means splits that space into
//! three clusters and the clusters are ranked by the mean GPA of their
//! members: the lowest becomes high risk, the highest safe. Cohorts too small
//! to cluster are classified with fixed thresholds instead.

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::analytics::category_stats;
use crate::clustering::KMeansClusterer;
use crate::config::{AnalysisConfig, HeuristicThresholds, RISK_TIERS};
use crate::error::Result;
use crate::model::{AnalysisMethod, EnrichedStudent, RiskAnalysis, RiskStatus, Student};
use crate::scaling::StandardScaler;

#[derive(Debug, Clone)]
pub struct RiskAnalyzer {
    config: AnalysisConfig,
    clusterer: KMeansClusterer,
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl RiskAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let clusterer = KMeansClusterer::new(RISK_TIERS, config.seed)
            .max_iterations(config.max_iterations)
            .tolerance(config.tolerance)
            .n_runs(config.n_runs);
        Self { config, clusterer }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, students: &[Student]) -> Result<RiskAnalysis> {
        for student in students {
            student.validate()?;
        }

        if students.is_empty() {
            return Ok(RiskAnalysis::empty());
        }

        if students.len() < self.config.min_cohort_size {
            debug!(cohort = students.len(), "cohort too small for clustering");
            return Ok(RiskAnalysis {
                method: AnalysisMethod::Heuristic,
                students: self.classify_by_thresholds(students),
                stats: BTreeMap::new(),
            });
        }

        let features = feature_matrix(students);
        let (_, scaled) = StandardScaler::fit_transform(&features)?;

        let (method, enriched) = match self.clusterer.cluster(&scaled) {
            Ok(labels) => (
                AnalysisMethod::Clustering,
                classify_by_clusters(students, &scaled, &labels),
            ),
            Err(e) => {
                warn!(error = %e, cohort = students.len(), "clustering unavailable, using thresholds");
                (AnalysisMethod::Heuristic, self.classify_by_thresholds(students))
            }
        };

        let stats = category_stats(&enriched);
        Ok(RiskAnalysis {
            method,
            students: enriched,
            stats,
        })
    }

    fn classify_by_thresholds(&self, students: &[Student]) -> Vec<EnrichedStudent> {
        students
            .iter()
            .map(|s| {
                let status = threshold_status(s, &self.config.heuristic);
                EnrichedStudent::new(s.clone(), status, threshold_score(s))
            })
            .collect()
    }
}

/// One row per student: `[absence_rate, gpa]`.
pub fn feature_matrix(students: &[Student]) -> Array2<f64> {
    let mut features = Array2::zeros((students.len(), 2));
    for (i, student) in students.iter().enumerate() {
        features[[i, 0]] = student.absence_rate();
        features[[i, 1]] = student.gpa;
    }
    features
}

pub fn threshold_status(student: &Student, thresholds: &HeuristicThresholds) -> RiskStatus {
    if student.gpa < thresholds.high_gpa || student.attendance_rate < thresholds.high_attendance {
        RiskStatus::High
    } else if student.gpa < thresholds.moderate_gpa
        || student.attendance_rate < thresholds.moderate_attendance
    {
        RiskStatus::Moderate
    } else {
        RiskStatus::Safe
    }
}

/// Distance from a perfect record: GPA shortfall on a 0-4 scale plus
/// attendance shortfall on a 0-100 scale, each normalized to 0-1.
pub fn threshold_score(student: &Student) -> f64 {
    (1.0 - student.gpa / 4.0) + (1.0 - student.attendance_rate / 100.0)
}

/// Maps cluster ids to tiers by ascending mean GPA of their members.
/// An empty cluster counts as mean GPA 0.
fn tier_by_cluster(students: &[Student], labels: &Array1<usize>) -> [RiskStatus; RISK_TIERS] {
    let mut ranked: Vec<(usize, f64)> = (0..RISK_TIERS)
        .map(|cluster| {
            let gpas: Vec<f64> = labels
                .iter()
                .zip(students)
                .filter(|(&label, _)| label == cluster)
                .map(|(_, s)| s.gpa)
                .collect();
            let mean = if gpas.is_empty() {
                0.0
            } else {
                gpas.iter().sum::<f64>() / gpas.len() as f64
            };
            (cluster, mean)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    debug!(clusters = ?ranked, "cluster mean gpa, ascending");

    let mut tiers = [RiskStatus::Safe; RISK_TIERS];
    for ((cluster, _), tier) in ranked.into_iter().zip(RiskStatus::TIERS) {
        tiers[cluster] = tier;
    }
    tiers
}

fn classify_by_clusters(
    students: &[Student],
    scaled: &Array2<f64>,
    labels: &Array1<usize>,
) -> Vec<EnrichedStudent> {
    let tiers = tier_by_cluster(students, labels);

    students
        .iter()
        .enumerate()
        .map(|(i, s)| {
            // Higher absence and lower grade both push the score up.
            let score = scaled[[i, 0]] - scaled[[i, 1]];
            EnrichedStudent::new(s.clone(), tiers[labels[i]], score)
        })
        .collect()
}
