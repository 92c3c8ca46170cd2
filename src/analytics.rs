use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{EnrichedStudent, RiskAnalysis, RiskStatus};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RiskStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl RiskStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(RiskStats { mean, min, max, count })
    }
}

/// Statistics for one risk tier. The `attendance` block describes the
/// absence rate, not the attendance rate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub average_score: RiskStats,
    #[serde(rename = "attendance")]
    pub absence: RiskStats,
}

/// Per-tier GPA and absence statistics. Tiers without students are left out.
pub fn category_stats(students: &[EnrichedStudent]) -> BTreeMap<RiskStatus, CategoryStats> {
    let mut stats = BTreeMap::new();

    for tier in RiskStatus::TIERS {
        let members: Vec<&EnrichedStudent> =
            students.iter().filter(|s| s.risk_status == tier).collect();
        let gpas: Vec<f64> = members.iter().map(|s| s.student.gpa).collect();
        let absences: Vec<f64> = members.iter().map(|s| s.student.absence_rate()).collect();

        if let (Some(average_score), Some(absence)) =
            (RiskStats::from_values(&gpas), RiskStats::from_values(&absences))
        {
            stats.insert(tier, CategoryStats { average_score, absence });
        }
    }

    stats
}

/// Headline numbers for the teacher dashboard.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_students: usize,
    pub average_attendance: f64,
    pub at_risk_students: usize,
    pub high_risk: usize,
    pub moderate_risk: usize,
    pub safe: usize,
}

impl DashboardSummary {
    pub fn from_analysis(analysis: &RiskAnalysis) -> Self {
        let total_students = analysis.students.len();
        let average_attendance = if total_students > 0 {
            analysis
                .students
                .iter()
                .map(|s| s.student.attendance_rate)
                .sum::<f64>()
                / total_students as f64
        } else {
            0.0
        };
        let high_risk = analysis.count(RiskStatus::High);
        let moderate_risk = analysis.count(RiskStatus::Moderate);

        DashboardSummary {
            total_students,
            average_attendance,
            at_risk_students: high_risk + moderate_risk,
            high_risk,
            moderate_risk,
            safe: analysis.count(RiskStatus::Safe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisMethod, Student};

    fn enriched(gpa: f64, attendance: f64, status: RiskStatus) -> EnrichedStudent {
        EnrichedStudent::new(Student::new("", "", gpa, attendance), status, 0.0)
    }

    #[test]
    fn test_stats_from_values() {
        let stats = RiskStats::from_values(&[2.0, 4.0, 3.0]).unwrap();
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.count, 3);
        assert!(RiskStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_category_stats_track_absence() {
        let students = vec![
            enriched(1.5, 60.0, RiskStatus::High),
            enriched(2.5, 70.0, RiskStatus::High),
            enriched(3.8, 95.0, RiskStatus::Safe),
        ];
        let stats = category_stats(&students);

        assert_eq!(stats.len(), 2);
        assert!(!stats.contains_key(&RiskStatus::Moderate));

        let high = &stats[&RiskStatus::High];
        assert_eq!(high.average_score.mean, 2.0);
        assert_eq!(high.absence.min, 30.0);
        assert_eq!(high.absence.max, 40.0);
        assert_eq!(high.absence.count, 2);
    }

    #[test]
    fn test_dashboard_summary_counts_at_risk() {
        let students = vec![
            enriched(1.5, 60.0, RiskStatus::High),
            enriched(2.8, 85.0, RiskStatus::Moderate),
            enriched(3.8, 95.0, RiskStatus::Safe),
            enriched(3.9, 100.0, RiskStatus::Safe),
        ];
        let analysis = RiskAnalysis {
            method: AnalysisMethod::Clustering,
            stats: category_stats(&students),
            students,
        };
        let summary = DashboardSummary::from_analysis(&analysis);

        assert_eq!(summary.total_students, 4);
        assert_eq!(summary.at_risk_students, 2);
        assert_eq!(summary.safe, 2);
        assert_eq!(summary.average_attendance, 85.0);
    }

    #[test]
    fn test_dashboard_summary_of_empty_roster() {
        let summary = DashboardSummary::from_analysis(&RiskAnalysis::empty());
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.average_attendance, 0.0);
    }
}
