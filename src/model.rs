use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::analytics::CategoryStats;
use crate::error::{Result, RiskError};

/// A student record as delivered by the school backend.
///
/// Only `gpa` and `attendanceRate` take part in the analysis. Every field the
/// analysis does not know about is kept in `extra` and written back out
/// untouched, so callers get their full record back with the risk fields added.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "student_id")]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "class", alias = "class_name")]
    pub class_name: String,
    /// Grade point average, 0-4 scale.
    pub gpa: f64,
    /// Percentage of sessions attended, 0-100.
    #[serde(alias = "attendance_rate")]
    pub attendance_rate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>, gpa: f64, attendance_rate: f64) -> Self {
        Self {
            id: id.into(),
            student_id: String::new(),
            name: name.into(),
            class_name: String::new(),
            gpa,
            attendance_rate,
            extra: Map::new(),
        }
    }

    pub fn absence_rate(&self) -> f64 {
        100.0 - self.attendance_rate
    }

    /// Label used in error messages: the id when present, else the name.
    pub fn display_id(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gpa.is_finite() {
            return Err(RiskError::InvalidStudent {
                id: self.display_id().to_string(),
                reason: "gpa must be a finite number".to_string(),
            });
        }
        if !self.attendance_rate.is_finite() {
            return Err(RiskError::InvalidStudent {
                id: self.display_id().to_string(),
                reason: "attendanceRate must be a finite number".to_string(),
            });
        }
        Ok(())
    }
}

/// Ordinal risk tier. Declaration order is the severity order, which the
/// per-tier statistics map relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    #[serde(rename = "Berisiko Tinggi")]
    High,
    #[serde(rename = "Berisiko Sedang")]
    Moderate,
    #[serde(rename = "Aman")]
    Safe,
}

impl RiskStatus {
    /// Tiers from most to least severe.
    pub const TIERS: [RiskStatus; 3] = [RiskStatus::High, RiskStatus::Moderate, RiskStatus::Safe];

    pub fn label(&self) -> &'static str {
        match self {
            RiskStatus::High => "Berisiko Tinggi",
            RiskStatus::Moderate => "Berisiko Sedang",
            RiskStatus::Safe => "Aman",
        }
    }

    pub fn is_at_risk(&self) -> bool {
        matches!(self, RiskStatus::High | RiskStatus::Moderate)
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStudent {
    #[serde(flatten)]
    pub student: Student,
    pub risk_status: RiskStatus,
    pub risk_score: f64,
}

impl EnrichedStudent {
    pub fn new(mut student: Student, risk_status: RiskStatus, risk_score: f64) -> Self {
        // A record analysed before carries its old verdict in `extra`.
        student.extra.remove("riskStatus");
        student.extra.remove("riskScore");
        student.extra.remove("risk_status");
        student.extra.remove("risk_score");
        Self {
            student,
            risk_status,
            risk_score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    Empty,
    Heuristic,
    Clustering,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RiskAnalysis {
    pub method: AnalysisMethod,
    pub students: Vec<EnrichedStudent>,
    pub stats: BTreeMap<RiskStatus, CategoryStats>,
}

impl RiskAnalysis {
    pub fn empty() -> Self {
        Self {
            method: AnalysisMethod::Empty,
            students: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    pub fn count(&self, status: RiskStatus) -> usize {
        self.students.iter().filter(|s| s.risk_status == status).count()
    }

    pub fn find(&self, id: &str) -> Option<&EnrichedStudent> {
        self.students
            .iter()
            .find(|s| s.student.id == id || s.student.student_id == id)
    }
}
