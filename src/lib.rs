//! Student risk analysis.
//!
//! Classifies a cohort of students into three risk tiers from their absence
//! rate and GPA, and serves the result over HTTP for the teacher dashboards.

pub mod analysis;
pub mod analytics;
pub mod api;
pub mod clustering;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod scaling;

pub use analysis::RiskAnalyzer;
pub use error::{Result, RiskError};
pub use model::{AnalysisMethod, EnrichedStudent, RiskAnalysis, RiskStatus, Student};
