//! Layered configuration: defaults, then an optional TOML file, then
//! `RISK__*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RiskError};

/// Number of risk tiers, and so of k-means clusters.
pub const RISK_TIERS: usize = 3;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// Roster served by the teacher endpoints.
    pub students_csv: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            students_csv: "data/students.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub n_runs: usize,
    /// Cohorts smaller than this are classified with the threshold heuristic.
    pub min_cohort_size: usize,
    pub heuristic: HeuristicThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
            min_cohort_size: RISK_TIERS,
            heuristic: HeuristicThresholds::default(),
        }
    }
}

/// Cut-offs for the small-cohort fallback. A student below either `high_*`
/// value is high risk, below either `moderate_*` value moderate risk.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeuristicThresholds {
    pub high_gpa: f64,
    pub high_attendance: f64,
    pub moderate_gpa: f64,
    pub moderate_attendance: f64,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            high_gpa: 2.0,
            high_attendance: 80.0,
            moderate_gpa: 3.0,
            moderate_attendance: 90.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/risk.toml")
    }

    /// The file is optional; a missing file leaves the defaults in place.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("RISK").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.min_cohort_size < RISK_TIERS {
            return Err(RiskError::InvalidConfig(format!(
                "analysis.min_cohort_size must be at least {}, got {}",
                RISK_TIERS, self.analysis.min_cohort_size
            )));
        }
        if self.analysis.n_runs == 0 {
            return Err(RiskError::InvalidConfig(
                "analysis.n_runs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
