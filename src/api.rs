use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis::RiskAnalyzer;
use crate::analytics::{CategoryStats, DashboardSummary};
use crate::config::RISK_TIERS;
use crate::data;
use crate::error::{Result, RiskError};
use crate::model::{AnalysisMethod, EnrichedStudent, RiskAnalysis, RiskStatus, Student};

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub struct AppState {
    pub analyzer: RiskAnalyzer,
    /// Roster behind the teacher endpoints, analysed once at startup.
    pub roster: RiskAnalysis,
    pub analysed_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: RiskAnalyzer, roster: Vec<Student>) -> Result<Self> {
        let roster = analyzer.analyze(&roster)?;
        Ok(Self {
            analyzer,
            roster,
            analysed_at: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    pub success: bool,
    pub total: usize,
    pub method: AnalysisMethod,
    pub students: Vec<EnrichedStudent>,
    pub stats: BTreeMap<RiskStatus, CategoryStats>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ModelInfo {
    pub algorithm: &'static str,
    pub clusters: usize,
    pub seed: u64,
    pub n_runs: usize,
    pub min_cohort_size: usize,
    pub features: Vec<&'static str>,
    pub tiers: Vec<&'static str>,
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student Risk API is running!")
}

/// k-means over a large submitted cohort is CPU bound; keep it off the
/// async workers.
async fn analyze_blocking(analyzer: RiskAnalyzer, students: Vec<Student>) -> Result<RiskAnalysis> {
    web::block(move || analyzer.analyze(&students))
        .await
        .map_err(|e| RiskError::Worker(e.to_string()))?
}

async fn analyze(
    state: web::Data<AppState>,
    web::Json(students): web::Json<Vec<Student>>,
) -> Result<HttpResponse> {
    let analysis = analyze_blocking(state.analyzer.clone(), students).await?;
    tracing::info!(
        cohort = analysis.students.len(),
        method = ?analysis.method,
        "analysed submitted cohort"
    );
    Ok(HttpResponse::Ok().json(analysis))
}

async fn analyze_csv(
    state: web::Data<AppState>,
    body: std::result::Result<String, actix_web::Error>,
) -> Result<HttpResponse> {
    // Oversized and non-UTF-8 bodies surface here rather than as plain text.
    let body = body.map_err(|e| RiskError::InvalidPayload(e.to_string()))?;
    let students = data::parse_students(body.as_bytes())?;
    let analysis = analyze_blocking(state.analyzer.clone(), students).await?;
    tracing::info!(
        cohort = analysis.students.len(),
        method = ?analysis.method,
        "analysed csv cohort"
    );
    Ok(HttpResponse::Ok().json(analysis))
}

async fn teacher_students(state: web::Data<AppState>) -> HttpResponse {
    let analysis = &state.roster;

    HttpResponse::Ok().json(RosterResponse {
        success: true,
        total: analysis.students.len(),
        method: analysis.method,
        students: analysis.students.clone(),
        stats: analysis.stats.clone(),
        generated_at: state.analysed_at,
    })
}

async fn teacher_student_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    match state.roster.find(&id) {
        Some(student) => Ok(HttpResponse::Ok().json(student)),
        None => Err(RiskError::StudentNotFound(id)),
    }
}

async fn teacher_dashboard(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(DashboardSummary::from_analysis(&state.roster))
}

async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    let config = state.analyzer.config();
    HttpResponse::Ok().json(ModelInfo {
        algorithm: "k-means",
        clusters: RISK_TIERS,
        seed: config.seed,
        n_runs: config.n_runs,
        min_cohort_size: config.min_cohort_size,
        features: vec!["absence_rate", "gpa"],
        tiers: RiskStatus::TIERS.iter().map(|t| t.label()).collect(),
    })
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    RiskError::InvalidPayload(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(json_error),
    )
        .app_data(web::PayloadConfig::default().limit(MAX_BODY_BYTES))
        .route("/health", web::get().to(health_check))
        .route("/risk/analyze", web::post().to(analyze))
        .route("/risk/analyze/csv", web::post().to(analyze_csv))
        .route("/teacher/students", web::get().to(teacher_students))
        .route("/teacher/students/{id}", web::get().to(teacher_student_detail))
        .route("/teacher/dashboard", web::get().to(teacher_dashboard))
        .route("/model/info", web::get().to(model_info));
}
