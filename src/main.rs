use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use student_risk::api::{self, AppState};
use student_risk::config::{AppConfig, LoggingConfig};
use student_risk::data;
use student_risk::model::RiskStatus;
use student_risk::RiskAnalyzer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("student_risk={},actix_web=info", logging.level)))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn start_api(config: &AppConfig, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/risk.toml".to_string());
    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    init_logging(&config.logging)?;
    info!("Configuration loaded from {}", config_path);

    let roster_path = config.data.students_csv.clone();
    let roster = tokio::task::spawn_blocking(move || data::load_students(&roster_path))
        .await
        .context("roster loader panicked")?
        .with_context(|| format!("failed to load roster from {}", config.data.students_csv))?;
    info!("Loaded {} student records", roster.len());

    let analyzer = RiskAnalyzer::new(config.analysis.clone());
    let state = AppState::new(analyzer, roster).context("roster failed risk analysis")?;
    info!(
        method = ?state.roster.method,
        high = state.roster.count(RiskStatus::High),
        moderate = state.roster.count(RiskStatus::Moderate),
        safe = state.roster.count(RiskStatus::Safe),
        "Roster risk tiers"
    );

    info!(
        "Starting Student Risk API on http://{}:{}",
        config.server.host, config.server.port
    );
    start_api(&config, state).await?;

    Ok(())
}
