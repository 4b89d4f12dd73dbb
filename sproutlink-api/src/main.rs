//! sproutlink-api - Student journal and donor notification backend
//!
//! Connects child beneficiaries with sponsoring donors: journal images
//! go in, OCR text and LLM-scored learning reports come out, and linked
//! donors are notified of every new report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sproutlink_api::services::extractor::GeminiVisionClient;
use sproutlink_api::services::generator::GeminiScoringClient;
use sproutlink_api::{build_router, AppState};
use sproutlink_common::config::{resolve_gemini_api_key, TomlConfig};

#[derive(Debug, Parser)]
#[command(name = "sproutlink-api", version, about = "Student journal and donor notification backend")]
struct Cli {
    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(long, env = "SPROUTLINK_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Path to the SQLite database file
    #[arg(long, env = "SPROUTLINK_DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(long, env = "SPROUTLINK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting sproutlink-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();
    let config = TomlConfig::load(cli.config.as_deref())?;

    let bind_addr = cli.bind_addr.unwrap_or_else(|| config.bind_addr());
    let db_path = cli.database_path.unwrap_or_else(|| config.database_path());
    info!("Database: {}", db_path.display());

    let db_pool = sproutlink_api::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let api_key = resolve_gemini_api_key(&config)?;
    let extractor = GeminiVisionClient::new(api_key.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create vision client: {}", e))?;
    let generator = GeminiScoringClient::new(api_key)
        .map_err(|e| anyhow::anyhow!("Failed to create scoring client: {}", e))?;

    let state = AppState::new(db_pool, Arc::new(extractor), Arc::new(generator));
    let app = build_router(state, &config.allowed_origin());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
