//! sproutlink-api library interface
//!
//! Exposes the application state and router for the binary and for
//! integration tests, which inject fake extractor/generator clients.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::services::{LearningReportService, LinkingService, ReportGenerator, TextExtractor};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Image → text extraction client
    pub extractor: Arc<dyn TextExtractor>,
    /// Submission pipeline orchestrator
    pub report_service: LearningReportService,
    /// Linking and notification orchestrator
    pub linking: LinkingService,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn ReportGenerator>,
    ) -> Self {
        Self {
            db,
            extractor,
            report_service: LearningReportService::new(generator),
            linking: LinkingService::new(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `allowed_origin` feeds the CORS layer for the frontend; an
/// unparsable origin falls back to the compiled default.
pub fn build_router(state: AppState, allowed_origin: &str) -> Router {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| {
            HeaderValue::from_static(sproutlink_common::config::DEFAULT_ALLOWED_ORIGIN)
        });

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .merge(api::health_routes())
        .merge(api::notes_routes())
        .merge(api::student_routes())
        .merge(api::donor_routes())
        .layer(cors)
        .with_state(state)
}
