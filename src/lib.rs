//! Stockroom API Library
//!
//! Import validation pipeline and inventory analytics for a small retail
//! operation: three CSV datasets in, a canonical store and KPI/alert
//! reporting out.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tabular;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use services::analytics::AnalyticsService;
use services::imports::ImportService;
use services::reports::ErrorReportStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub imports: ImportService,
    pub analytics: AnalyticsService,
    pub reports: ErrorReportStore,
}

impl AppState {
    /// Wires the service layer onto a connection pool and configuration.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let reports = ErrorReportStore::new(config.error_report_dir.clone());
        let imports = ImportService::new(db.clone(), reports.clone());
        let analytics = AnalyticsService::new(db.clone());

        Self {
            db,
            config,
            imports,
            analytics,
            reports,
        }
    }
}

/// Full application router (state not yet attached).
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api_v1_routes())
        .nest("/import", handlers::imports::import_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .merge(openapi::swagger_ui())
}

/// Status and health endpoints
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "service": "stockroom-api" }))
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "service": "stockroom-api",
        "version": version,
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
