//! Handlers for the operational dashboard: KPI snapshot and reorder alerts.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ServiceError;
use crate::services::analytics::{
    AlertList, KpiSnapshot, DEFAULT_ALERT_LIMIT, DEFAULT_WINDOW_DAYS,
};
use crate::AppState;

/// Build the dashboard Router scoped under `/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/kpis", get(get_kpis))
        .route("/alerts", get(get_alerts))
}

/// Query parameters for the KPI snapshot
#[derive(Debug, Deserialize, IntoParams)]
pub struct KpiQuery {
    /// Trailing window in days (default: 30, max: 365)
    pub days: Option<i64>,
}

/// Query parameters for the alert ranking
#[derive(Debug, Deserialize, IntoParams)]
pub struct AlertsQuery {
    /// Trailing window in days (default: 30, max: 365)
    pub days: Option<i64>,
    /// Maximum ranked candidates to classify (default: 25, max: 200)
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/dashboard/kpis",
    params(KpiQuery),
    responses(
        (status = 200, description = "KPI snapshot for the window", body = KpiSnapshot),
        (status = 400, description = "Window out of bounds", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_kpis(
    State(state): State<AppState>,
    Query(params): Query<KpiQuery>,
) -> Result<Json<KpiSnapshot>, ServiceError> {
    let days = params.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let snapshot = state.analytics.kpis(days).await?;

    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/dashboard/alerts",
    params(AlertsQuery),
    responses(
        (status = 200, description = "Ranked reorder alerts", body = AlertList),
        (status = 400, description = "Window or limit out of bounds", body = crate::errors::ErrorResponse)
    ),
    tag = "Dashboard"
)]
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<AlertList>, ServiceError> {
    let days = params.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let limit = params.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    let alerts = state.analytics.alerts(days, limit).await?;

    Ok(Json(alerts))
}
