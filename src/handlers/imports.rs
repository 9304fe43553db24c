//! Handlers for the three-file import flow: validate, commit, and error
//! report download.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::errors::ServiceError;
use crate::services::imports::{CommitReceipt, ValidationReport};
use crate::tabular::{self, RawTable};
use crate::AppState;

/// Build the import Router scoped under `/import`.
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_import))
        .route("/commit", post(commit_import))
        .route("/error-report/:report_id", get(download_error_report))
}

/// The three uploaded tables, in dataset order.
struct UploadedTables {
    products: RawTable,
    inventory: RawTable,
    sales: RawTable,
}

/// Reads the multipart upload into loaded tables.
///
/// Field names are fixed (`products`, `inventory`, `sales`); unknown fields
/// are ignored. A missing field, a non-CSV file name, or undecodable content
/// is rejected up front naming the offending part.
async fn read_uploads(mut multipart: Multipart) -> Result<UploadedTables, ServiceError> {
    let mut products = None;
    let mut inventory = None;
    let mut sales = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidInput(format!("invalid multipart upload: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.csv", name));

        let bytes = field.bytes().await.map_err(|e| {
            ServiceError::InvalidInput(format!("{}: could not read upload: {}", file_name, e))
        })?;

        match name.as_str() {
            "products" => products = Some(tabular::load_table(&file_name, &bytes)?),
            "inventory" => inventory = Some(tabular::load_table(&file_name, &bytes)?),
            "sales" => sales = Some(tabular::load_table(&file_name, &bytes)?),
            _ => {}
        }
    }

    Ok(UploadedTables {
        products: products.ok_or_else(|| missing_part("products"))?,
        inventory: inventory.ok_or_else(|| missing_part("inventory"))?,
        sales: sales.ok_or_else(|| missing_part("sales"))?,
    })
}

fn missing_part(name: &str) -> ServiceError {
    ServiceError::InvalidInput(format!("multipart field '{}' is required", name))
}

/// Validate the three uploaded datasets without touching the store.
#[utoipa::path(
    post,
    path = "/import/validate",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Structured validation result (ok or findings)", body = ValidationReport),
        (status = 400, description = "Malformed upload", body = crate::errors::ErrorResponse)
    ),
    tag = "Import"
)]
pub async fn validate_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ValidationReport>, ServiceError> {
    let tables = read_uploads(multipart).await?;
    let report = state
        .imports
        .validate(&tables.products, &tables.inventory, &tables.sales)
        .await?;

    Ok(Json(report))
}

/// Commit the three uploaded datasets into the store.
#[utoipa::path(
    post,
    path = "/import/commit",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Commit receipt with row counts", body = CommitReceipt),
        (status = 400, description = "Schema incomplete or malformed upload", body = crate::errors::ErrorResponse)
    ),
    tag = "Import"
)]
pub async fn commit_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CommitReceipt>, ServiceError> {
    let tables = read_uploads(multipart).await?;
    let receipt = state
        .imports
        .commit(&tables.products, &tables.inventory, &tables.sales)
        .await?;

    Ok(Json(receipt))
}

/// Download a previously persisted validation error report as CSV.
#[utoipa::path(
    get,
    path = "/import/error-report/{report_id}",
    params(("report_id" = String, Path, description = "Opaque report id returned by validate")),
    responses(
        (status = 200, description = "CSV export of every finding", body = String, content_type = "text/csv"),
        (status = 404, description = "Unknown report id", body = crate::errors::ErrorResponse)
    ),
    tag = "Import"
)]
pub async fn download_error_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Response, ServiceError> {
    let bytes = state.reports.read(&report_id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"import_error_report.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
