use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.1.0",
        description = r#"
# Stockroom API

Import validation and inventory analytics for a small retail operation.

- **Import**: upload products, inventory, and sales CSVs; validate them
  against structural and business rules; commit clean data into the store.
- **Dashboard**: windowed revenue/margin KPIs plus sku-level stock-out alerts
  ranked by urgency.

Validation always returns a structured result. When findings exist, the full
list is persisted as a CSV report retrievable by its opaque id.
"#
    ),
    paths(
        crate::handlers::imports::validate_import,
        crate::handlers::imports::commit_import,
        crate::handlers::imports::download_error_report,
        crate::handlers::dashboard::get_kpis,
        crate::handlers::dashboard::get_alerts,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::validation::ValidationFinding,
        crate::services::validation::FindingCode,
        crate::services::imports::DatasetSummary,
        crate::services::imports::ValidationReport,
        crate::services::imports::SavedCounts,
        crate::services::imports::CommitReceipt,
        crate::services::analytics::KpiSnapshot,
        crate::services::analytics::AlertEntry,
        crate::services::analytics::AlertList,
    )),
    tags(
        (name = "Import", description = "Three-file import validation and commit"),
        (name = "Dashboard", description = "Operational KPIs and reorder alerts")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, backed by the generated OpenAPI document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
