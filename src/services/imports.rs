//! Import orchestration: the validate pipeline entry point and the commit
//! coordinator that merges validated tables into the store.

use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::{inventory_level, product, sale};
use crate::errors::ServiceError;
use crate::services::reports::ErrorReportStore;
use crate::services::validation::{
    collect_findings, parse_int, parse_money, parse_strict_date, ValidationFinding,
    REQUIRED_INVENTORY, REQUIRED_PRODUCTS, REQUIRED_SALES,
};
use crate::tabular::{RawTable, TableRow};

/// Findings shown inline in the validation response; the full list lives in
/// the persisted report.
pub const ERRORS_PREVIEW_LIMIT: usize = 25;

/// Path prefix under which persisted reports are downloadable.
pub const ERROR_REPORT_PATH: &str = "/import/error-report";

const DUPLICATE_NOTE: &str = "Sales duplicates (same sku+ts) are skipped.";

/// Per-dataset row counts echoed back to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatasetSummary {
    pub products_rows: usize,
    pub inventory_rows: usize,
    pub sales_rows: usize,
}

/// Outcome of one validation pass. Always structured, even on failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    pub summary: DatasetSummary,
    pub errors_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_report_url: Option<String>,
    pub errors_preview: Vec<ValidationFinding>,
}

/// Row counts reported by a commit.
///
/// `sales_attempted` is the submitted count, not the inserted count:
/// duplicate (sku, ts) rows are absorbed silently and downstream consumers
/// rely on the figure matching their input size.
#[derive(Debug, Serialize, ToSchema)]
pub struct SavedCounts {
    pub products_upserted: usize,
    pub inventory_upserted: usize,
    pub sales_attempted: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommitReceipt {
    pub ok: bool,
    pub saved: SavedCounts,
    pub note: String,
}

/// Service owning the validate and commit flows.
#[derive(Clone)]
pub struct ImportService {
    db: Arc<DatabaseConnection>,
    reports: ErrorReportStore,
}

impl ImportService {
    pub fn new(db: Arc<DatabaseConnection>, reports: ErrorReportStore) -> Self {
        Self { db, reports }
    }

    /// Runs the full validation pipeline and, when findings exist, persists
    /// the error report for later download.
    #[instrument(skip_all)]
    pub async fn validate(
        &self,
        products: &RawTable,
        inventory: &RawTable,
        sales: &RawTable,
    ) -> Result<ValidationReport, ServiceError> {
        let summary = DatasetSummary {
            products_rows: products.row_count(),
            inventory_rows: inventory.row_count(),
            sales_rows: sales.row_count(),
        };

        let findings = collect_findings(products, inventory, sales);
        info!(
            products = summary.products_rows,
            inventory = summary.inventory_rows,
            sales = summary.sales_rows,
            findings = findings.len(),
            "Validated import"
        );

        if findings.is_empty() {
            return Ok(ValidationReport {
                ok: true,
                summary,
                errors_count: 0,
                error_report_id: None,
                error_report_url: None,
                errors_preview: Vec::new(),
            });
        }

        let report_id = self.reports.write(&findings).await?;
        let errors_preview = findings
            .iter()
            .take(ERRORS_PREVIEW_LIMIT)
            .cloned()
            .collect();

        Ok(ValidationReport {
            ok: false,
            summary,
            errors_count: findings.len(),
            error_report_url: Some(format!("{}/{}", ERROR_REPORT_PATH, report_id)),
            error_report_id: Some(report_id),
            errors_preview,
        })
    }

    /// Merges the three tables into the store inside one transaction.
    ///
    /// Only the structural gate is re-checked here; row-level validation is
    /// the caller's responsibility via [`Self::validate`]. Products and
    /// inventory replace existing rows by sku; sales conflicting on
    /// (sku, sold_on) are dropped, first-committed wins.
    #[instrument(skip_all)]
    pub async fn commit(
        &self,
        products: &RawTable,
        inventory: &RawTable,
        sales: &RawTable,
    ) -> Result<CommitReceipt, ServiceError> {
        let schema_gap = !products.missing_columns(REQUIRED_PRODUCTS).is_empty()
            || !inventory.missing_columns(REQUIRED_INVENTORY).is_empty()
            || !sales.missing_columns(REQUIRED_SALES).is_empty();
        if schema_gap {
            return Err(ServiceError::InvalidInput(
                "Missing required columns. Run /import/validate first.".to_string(),
            ));
        }

        let product_models: Vec<product::ActiveModel> = products
            .rows()
            .map(|row| product_model(products.name(), row))
            .collect::<Result<_, _>>()?;
        let inventory_models: Vec<inventory_level::ActiveModel> = inventory
            .rows()
            .map(|row| inventory_model(inventory.name(), row))
            .collect::<Result<_, _>>()?;
        let sale_models: Vec<sale::ActiveModel> = sales
            .rows()
            .map(|row| sale_model(sales.name(), row))
            .collect::<Result<_, _>>()?;

        let saved = SavedCounts {
            products_upserted: product_models.len(),
            inventory_upserted: inventory_models.len(),
            sales_attempted: sale_models.len(),
        };

        let txn = self.db.begin().await?;

        if !product_models.is_empty() {
            product::Entity::insert_many(product_models)
                .on_conflict(
                    OnConflict::column(product::Column::Sku)
                        .update_columns([
                            product::Column::Name,
                            product::Column::Category,
                            product::Column::Cost,
                            product::Column::Price,
                            product::Column::Supplier,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        if !inventory_models.is_empty() {
            inventory_level::Entity::insert_many(inventory_models)
                .on_conflict(
                    OnConflict::column(inventory_level::Column::Sku)
                        .update_columns([
                            inventory_level::Column::OnHand,
                            inventory_level::Column::ReorderPoint,
                            inventory_level::Column::LeadTimeDays,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        if !sale_models.is_empty() {
            sale::Entity::insert_many(sale_models)
                .on_conflict(
                    OnConflict::columns([sale::Column::Sku, sale::Column::SoldOn])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(
            products = saved.products_upserted,
            inventory = saved.inventory_upserted,
            sales = saved.sales_attempted,
            "Committed import"
        );

        Ok(CommitReceipt {
            ok: true,
            saved,
            note: DUPLICATE_NOTE.to_string(),
        })
    }
}

fn conversion_error(file: &str, row: u32, field: &str) -> ServiceError {
    ServiceError::InvalidInput(format!(
        "{} row {}: invalid {}; run /import/validate first",
        file, row, field
    ))
}

fn product_model(file: &str, row: TableRow<'_>) -> Result<product::ActiveModel, ServiceError> {
    let cost = parse_money(row.field("cost"))
        .ok_or_else(|| conversion_error(file, row.csv_row(), "cost"))?;
    let price = parse_money(row.field("price"))
        .ok_or_else(|| conversion_error(file, row.csv_row(), "price"))?;

    Ok(product::ActiveModel {
        sku: Set(row.field("sku").trim().to_string()),
        name: Set(row.field("name").to_string()),
        category: Set(row.field("category").to_string()),
        cost: Set(cost),
        price: Set(price),
        supplier: Set(row.field("supplier").to_string()),
        ..Default::default()
    })
}

fn inventory_model(
    file: &str,
    row: TableRow<'_>,
) -> Result<inventory_level::ActiveModel, ServiceError> {
    Ok(inventory_level::ActiveModel {
        sku: Set(row.field("sku").trim().to_string()),
        on_hand: Set(require_i32(file, row, "on_hand")?),
        reorder_point: Set(require_i32(file, row, "reorder_point")?),
        lead_time_days: Set(require_i32(file, row, "lead_time_days")?),
        ..Default::default()
    })
}

fn sale_model(file: &str, row: TableRow<'_>) -> Result<sale::ActiveModel, ServiceError> {
    let sold_on = parse_strict_date(row.field("ts").trim())
        .ok_or_else(|| conversion_error(file, row.csv_row(), "ts"))?;
    let unit_price = parse_money(row.field("unit_price"))
        .ok_or_else(|| conversion_error(file, row.csv_row(), "unit_price"))?;

    Ok(sale::ActiveModel {
        sku: Set(row.field("sku").trim().to_string()),
        sold_on: Set(sold_on),
        units: Set(require_i32(file, row, "units")?),
        unit_price: Set(unit_price),
        ..Default::default()
    })
}

fn require_i32(file: &str, row: TableRow<'_>, field: &str) -> Result<i32, ServiceError> {
    parse_int(row.field(field))
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| conversion_error(file, row.csv_row(), field))
}
