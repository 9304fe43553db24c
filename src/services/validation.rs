//! Validation pipeline: structural, row-level, and cross-dataset checks.
//!
//! Validators never fail fast below the structural stage: every rule runs on
//! every row and each failure becomes one [`ValidationFinding`], so a single
//! pass over an import surfaces every defect. Only a missing required column
//! stops the pipeline, since field access against an incomplete header is
//! meaningless.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tabular::RawTable;

/// Required header sets per dataset.
pub const REQUIRED_PRODUCTS: &[&str] = &["sku", "name", "category", "cost", "price", "supplier"];
pub const REQUIRED_INVENTORY: &[&str] = &["sku", "on_hand", "reorder_point", "lead_time_days"];
pub const REQUIRED_SALES: &[&str] = &["sku", "ts", "units", "unit_price"];

/// Stable finding codes surfaced to import clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    MissingColumns,
    Required,
    BadNumber,
    BadInt,
    OutOfRange,
    PriceLtCost,
    BadDate,
    UnknownSku,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingColumns => "MISSING_COLUMNS",
            Self::Required => "REQUIRED",
            Self::BadNumber => "BAD_NUMBER",
            Self::BadInt => "BAD_INT",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::PriceLtCost => "PRICE_LT_COST",
            Self::BadDate => "BAD_DATE",
            Self::UnknownSku => "UNKNOWN_SKU",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One defect detected during import validation.
///
/// `row` is `None` for dataset-wide findings (missing columns); otherwise it
/// is the 1-based source position including the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationFinding {
    pub file: String,
    pub row: Option<u32>,
    pub field: String,
    pub code: FindingCode,
    pub message: String,
    pub value: String,
    pub suggestion: String,
}

impl ValidationFinding {
    fn new(
        file: &str,
        row: Option<u32>,
        field: &str,
        code: FindingCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.to_string(),
            row,
            field: field.to_string(),
            code,
            message: message.into(),
            value: String::new(),
            suggestion: String::new(),
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }
}

/// Parses a money field. `Decimal` parsing rejects NaN/infinity outright,
/// which is exactly what we want for prices and costs.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Parses an integer field.
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Parses a strict `YYYY-MM-DD` calendar date. Zero-padding is mandatory:
/// a value that parses but does not round-trip to the same string (e.g.
/// `2026-1-3`) is rejected rather than guessed at.
pub fn parse_strict_date(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    if date.format("%Y-%m-%d").to_string() == raw {
        Some(date)
    } else {
        None
    }
}

/// Structural check: one `MISSING_COLUMNS` finding when any required header
/// is absent, none otherwise.
pub fn missing_column_findings(table: &RawTable, required: &[&str]) -> Vec<ValidationFinding> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Vec::new();
    }

    vec![ValidationFinding::new(
        table.name(),
        None,
        "*",
        FindingCode::MissingColumns,
        "Missing required columns",
    )
    .with_value(missing.join(","))
    .with_suggestion("Add these columns to the header.")]
}

/// Row rules for the products dataset.
pub fn validate_products(table: &RawTable) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let file = table.name();

    for row in table.rows() {
        let csv_row = Some(row.csv_row());

        if row.field("sku").trim().is_empty() {
            findings.push(
                ValidationFinding::new(file, csv_row, "sku", FindingCode::Required, "sku is required")
                    .with_suggestion("Provide a non-empty sku."),
            );
        }

        let cost = parse_money(row.field("cost"));
        if cost.is_none() {
            findings.push(
                ValidationFinding::new(
                    file,
                    csv_row,
                    "cost",
                    FindingCode::BadNumber,
                    "cost must be a number",
                )
                .with_value(row.field("cost")),
            );
        }

        let price = parse_money(row.field("price"));
        if price.is_none() {
            findings.push(
                ValidationFinding::new(
                    file,
                    csv_row,
                    "price",
                    FindingCode::BadNumber,
                    "price must be a number",
                )
                .with_value(row.field("price")),
            );
        }

        if let (Some(cost), Some(price)) = (cost, price) {
            if price < cost {
                findings.push(
                    ValidationFinding::new(
                        file,
                        csv_row,
                        "price",
                        FindingCode::PriceLtCost,
                        "price must be >= cost",
                    )
                    .with_value(format!("{} < {}", price, cost))
                    .with_suggestion("Raise price or correct cost."),
                );
            }
        }
    }

    findings
}

/// Row rules for the inventory dataset.
pub fn validate_inventory(table: &RawTable) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let file = table.name();

    for row in table.rows() {
        let csv_row = row.csv_row();

        check_non_negative_int(file, csv_row, "on_hand", row.field("on_hand"), &mut findings);
        check_non_negative_int(
            file,
            csv_row,
            "reorder_point",
            row.field("reorder_point"),
            &mut findings,
        );

        let raw = row.field("lead_time_days");
        match parse_int(raw) {
            None => findings.push(
                ValidationFinding::new(
                    file,
                    Some(csv_row),
                    "lead_time_days",
                    FindingCode::BadInt,
                    "lead_time_days must be an integer",
                )
                .with_value(raw),
            ),
            Some(days) if !(1..=90).contains(&days) => findings.push(
                ValidationFinding::new(
                    file,
                    Some(csv_row),
                    "lead_time_days",
                    FindingCode::OutOfRange,
                    "lead_time_days must be between 1 and 90",
                )
                .with_value(raw)
                .with_suggestion("Use a value 1-90."),
            ),
            Some(_) => {}
        }
    }

    findings
}

/// Row rules for the sales dataset.
pub fn validate_sales(table: &RawTable) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let file = table.name();

    for row in table.rows() {
        let csv_row = row.csv_row();

        let ts = row.field("ts").trim();
        if parse_strict_date(ts).is_none() {
            findings.push(
                ValidationFinding::new(
                    file,
                    Some(csv_row),
                    "ts",
                    FindingCode::BadDate,
                    "ts must be YYYY-MM-DD",
                )
                .with_value(ts)
                .with_suggestion("Use ISO like 2026-01-31."),
            );
        }

        check_non_negative_int(file, csv_row, "units", row.field("units"), &mut findings);

        let raw_price = row.field("unit_price");
        if parse_money(raw_price).is_none() {
            findings.push(
                ValidationFinding::new(
                    file,
                    Some(csv_row),
                    "unit_price",
                    FindingCode::BadNumber,
                    "unit_price must be a number",
                )
                .with_value(raw_price),
            );
        }
    }

    findings
}

fn check_non_negative_int(
    file: &str,
    csv_row: u32,
    field: &str,
    raw: &str,
    findings: &mut Vec<ValidationFinding>,
) {
    match parse_int(raw) {
        None => findings.push(
            ValidationFinding::new(
                file,
                Some(csv_row),
                field,
                FindingCode::BadInt,
                format!("{} must be an integer >= 0", field),
            )
            .with_value(raw),
        ),
        Some(value) if value < 0 => findings.push(
            ValidationFinding::new(
                file,
                Some(csv_row),
                field,
                FindingCode::OutOfRange,
                format!("{} must be >= 0", field),
            )
            .with_value(raw),
        ),
        Some(_) => {}
    }
}

/// Referential check: every non-empty inventory/sales sku must exist in the
/// products table. Empty skus are left to the row-level rules.
pub fn check_sku_references(
    products: &RawTable,
    inventory: &RawTable,
    sales: &RawTable,
) -> Vec<ValidationFinding> {
    let known: HashSet<String> = products
        .rows()
        .map(|row| row.field("sku").trim().to_string())
        .collect();

    let mut findings = Vec::new();
    for table in [inventory, sales] {
        for row in table.rows() {
            let sku = row.field("sku").trim();
            if !sku.is_empty() && !known.contains(sku) {
                findings.push(
                    ValidationFinding::new(
                        table.name(),
                        Some(row.csv_row()),
                        "sku",
                        FindingCode::UnknownSku,
                        "sku not found in products.csv",
                    )
                    .with_value(sku)
                    .with_suggestion("Fix sku to match products.csv."),
                );
            }
        }
    }

    findings
}

/// Runs the full pipeline over the three tables in detection order.
///
/// A structural failure on any dataset short-circuits: only the
/// `MISSING_COLUMNS` findings are reported, since row-level checks against an
/// incomplete table would be undefined.
pub fn collect_findings(
    products: &RawTable,
    inventory: &RawTable,
    sales: &RawTable,
) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    findings.extend(missing_column_findings(products, REQUIRED_PRODUCTS));
    findings.extend(missing_column_findings(inventory, REQUIRED_INVENTORY));
    findings.extend(missing_column_findings(sales, REQUIRED_SALES));

    if !findings.is_empty() {
        return findings;
    }

    findings.extend(validate_products(products));
    findings.extend(validate_inventory(inventory));
    findings.extend(validate_sales(sales));
    findings.extend(check_sku_references(products, inventory, sales));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::load_table;

    fn table(name: &str, csv: &str) -> RawTable {
        load_table(name, csv.as_bytes()).unwrap()
    }

    fn valid_products() -> RawTable {
        table(
            "products.csv",
            "sku,name,category,cost,price,supplier\n\
             A1,Widget,Tools,5,10,Acme\n\
             B2,Gadget,Tools,3.50,7.25,Acme\n",
        )
    }

    fn valid_inventory() -> RawTable {
        table(
            "inventory.csv",
            "sku,on_hand,reorder_point,lead_time_days\nA1,3,5,7\nB2,40,10,14\n",
        )
    }

    fn valid_sales() -> RawTable {
        table(
            "sales.csv",
            "sku,ts,units,unit_price\nA1,2026-07-27,30,10\nB2,2026-07-30,2,7.25\n",
        )
    }

    #[test]
    fn clean_import_yields_no_findings() {
        let findings = collect_findings(&valid_products(), &valid_inventory(), &valid_sales());
        assert!(findings.is_empty());
    }

    #[test]
    fn missing_columns_short_circuit_row_checks() {
        // price < cost would be a row finding, but the sales header gap must
        // suppress everything below the structural stage.
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\nA1,Widget,Tools,10,5,Acme\n",
        );
        let sales = table("sales.csv", "sku,ts\nA1,2026-07-27\n");

        let findings = collect_findings(&products, &valid_inventory(), &sales);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::MissingColumns);
        assert_eq!(findings[0].file, "sales.csv");
        assert_eq!(findings[0].row, None);
        assert_eq!(findings[0].field, "*");
        assert_eq!(findings[0].value, "unit_price,units");
    }

    #[test]
    fn each_incomplete_dataset_reports_once() {
        let products = table("products.csv", "sku\nA1\n");
        let inventory = table("inventory.csv", "sku\nA1\n");
        let sales = table("sales.csv", "sku\nA1\n");

        let findings = collect_findings(&products, &inventory, &sales);
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.code == FindingCode::MissingColumns));
        let files: Vec<&str> = findings.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, ["products.csv", "inventory.csv", "sales.csv"]);
    }

    #[test]
    fn empty_sku_is_required() {
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\n  ,Widget,Tools,5,10,Acme\n",
        );
        let findings = validate_products(&products);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::Required);
        assert_eq!(findings[0].field, "sku");
        assert_eq!(findings[0].row, Some(2));
    }

    #[test]
    fn one_row_can_carry_multiple_findings() {
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\n,Widget,Tools,abc,xyz,Acme\n",
        );
        let findings = validate_products(&products);
        let codes: Vec<FindingCode> = findings.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            [
                FindingCode::Required,
                FindingCode::BadNumber,
                FindingCode::BadNumber
            ]
        );
        assert!(findings.iter().all(|f| f.row == Some(2)));
    }

    #[test]
    fn price_below_cost_is_flagged_per_row() {
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\n\
             A1,Widget,Tools,10,5,Acme\n\
             B2,Gadget,Tools,3,9,Acme\n",
        );
        let findings = validate_products(&products);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::PriceLtCost);
        assert_eq!(findings[0].row, Some(2));
        assert_eq!(findings[0].value, "5 < 10");
    }

    #[test]
    fn price_cost_rule_skipped_when_either_side_unparseable() {
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\nA1,Widget,Tools,oops,5,Acme\n",
        );
        let findings = validate_products(&products);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::BadNumber);
    }

    #[test]
    fn money_parsing_rejects_nan_and_infinity() {
        assert!(parse_money("NaN").is_none());
        assert!(parse_money("inf").is_none());
        assert!(parse_money(" 7.25 ").is_some());
    }

    #[test]
    fn unparseable_and_negative_ints_get_distinct_codes() {
        let inventory = table(
            "inventory.csv",
            "sku,on_hand,reorder_point,lead_time_days\nA1,abc,-2,7\n",
        );
        let findings = validate_inventory(&inventory);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].code, FindingCode::BadInt);
        assert_eq!(findings[0].field, "on_hand");
        assert_eq!(findings[1].code, FindingCode::OutOfRange);
        assert_eq!(findings[1].field, "reorder_point");
    }

    #[test]
    fn lead_time_bounds_are_closed() {
        let inventory = table(
            "inventory.csv",
            "sku,on_hand,reorder_point,lead_time_days\n\
             A1,1,1,0\n\
             B2,1,1,1\n\
             C3,1,1,90\n\
             D4,1,1,91\n\
             E5,1,1,ninety\n",
        );
        let findings = validate_inventory(&inventory);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].row, Some(2));
        assert_eq!(findings[0].code, FindingCode::OutOfRange);
        assert_eq!(findings[1].row, Some(5));
        assert_eq!(findings[1].code, FindingCode::OutOfRange);
        assert_eq!(findings[2].row, Some(6));
        assert_eq!(findings[2].code, FindingCode::BadInt);
    }

    #[test]
    fn impossible_calendar_date_is_rejected_with_header_offset() {
        let sales = table("sales.csv", "sku,ts,units,unit_price\nA1,2026-13-01,3,10\n");
        let findings = validate_sales(&sales);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::BadDate);
        // 1-based data position (1) + header offset = 2.
        assert_eq!(findings[0].row, Some(2));
        assert_eq!(findings[0].value, "2026-13-01");
    }

    #[test]
    fn lenient_date_shapes_are_rejected() {
        assert!(parse_strict_date("2026-1-3").is_none());
        assert!(parse_strict_date("2026-01-03T00:00").is_none());
        assert!(parse_strict_date("01/03/2026").is_none());
        assert!(parse_strict_date("2026-02-29").is_none());
        assert_eq!(
            parse_strict_date("2028-02-29"),
            NaiveDate::from_ymd_opt(2028, 2, 29)
        );
    }

    #[test]
    fn unknown_sku_reported_for_inventory_and_sales() {
        let inventory = table(
            "inventory.csv",
            "sku,on_hand,reorder_point,lead_time_days\nZZ,1,1,7\n",
        );
        let sales = table("sales.csv", "sku,ts,units,unit_price\nYY,2026-07-27,1,2\n");

        let findings = check_sku_references(&valid_products(), &inventory, &sales);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].file, "inventory.csv");
        assert_eq!(findings[0].value, "ZZ");
        assert_eq!(findings[1].file, "sales.csv");
        assert_eq!(findings[1].value, "YY");
        assert!(findings.iter().all(|f| f.code == FindingCode::UnknownSku));
    }

    #[test]
    fn empty_sku_is_not_double_reported_by_reference_check() {
        let sales = table("sales.csv", "sku,ts,units,unit_price\n ,2026-07-27,1,2\n");
        let findings = check_sku_references(&valid_products(), &valid_inventory(), &sales);
        assert!(findings.is_empty());
    }

    #[test]
    fn sku_matching_trims_whitespace() {
        let sales = table("sales.csv", "sku,ts,units,unit_price\n A1 ,2026-07-27,1,2\n");
        let findings = check_sku_references(&valid_products(), &valid_inventory(), &sales);
        assert!(findings.is_empty());
    }

    #[test]
    fn findings_accumulate_in_stage_then_dataset_order() {
        let products = table(
            "products.csv",
            "sku,name,category,cost,price,supplier\nA1,Widget,Tools,10,5,Acme\n",
        );
        let inventory = table(
            "inventory.csv",
            "sku,on_hand,reorder_point,lead_time_days\nZZ,-1,1,7\n",
        );
        let sales = table("sales.csv", "sku,ts,units,unit_price\nYY,bad,1,2\n");

        let findings = collect_findings(&products, &inventory, &sales);
        let summary: Vec<(&str, FindingCode)> = findings
            .iter()
            .map(|f| (f.file.as_str(), f.code))
            .collect();
        assert_eq!(
            summary,
            [
                ("products.csv", FindingCode::PriceLtCost),
                ("inventory.csv", FindingCode::OutOfRange),
                ("sales.csv", FindingCode::BadDate),
                ("inventory.csv", FindingCode::UnknownSku),
                ("sales.csv", FindingCode::UnknownSku),
            ]
        );
    }

    #[test]
    fn finding_codes_serialize_as_stable_strings() {
        let json = serde_json::to_string(&FindingCode::PriceLtCost).unwrap();
        assert_eq!(json, "\"PRICE_LT_COST\"");
        assert_eq!(FindingCode::MissingColumns.as_str(), "MISSING_COLUMNS");
        assert_eq!(FindingCode::UnknownSku.to_string(), "UNKNOWN_SKU");
    }
}
