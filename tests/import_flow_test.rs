//! End-to-end import flows: validate, persist error reports, commit, and the
//! conflict policies on committed data.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stockroom_api::entities::{inventory_level, product, sale};
use stockroom_api::errors::ServiceError;
use stockroom_api::services::imports::ERRORS_PREVIEW_LIMIT;
use stockroom_api::services::reports::ErrorReportStore;
use stockroom_api::services::validation::FindingCode;

use common::{import_service, table, test_db};

const PRODUCTS_OK: &str = "sku,name,category,cost,price,supplier\n\
                           A1,Widget,Tools,5,10,Acme\n\
                           B2,Gadget,Tools,2,4,Blorg\n";
const INVENTORY_OK: &str = "sku,on_hand,reorder_point,lead_time_days\n\
                            A1,3,5,7\n\
                            B2,50,10,14\n";
const SALES_OK: &str = "sku,ts,units,unit_price\n\
                        A1,2026-07-27,30,10\n\
                        B2,2026-07-30,2,4\n";

#[tokio::test]
async fn clean_import_validates_ok_without_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let service = import_service(test_db().await, dir.path());

    let report = service
        .validate(
            &table("products.csv", PRODUCTS_OK),
            &table("inventory.csv", INVENTORY_OK),
            &table("sales.csv", SALES_OK),
        )
        .await
        .unwrap();

    assert!(report.ok);
    assert_eq!(report.errors_count, 0);
    assert!(report.errors_preview.is_empty());
    assert!(report.error_report_id.is_none());
    assert!(report.error_report_url.is_none());
    assert_eq!(report.summary.products_rows, 2);
    assert_eq!(report.summary.inventory_rows, 2);
    assert_eq!(report.summary.sales_rows, 2);
}

#[tokio::test]
async fn column_gap_reports_structural_findings_only() {
    let dir = tempfile::tempdir().unwrap();
    let service = import_service(test_db().await, dir.path());

    // The products row also violates price >= cost, which must stay
    // unreported while the sales header is incomplete.
    let products = table(
        "products.csv",
        "sku,name,category,cost,price,supplier\nA1,Widget,Tools,10,5,Acme\n",
    );
    let inventory = table("inventory.csv", INVENTORY_OK);
    let sales = table("sales.csv", "sku,ts\nA1,2026-07-27\n");

    let report = service.validate(&products, &inventory, &sales).await.unwrap();

    assert!(!report.ok);
    assert!(report.errors_count >= 1);
    assert!(report
        .errors_preview
        .iter()
        .all(|f| f.code == FindingCode::MissingColumns && f.row.is_none()));
}

#[tokio::test]
async fn commit_refuses_incomplete_schema_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db().await;
    let service = import_service(db.clone(), dir.path());

    let err = service
        .commit(
            &table("products.csv", PRODUCTS_OK),
            &table("inventory.csv", INVENTORY_OK),
            &table("sales.csv", "sku,ts\nA1,2026-07-27\n"),
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ServiceError::InvalidInput(msg) if msg.contains("Run /import/validate first")
    );

    assert_eq!(product::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(sale::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn findings_persist_as_downloadable_csv_report() {
    let dir = tempfile::tempdir().unwrap();
    let service = import_service(test_db().await, dir.path());

    let products = table(
        "products.csv",
        "sku,name,category,cost,price,supplier\nA1,Widget,Tools,10,5,Acme\n",
    );
    let inventory = table(
        "inventory.csv",
        "sku,on_hand,reorder_point,lead_time_days\nZZ,1,1,7\n",
    );
    let sales = table("sales.csv", "sku,ts,units,unit_price\nA1,2026-07-27,1,10\n");

    let report = service.validate(&products, &inventory, &sales).await.unwrap();
    assert!(!report.ok);
    assert_eq!(report.errors_count, 2);

    let report_id = report.error_report_id.expect("report id expected");
    let url = report.error_report_url.expect("report url expected");
    assert_eq!(url, format!("/import/error-report/{}", report_id));

    let store = ErrorReportStore::new(dir.path());
    let body = String::from_utf8(store.read(&report_id).await.unwrap()).unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "file,row,field,code,message,value,suggestion"
    );
    assert!(body.contains("PRICE_LT_COST"));
    assert!(body.contains("UNKNOWN_SKU"));
}

#[tokio::test]
async fn errors_preview_is_capped_while_count_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let service = import_service(test_db().await, dir.path());

    let mut csv = String::from("sku,name,category,cost,price,supplier\n");
    for i in 0..30 {
        csv.push_str(&format!("S{},Thing,Tools,oops,10,Acme\n", i));
    }
    let products = table("products.csv", &csv);
    let inventory = table("inventory.csv", "sku,on_hand,reorder_point,lead_time_days\n");
    let sales = table("sales.csv", "sku,ts,units,unit_price\n");

    let report = service.validate(&products, &inventory, &sales).await.unwrap();

    assert_eq!(report.errors_count, 30);
    assert_eq!(report.errors_preview.len(), ERRORS_PREVIEW_LIMIT);
}

#[tokio::test]
async fn commit_upserts_and_skips_duplicate_sales() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db().await;
    let service = import_service(db.clone(), dir.path());

    // Third sales row repeats (A1, 2026-07-27) with different numbers; the
    // first-seen row must win and the repeat must vanish silently.
    let sales = "sku,ts,units,unit_price\n\
                 A1,2026-07-27,30,10\n\
                 B2,2026-07-30,2,4\n\
                 A1,2026-07-27,99,99\n";

    let receipt = service
        .commit(
            &table("products.csv", PRODUCTS_OK),
            &table("inventory.csv", INVENTORY_OK),
            &table("sales.csv", sales),
        )
        .await
        .unwrap();

    assert!(receipt.ok);
    assert_eq!(receipt.saved.products_upserted, 2);
    assert_eq!(receipt.saved.inventory_upserted, 2);
    // Submitted count, not inserted count.
    assert_eq!(receipt.saved.sales_attempted, 3);

    assert_eq!(sale::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    let kept = sale::Entity::find()
        .filter(sale::Column::Sku.eq("A1"))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.units, 30);
    assert_eq!(kept.unit_price, dec!(10));
}

#[tokio::test]
async fn recommitting_replaces_products_and_inventory_by_sku() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db().await;
    let service = import_service(db.clone(), dir.path());

    let first = service
        .commit(
            &table("products.csv", PRODUCTS_OK),
            &table("inventory.csv", INVENTORY_OK),
            &table("sales.csv", SALES_OK),
        )
        .await
        .unwrap();
    assert!(first.ok);

    // Same skus, new mutable fields.
    let updated_products = "sku,name,category,cost,price,supplier\n\
                            A1,Widget Pro,Tools,6,12,Acme\n\
                            B2,Gadget,Tools,2,4,Blorg\n";
    let updated_inventory = "sku,on_hand,reorder_point,lead_time_days\n\
                             A1,8,5,7\n\
                             B2,50,10,14\n";

    let second = service
        .commit(
            &table("products.csv", updated_products),
            &table("inventory.csv", updated_inventory),
            &table("sales.csv", SALES_OK),
        )
        .await
        .unwrap();
    assert!(second.ok);
    assert_eq!(second.saved.products_upserted, 2);

    assert_eq!(product::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    let a1 = product::Entity::find()
        .filter(product::Column::Sku.eq("A1"))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a1.name, "Widget Pro");
    assert_eq!(a1.price, dec!(12));

    let level = inventory_level::Entity::find()
        .filter(inventory_level::Column::Sku.eq("A1"))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.on_hand, 8);

    // Sales were duplicates of the first commit and stayed put.
    assert_eq!(sale::Entity::find().count(db.as_ref()).await.unwrap(), 2);
}

#[tokio::test]
async fn identical_commits_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db().await;
    let service = import_service(db.clone(), dir.path());

    for _ in 0..2 {
        let receipt = service
            .commit(
                &table("products.csv", PRODUCTS_OK),
                &table("inventory.csv", INVENTORY_OK),
                &table("sales.csv", SALES_OK),
            )
            .await
            .unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.saved.products_upserted, 2);
        assert_eq!(receipt.saved.sales_attempted, 2);
    }

    assert_eq!(product::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    assert_eq!(
        inventory_level::Entity::find().count(db.as_ref()).await.unwrap(),
        2
    );
    assert_eq!(sale::Entity::find().count(db.as_ref()).await.unwrap(), 2);
}

#[tokio::test]
async fn commit_aborts_on_unconvertible_cells() {
    let dir = tempfile::tempdir().unwrap();
    let db = test_db().await;
    let service = import_service(db.clone(), dir.path());

    let bad_products = "sku,name,category,cost,price,supplier\nA1,Widget,Tools,oops,10,Acme\n";

    let err = service
        .commit(
            &table("products.csv", bad_products),
            &table("inventory.csv", INVENTORY_OK),
            &table("sales.csv", SALES_OK),
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ServiceError::InvalidInput(msg) if msg.contains("cost") && msg.contains("validate")
    );
    assert_eq!(product::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(
        inventory_level::Entity::find().count(db.as_ref()).await.unwrap(),
        0
    );
}
