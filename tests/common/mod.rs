//! Shared harness for integration tests: in-memory SQLite store plus table
//! loading shorthand.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use stockroom_api::db::run_migrations;
use stockroom_api::services::imports::ImportService;
use stockroom_api::services::reports::ErrorReportStore;
use stockroom_api::tabular::{load_table, RawTable};

/// Fresh migrated in-memory database.
///
/// The pool is pinned to a single connection: every pooled connection to
/// `sqlite::memory:` would otherwise get its own empty database.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1);

    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory database");
    run_migrations(&db).await.expect("failed to run migrations");
    Arc::new(db)
}

pub fn table(name: &str, csv: &str) -> RawTable {
    load_table(name, csv.as_bytes()).expect("test table should load")
}

pub fn import_service(db: Arc<DatabaseConnection>, report_dir: &Path) -> ImportService {
    ImportService::new(db, ErrorReportStore::new(report_dir))
}
