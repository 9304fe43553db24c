//! Error report sink: persists validation findings as a CSV export keyed by
//! an opaque report id, retrievable until the report directory is cleaned.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::validation::ValidationFinding;

/// Column order of the persisted export. Every finding field is serialized,
/// including empty ones; `row` is blank for dataset-wide findings.
const EXPORT_HEADER: [&str; 7] = ["file", "row", "field", "code", "message", "value", "suggestion"];

#[derive(Debug, Clone)]
pub struct ErrorReportStore {
    dir: PathBuf,
}

impl ErrorReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", id))
    }

    /// Serializes the findings and persists them under a fresh report id.
    pub async fn write(&self, findings: &[ValidationFinding]) -> Result<String, ServiceError> {
        let report_id = Uuid::new_v4().simple().to_string();
        let body = render_csv(findings)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ServiceError::InternalError(format!("failed to create report directory: {}", e))
        })?;
        tokio::fs::write(self.path_for(&report_id), body)
            .await
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to persist error report: {}", e))
            })?;

        info!(report_id = %report_id, findings = findings.len(), "Persisted validation error report");
        Ok(report_id)
    }

    /// Reads a previously persisted export back. Unknown or malformed ids
    /// surface as not-found rather than leaking filesystem details.
    pub async fn read(&self, report_id: &str) -> Result<Vec<u8>, ServiceError> {
        let parsed = Uuid::parse_str(report_id)
            .map_err(|_| ServiceError::NotFound("Error report not found".to_string()))?;

        let path = self.path_for(&parsed.simple().to_string());
        read_report_file(&path).await
    }
}

async fn read_report_file(path: &Path) -> Result<Vec<u8>, ServiceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ServiceError::NotFound("Error report not found".to_string()))
        }
        Err(e) => Err(ServiceError::InternalError(format!(
            "failed to read error report: {}",
            e
        ))),
    }
}

/// Renders findings as CSV with a stable column order.
fn render_csv(findings: &[ValidationFinding]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADER)
        .map_err(csv_error)?;

    for finding in findings {
        let row = finding.row.map(|r| r.to_string()).unwrap_or_default();
        writer
            .write_record([
                finding.file.as_str(),
                row.as_str(),
                finding.field.as_str(),
                finding.code.as_str(),
                finding.message.as_str(),
                finding.value.as_str(),
                finding.suggestion.as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("failed to render error report: {}", e)))
}

fn csv_error(e: csv::Error) -> ServiceError {
    ServiceError::InternalError(format!("failed to render error report: {}", e))
}
