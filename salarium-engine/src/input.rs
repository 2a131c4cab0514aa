//! JSON row loading
//!
//! Rows arrive as the persistence layer returns them: a JSON array of job
//! objects, a JSON array of technician objects, and optionally an object
//! mapping technician id to display name.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use shared::models::{JobRecord, TechnicianId, TechnicianRecord};
use tracing::{debug, instrument};

use crate::utils::{ExportError, ExportResult};

async fn load_json<T: DeserializeOwned>(path: &Path) -> ExportResult<T> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExportError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| ExportError::Input {
        path: path.to_path_buf(),
        source,
    })
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_jobs(path: impl AsRef<Path>) -> ExportResult<Vec<JobRecord>> {
    let jobs: Vec<JobRecord> = load_json(path.as_ref()).await?;
    debug!(count = jobs.len(), "Loaded job rows");
    Ok(jobs)
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_technicians(path: impl AsRef<Path>) -> ExportResult<Vec<TechnicianRecord>> {
    let technicians: Vec<TechnicianRecord> = load_json(path.as_ref()).await?;
    debug!(count = technicians.len(), "Loaded technician rows");
    Ok(technicians)
}

/// `{"12": "Sam Smith", ...}`
pub async fn load_name_overrides(
    path: impl AsRef<Path>,
) -> ExportResult<HashMap<TechnicianId, String>> {
    load_json(path.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_report;
    use shared::models::JobStatus;
    use shared::money::RawAmount;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_jobs_with_nulls_and_unknown_status() {
        let file = write_temp(
            r#"[
                {"work_order_id": "WO-1", "work_order_date": "2025-01-05", "technician_id": 1,
                 "address": "1 Elm St", "category": "Chimney", "subtotal": 1000.0,
                 "parts_total_cost": null, "tip_amount": 20, "status": "done"},
                {"work_order_id": "WO-2", "status": "on_hold"}
            ]"#,
        );
        let jobs = load_jobs(file.path()).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].subtotal, Some(RawAmount::Float(1000.0)));
        assert_eq!(jobs[0].parts_total_cost, None);
        assert_eq!(jobs[0].tip_amount, Some(RawAmount::Integer(20)));
        assert_eq!(jobs[0].status, JobStatus::Done);
        assert_eq!(jobs[1].status, JobStatus::Other);
        assert_eq!(jobs[1].technician_id, None);
    }

    #[tokio::test]
    async fn test_load_jobs_with_string_amounts() {
        let jobs_file = write_temp(
            r#"[
                {"work_order_id": "WO-1", "work_order_date": "2025-01-05", "technician_id": 1,
                 "subtotal": "120.50", "parts_total_cost": "20.50", "status": "done"},
                {"work_order_id": "WO-2", "work_order_date": "2025-01-06", "technician_id": 1,
                 "subtotal": "abc", "tip_amount": "5", "status": "done"}
            ]"#,
        );
        let techs_file = write_temp(r#"[{"id": 1, "name": "Alice", "commission_rate": "50"}]"#);

        let jobs = load_jobs(jobs_file.path()).await.unwrap();
        let technicians = load_technicians(techs_file.path()).await.unwrap();
        assert_eq!(jobs.len(), 2);

        let report = build_report(&jobs, &technicians, None, "All Records");
        let d = |s: &str| s.parse::<rust_decimal::Decimal>().unwrap();
        assert_eq!(report.totals.job_count, 2);
        assert_eq!(report.totals.gross_revenue, d("120.50"));
        assert_eq!(report.totals.net_revenue, d("100"));
        assert_eq!(report.totals.tech_pay, d("50"));
        assert_eq!(report.totals.total_tips, d("5"));
    }

    #[tokio::test]
    async fn test_load_name_overrides() {
        let file = write_temp(r#"{"1": "Alice A.", "7": "Bob B."}"#);
        let overrides = load_name_overrides(file.path()).await.unwrap();
        assert_eq!(overrides.get(&7).map(String::as_str), Some("Bob B."));
    }

    #[tokio::test]
    async fn test_malformed_json_is_input_error() {
        let file = write_temp("[{not json");
        let err = load_technicians(file.path()).await.unwrap_err();
        assert!(matches!(err, ExportError::Input { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = load_jobs("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
