//! Job Model (completed service work orders)

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::technician::TechnicianId;
use crate::money::RawAmount;

/// Job lifecycle status
///
/// Only `Done` jobs participate in financial figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Done,
    Pending,
    Cancelled,
    /// Any status string the dashboard does not know about
    #[serde(other)]
    Other,
}

/// Job row as supplied by the query layer
///
/// Monetary fields are nullable in the database and may arrive as numbers or
/// numeric strings; the aggregation engine treats null and non-numeric
/// values as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub work_order_id: String,
    /// Calendar date (YYYY-MM-DD or RFC 3339 timestamp)
    #[serde(default)]
    pub work_order_date: Option<String>,
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Gross amount charged
    #[serde(default)]
    pub subtotal: Option<RawAmount>,
    #[serde(default)]
    pub parts_total_cost: Option<RawAmount>,
    #[serde(default)]
    pub tip_amount: Option<RawAmount>,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }

    /// Parse `work_order_date`; malformed or missing dates yield `None`
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.work_order_date.as_deref().and_then(parse_work_order_date)
    }
}

/// Parse a work order date (`2025-03-14` or `2025-03-14T09:30:00Z`)
pub fn parse_work_order_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            // Timestamps without offset, e.g. "2025-03-14T09:30:00"
            value
                .split_once('T')
                .and_then(|(date, _)| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(date: Option<&str>, status: JobStatus) -> JobRecord {
        JobRecord {
            work_order_id: "WO-1".to_string(),
            work_order_date: date.map(str::to_string),
            technician_id: None,
            address: None,
            category: None,
            subtotal: None,
            parts_total_cost: None,
            tip_amount: None,
            status,
        }
    }

    #[test]
    fn test_parse_plain_date() {
        let j = job(Some("2025-03-14"), JobStatus::Done);
        assert_eq!(j.parsed_date(), NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[test]
    fn test_parse_timestamp_dates() {
        assert_eq!(
            parse_work_order_date("2025-03-14T23:30:00+00:00"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
        assert_eq!(
            parse_work_order_date("2025-03-14T09:30:00"),
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn test_malformed_dates_are_absent() {
        assert_eq!(job(Some("14/03/2025"), JobStatus::Done).parsed_date(), None);
        assert_eq!(job(Some("2025-02-30"), JobStatus::Done).parsed_date(), None);
        assert_eq!(job(Some(""), JobStatus::Done).parsed_date(), None);
        assert_eq!(job(None, JobStatus::Done).parsed_date(), None);
    }

    #[test]
    fn test_status_deserialization() {
        let row = r#"{"work_order_id":"A1","status":"done","subtotal":120.5}"#;
        let job: JobRecord = serde_json::from_str(row).unwrap();
        assert!(job.is_done());
        assert_eq!(job.subtotal, Some(RawAmount::Float(120.5)));
        assert_eq!(job.technician_id, None);

        let row = r#"{"work_order_id":"A2","status":"on_hold"}"#;
        let job: JobRecord = serde_json::from_str(row).unwrap();
        assert_eq!(job.status, JobStatus::Other);
        assert!(!job.is_done());
    }

    #[test]
    fn test_money_fields_accept_strings() {
        let row = r#"{"work_order_id":"A3","status":"done","subtotal":"120.50",
                      "parts_total_cost":"abc","tip_amount":null}"#;
        let job: JobRecord = serde_json::from_str(row).unwrap();
        assert_eq!(job.subtotal, Some(RawAmount::Text("120.50".to_string())));
        assert_eq!(job.parts_total_cost, Some(RawAmount::Text("abc".to_string())));
        assert_eq!(job.tip_amount, None);
    }
}
