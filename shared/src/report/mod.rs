//! Financial Report Model
//!
//! The `Report` is the contract between the aggregation engine and the
//! document renderers. It is built fresh for every export, never mutated
//! afterwards, and carries every figure a renderer prints. Renderers only
//! format and lay out these values.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TechnicianId;
use crate::money::{self, MoneyResult, MoneySplit};

/// Display name for jobs without a (known) technician
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Period string used when the scope holds no completed jobs
pub const NO_COMPLETED_JOBS: &str = "No completed jobs in selected period";

/// Period string when completed jobs exist but none carries a valid date
pub const NO_DATED_JOBS: &str = "Date range unavailable";

/// Stable grouping key for technician rollups
///
/// Grouping by id keeps two technicians that share a display name apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TechnicianKey {
    Assigned(TechnicianId),
    Unassigned,
}

/// Calendar month bucket (orders chronologically)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Sort key, e.g. "2025-03"
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Long label, e.g. "March 2025"
    pub fn label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.key())
    }

    /// Short label, e.g. "Mar 2025"
    pub fn short_label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| self.key())
    }
}

/// Job count plus the six monetary sums shared by every rollup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub job_count: usize,
    pub gross_revenue: Decimal,
    pub parts_cost: Decimal,
    pub tips: Decimal,
    pub net_revenue: Decimal,
    pub tech_pay: Decimal,
    pub company_net: Decimal,
}

impl Rollup {
    /// Fold one job into the running sums
    ///
    /// On overflow the rollup is left unchanged.
    pub fn add_job(
        &mut self,
        gross: Decimal,
        parts: Decimal,
        tip: Decimal,
        split: &MoneySplit,
    ) -> MoneyResult<()> {
        *self = Rollup {
            job_count: self.job_count + 1,
            gross_revenue: money::add(self.gross_revenue, gross)?,
            parts_cost: money::add(self.parts_cost, parts)?,
            tips: money::add(self.tips, tip)?,
            net_revenue: money::add(self.net_revenue, split.net)?,
            tech_pay: money::add(self.tech_pay, split.tech_pay)?,
            company_net: money::add(self.company_net, split.company_net)?,
        };
        Ok(())
    }
}

/// Scalar report totals
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub job_count: usize,
    pub gross_revenue: Decimal,
    pub parts_cost: Decimal,
    pub net_revenue: Decimal,
    pub tech_pay: Decimal,
    pub company_net: Decimal,
    pub total_tips: Decimal,
    /// Gross / job count (0 when there are no jobs)
    pub avg_revenue_per_job: Decimal,
    /// Company net / gross × 100, one decimal place (0 when gross is 0)
    pub company_net_margin_pct: Decimal,
    /// Gross of the most recent month in scope (0 when there are no dated jobs)
    pub latest_month_gross: Decimal,
}

/// One row per technician (or the unassigned bucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianAggregate {
    pub key: TechnicianKey,
    pub name: String,
    pub commission_rate: Decimal,
    /// e.g. "75% Co / 25% Tech"
    pub split_label: String,
    #[serde(flatten)]
    pub sums: Rollup,
    /// Company net / gross × 100 for this technician
    pub company_net_pct: Decimal,
}

/// One row per calendar month in scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub label: String,
    #[serde(flatten)]
    pub sums: Rollup,
    /// Month gross / grand total gross × 100
    pub pct_of_total: Decimal,
    /// Month company net / month gross × 100
    pub company_net_pct: Decimal,
}

/// Per-job breakdown inside a technician detail group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetailRow {
    pub work_order_id: String,
    pub date: Option<NaiveDate>,
    pub address: String,
    pub category: Option<String>,
    /// e.g. "Mar 2025", empty when the job has no valid date
    pub month_label: String,
    pub gross_revenue: Decimal,
    pub parts_cost: Decimal,
    pub tip: Decimal,
    pub net_revenue: Decimal,
    pub tech_pay: Decimal,
    pub company_net: Decimal,
}

/// Every job of one technician, ordered by date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechJobDetailGroup {
    pub key: TechnicianKey,
    pub technician_name: String,
    pub commission_rate: Decimal,
    pub split_label: String,
    pub jobs: Vec<JobDetailRow>,
    /// Equals the sum of `jobs`
    pub totals: Rollup,
}

/// Complete financial report for one export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    /// e.g. "Current Filter" or "All Records"
    pub scope_label: String,
    /// "<long date> — <long date>" or [`NO_COMPLETED_JOBS`]
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    /// Sorted by gross descending
    pub technicians: Vec<TechnicianAggregate>,
    /// Sorted chronologically
    pub monthly: Vec<MonthlyAggregate>,
    /// Sorted by group gross descending
    pub job_details: Vec<TechJobDetailGroup>,
}

impl Report {
    pub fn has_jobs(&self) -> bool {
        self.totals.job_count > 0
    }

    /// Most recent month in scope
    pub fn latest_month(&self) -> Option<&MonthlyAggregate> {
        self.monthly.last()
    }

    /// Human-readable generation timestamp
    pub fn generated_label(&self) -> String {
        self.generated_at.format("%B %-d, %Y %H:%M UTC").to_string()
    }
}
