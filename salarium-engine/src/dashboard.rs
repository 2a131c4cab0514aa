//! Dashboard summary
//!
//! KPI cards and chart series for the dashboard page. Everything is read off
//! a built [`Report`] so the dashboard, the tables and the exported
//! documents always show the same money.

use rust_decimal::Decimal;
use serde::Serialize;
use shared::money::{Precision, to_f64, to_number};
use shared::report::Report;

/// One KPI card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: f64,
    pub kind: KpiKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiKind {
    Currency,
    Percent,
    Count,
}

/// Bar chart point: revenue by technician
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianBar {
    pub name: String,
    pub gross: f64,
    pub company_net: f64,
    pub tech_pay: f64,
}

/// Line/area chart point: one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub gross: f64,
    /// Clamped at zero; the report totals are not
    pub company_net: f64,
    pub jobs: usize,
}

/// Everything the dashboard page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: Vec<KpiCard>,
    pub technician_bars: Vec<TechnicianBar>,
    pub monthly_series: Vec<MonthlyPoint>,
}

impl DashboardSummary {
    pub fn from_report(report: &Report) -> Self {
        let t = &report.totals;
        let kpis = vec![
            KpiCard {
                label: "Gross Revenue",
                value: to_f64(t.gross_revenue),
                kind: KpiKind::Currency,
            },
            KpiCard {
                label: "Company Net",
                value: to_f64(t.company_net),
                kind: KpiKind::Currency,
            },
            KpiCard {
                label: "Net Margin",
                value: to_number(t.company_net_margin_pct, Precision::Places(1)),
                kind: KpiKind::Percent,
            },
            KpiCard {
                label: "Completed Jobs",
                value: t.job_count as f64,
                kind: KpiKind::Count,
            },
            KpiCard {
                label: "Avg / Job",
                value: to_f64(t.avg_revenue_per_job),
                kind: KpiKind::Currency,
            },
            KpiCard {
                label: "Tips",
                value: to_f64(t.total_tips),
                kind: KpiKind::Currency,
            },
            KpiCard {
                label: "Latest Month",
                value: to_f64(t.latest_month_gross),
                kind: KpiKind::Currency,
            },
        ];

        let technician_bars = report
            .technicians
            .iter()
            .map(|row| TechnicianBar {
                name: row.name.clone(),
                gross: to_f64(row.sums.gross_revenue),
                company_net: to_f64(row.sums.company_net),
                tech_pay: to_f64(row.sums.tech_pay),
            })
            .collect();

        let monthly_series = report
            .monthly
            .iter()
            .map(|m| MonthlyPoint {
                month: m.month.short_label(),
                gross: to_f64(m.sums.gross_revenue),
                company_net: to_f64(m.sums.company_net.max(Decimal::ZERO)),
                jobs: m.sums.job_count,
            })
            .collect();

        Self {
            kpis,
            technician_bars,
            monthly_series,
        }
    }

    pub fn kpi(&self, label: &str) -> Option<&KpiCard> {
        self.kpis.iter().find(|k| k.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_report;
    use shared::models::{JobRecord, JobStatus, TechnicianRecord};
    use shared::money::RawAmount;

    fn job(id: &str, date: &str, subtotal: f64, parts: f64) -> JobRecord {
        JobRecord {
            work_order_id: id.to_string(),
            work_order_date: Some(date.to_string()),
            technician_id: Some(1),
            address: None,
            category: None,
            subtotal: Some(subtotal.into()),
            parts_total_cost: Some(parts.into()),
            tip_amount: None,
            status: JobStatus::Done,
        }
    }

    fn technicians() -> Vec<TechnicianRecord> {
        vec![TechnicianRecord {
            id: 1,
            name: "Alice".to_string(),
            commission_rate: Some(RawAmount::Float(75.0)),
        }]
    }

    #[test]
    fn test_kpis_match_report_totals() {
        let jobs = vec![
            job("A", "2025-01-10", 1000.0, 100.0),
            job("B", "2025-01-15", 500.0, 0.0),
        ];
        let report = build_report(&jobs, &technicians(), None, "All Records");
        let summary = DashboardSummary::from_report(&report);

        assert_eq!(summary.kpi("Gross Revenue").unwrap().value, 1500.0);
        assert_eq!(summary.kpi("Company Net").unwrap().value, 350.0);
        assert_eq!(summary.kpi("Net Margin").unwrap().value, 23.3);
        assert_eq!(summary.kpi("Completed Jobs").unwrap().value, 2.0);
        assert_eq!(summary.technician_bars.len(), 1);
        assert_eq!(summary.technician_bars[0].tech_pay, 1050.0);
    }

    #[test]
    fn test_monthly_series_clamps_negative_company_net() {
        let jobs = vec![
            job("A", "2025-01-10", 100.0, 400.0),
            job("B", "2025-02-15", 500.0, 0.0),
        ];
        let report = build_report(&jobs, &technicians(), None, "All Records");
        let summary = DashboardSummary::from_report(&report);

        assert_eq!(summary.monthly_series[0].company_net, 0.0);
        assert_eq!(summary.monthly_series[1].company_net, 125.0);
        // Authoritative totals keep the loss
        assert_eq!(to_f64(report.totals.company_net), 50.0);
    }
}
