//! Hand-built reports for renderer tests

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::money::{MoneySplit, split_label};
use shared::report::{
    JobDetailRow, MonthKey, MonthlyAggregate, Report, Rollup, TechJobDetailGroup,
    TechnicianAggregate, TechnicianKey, Totals,
};

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

fn detail_row(id: &str, date: NaiveDate, gross: i64, parts: i64, rate: i64) -> JobDetailRow {
    let split = MoneySplit::from_job(dec(gross), dec(parts), dec(rate)).unwrap();
    JobDetailRow {
        work_order_id: id.to_string(),
        date: Some(date),
        address: format!("{} Main Street", id),
        category: Some("Repair".to_string()),
        month_label: MonthKey::from_date(date).short_label(),
        gross_revenue: dec(gross),
        parts_cost: dec(parts),
        tip: Decimal::ZERO,
        net_revenue: split.net,
        tech_pay: split.tech_pay,
        company_net: split.company_net,
    }
}

fn rollup_of(rows: &[JobDetailRow]) -> Rollup {
    let mut sums = Rollup::default();
    for row in rows {
        sums.add_job(
            row.gross_revenue,
            row.parts_cost,
            row.tip,
            &MoneySplit {
                net: row.net_revenue,
                tech_pay: row.tech_pay,
                company_net: row.company_net,
            },
        )
        .unwrap();
    }
    sums
}

/// One technician (id 1, 75% rate) with `count` January jobs of $100 each
pub fn sample_report_with_jobs(count: usize) -> Report {
    let jobs: Vec<JobDetailRow> = (0..count)
        .map(|i| {
            let day = (i % 28) as u32 + 1;
            let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap_or_default();
            detail_row(&format!("WO-{:03}", i), date, 100, 0, 75)
        })
        .collect();
    let mut jobs = jobs;
    jobs.sort_by_key(|j| j.date);
    build(vec![(1, "Alice", 75, jobs)])
}

/// Two technicians over two months
///
/// Alice (75%): $1,000 less $100 parts in January, $500 in March.
/// Bob (60%): $400 less $50 parts in March.
pub fn sample_report() -> Report {
    let jan = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap_or_default();
    let mar = NaiveDate::from_ymd_opt(2025, 3, 28).unwrap_or_default();
    build(vec![
        (
            1,
            "Alice",
            75,
            vec![
                detail_row("A-1", jan, 1000, 100, 75),
                detail_row("A-2", mar, 500, 0, 75),
            ],
        ),
        (2, "Bob", 60, vec![detail_row("B-1", mar, 400, 50, 60)]),
    ])
}

fn build(groups: Vec<(i64, &str, i64, Vec<JobDetailRow>)>) -> Report {
    let mut grand = Rollup::default();
    let mut months: std::collections::BTreeMap<MonthKey, Rollup> = Default::default();
    let mut technicians = Vec::new();
    let mut job_details = Vec::new();

    for (id, name, rate, jobs) in groups {
        let sums = rollup_of(&jobs);
        for job in &jobs {
            let split = MoneySplit {
                net: job.net_revenue,
                tech_pay: job.tech_pay,
                company_net: job.company_net,
            };
            grand
                .add_job(job.gross_revenue, job.parts_cost, job.tip, &split)
                .unwrap();
            if let Some(date) = job.date {
                months
                    .entry(MonthKey::from_date(date))
                    .or_default()
                    .add_job(job.gross_revenue, job.parts_cost, job.tip, &split)
                    .unwrap();
            }
        }
        let key = TechnicianKey::Assigned(id);
        let label = split_label(dec(rate));
        technicians.push(TechnicianAggregate {
            key,
            name: name.to_string(),
            commission_rate: dec(rate),
            split_label: label.clone(),
            sums,
            company_net_pct: pct(sums.company_net, sums.gross_revenue),
        });
        job_details.push(TechJobDetailGroup {
            key,
            technician_name: name.to_string(),
            commission_rate: dec(rate),
            split_label: label,
            jobs,
            totals: sums,
        });
    }

    let monthly: Vec<MonthlyAggregate> = months
        .iter()
        .map(|(month, sums)| MonthlyAggregate {
            month: *month,
            label: month.label(),
            sums: *sums,
            pct_of_total: pct(sums.gross_revenue, grand.gross_revenue),
            company_net_pct: pct(sums.company_net, sums.gross_revenue),
        })
        .collect();

    let totals = Totals {
        job_count: grand.job_count,
        gross_revenue: grand.gross_revenue,
        parts_cost: grand.parts_cost,
        net_revenue: grand.net_revenue,
        tech_pay: grand.tech_pay,
        company_net: grand.company_net,
        total_tips: grand.tips,
        avg_revenue_per_job: if grand.job_count == 0 {
            Decimal::ZERO
        } else {
            grand.gross_revenue / Decimal::from(grand.job_count)
        },
        company_net_margin_pct: pct(grand.company_net, grand.gross_revenue).round_dp(1),
        latest_month_gross: monthly
            .last()
            .map(|m| m.sums.gross_revenue)
            .unwrap_or_default(),
    };

    Report {
        title: "Salarium Financial Report".to_string(),
        scope_label: "All Records".to_string(),
        period: "January 5, 2025 — March 28, 2025".to_string(),
        generated_at: Utc
            .with_ymd_and_hms(2025, 4, 1, 9, 30, 0)
            .single()
            .unwrap_or_default(),
        totals,
        technicians,
        monthly,
        job_details,
    }
}

fn pct(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}
