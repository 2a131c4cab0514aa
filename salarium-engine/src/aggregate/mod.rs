//! Aggregation Engine
//!
//! Single source of truth for every derived money figure. Takes the raw job
//! and technician rows and folds them, in one pass, into:
//!
//! - grand totals
//! - per-technician rollups
//! - per-month rollups
//! - per-technician job detail groups
//!
//! ```text
//! JobRecord[] ──filter done──► MoneySplit per job ──fold──► Totals
//!                                                      ├──► TechnicianAggregate[]
//!                                                      ├──► MonthlyAggregate[]
//!                                                      └──► TechJobDetailGroup[]
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{JobRecord, TechnicianId, TechnicianRecord};
use shared::money::{self, MoneyResult, MoneySplit, to_decimal_or_zero};
use shared::report::{
    JobDetailRow, MonthKey, MonthlyAggregate, NO_COMPLETED_JOBS, NO_DATED_JOBS, Report, Rollup,
    TechJobDetailGroup, TechnicianAggregate, TechnicianKey, Totals, UNASSIGNED_LABEL,
};
use tracing::{debug, instrument, warn};

/// Default report title
pub const DEFAULT_TITLE: &str = "Salarium Financial Report";

/// Technician lookups built once per report
struct TechnicianDirectory<'a> {
    rates: HashMap<TechnicianId, Decimal>,
    names: HashMap<TechnicianId, &'a str>,
}

impl<'a> TechnicianDirectory<'a> {
    fn new(
        technicians: &'a [TechnicianRecord],
        name_overrides: Option<&'a HashMap<TechnicianId, String>>,
    ) -> Self {
        let rates = technicians.iter().map(|t| (t.id, t.rate())).collect();

        let mut names: HashMap<TechnicianId, &'a str> = technicians
            .iter()
            .map(|t| (t.id, t.name.as_str()))
            .collect();
        if let Some(overrides) = name_overrides {
            for (id, name) in overrides {
                names.insert(*id, name.as_str());
            }
        }

        Self { rates, names }
    }

    /// Resolve a job's technician; ids nobody can name fall in the unassigned bucket
    fn resolve(&self, technician_id: Option<TechnicianId>) -> TechnicianKey {
        match technician_id {
            Some(id) if self.names.contains_key(&id) => TechnicianKey::Assigned(id),
            Some(id) => {
                warn!(technician_id = id, "Job references unknown technician, grouping as unassigned");
                TechnicianKey::Unassigned
            }
            None => TechnicianKey::Unassigned,
        }
    }

    fn rate(&self, key: TechnicianKey) -> Decimal {
        match key {
            TechnicianKey::Assigned(id) => self.rates.get(&id).copied().unwrap_or(Decimal::ZERO),
            TechnicianKey::Unassigned => Decimal::ZERO,
        }
    }

    fn name(&self, key: TechnicianKey) -> String {
        match key {
            TechnicianKey::Assigned(id) => self
                .names
                .get(&id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| UNASSIGNED_LABEL.to_string()),
            TechnicianKey::Unassigned => UNASSIGNED_LABEL.to_string(),
        }
    }
}

/// Running state for one technician
struct TechnicianAccumulator {
    rate: Decimal,
    sums: Rollup,
    jobs: Vec<JobDetailRow>,
}

/// One job's money, as folded into every rollup
#[derive(Default)]
struct JobAmounts {
    gross: Decimal,
    parts: Decimal,
    tip: Decimal,
    split: MoneySplit,
}

impl JobAmounts {
    fn from_job(job: &JobRecord, rate: Decimal) -> MoneyResult<Self> {
        let gross = to_decimal_or_zero(job.subtotal.as_ref(), "subtotal");
        let parts = to_decimal_or_zero(job.parts_total_cost.as_ref(), "parts_total_cost");
        let tip = to_decimal_or_zero(job.tip_amount.as_ref(), "tip_amount");
        Ok(Self {
            gross,
            parts,
            tip,
            split: MoneySplit::from_job(gross, parts, rate)?,
        })
    }
}

/// All running aggregates, folded in a single pass
#[derive(Default)]
struct Accumulator {
    grand: Rollup,
    technicians: HashMap<TechnicianKey, TechnicianAccumulator>,
    months: BTreeMap<MonthKey, Rollup>,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
}

impl Accumulator {
    fn fold(&mut self, job: &JobRecord, key: TechnicianKey, rate: Decimal) {
        let date = job.parsed_date();
        if date.is_none() && job.work_order_date.is_some() {
            warn!(
                work_order_id = %job.work_order_id,
                date = ?job.work_order_date,
                "Unparseable work order date, excluding job from period and monthly figures"
            );
        }
        let month = date.map(MonthKey::from_date);

        let amounts = match JobAmounts::from_job(job, rate)
            .and_then(|amounts| self.add_to_rollups(key, rate, month, &amounts).map(|_| amounts))
        {
            Ok(amounts) => amounts,
            Err(e) => {
                warn!(
                    work_order_id = %job.work_order_id,
                    subtotal = ?job.subtotal,
                    parts_total_cost = ?job.parts_total_cost,
                    tip_amount = ?job.tip_amount,
                    error = %e,
                    "Job amounts out of range, counting job as zero"
                );
                let zero = JobAmounts::default();
                // Adding zero cannot overflow
                let _ = self.add_to_rollups(key, rate, month, &zero);
                zero
            }
        };

        if let Some(date) = date {
            self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
            self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
        }

        if let Some(tech) = self.technicians.get_mut(&key) {
            tech.jobs.push(JobDetailRow {
                work_order_id: job.work_order_id.clone(),
                date,
                address: job.address.clone().unwrap_or_default(),
                category: job.category.clone(),
                month_label: month.map(|m| m.short_label()).unwrap_or_default(),
                gross_revenue: amounts.gross,
                parts_cost: amounts.parts,
                tip: amounts.tip,
                net_revenue: amounts.split.net,
                tech_pay: amounts.split.tech_pay,
                company_net: amounts.split.company_net,
            });
        }
    }

    /// Add one job to the grand, monthly and technician rollups
    ///
    /// Either every rollup takes the job or none does.
    fn add_to_rollups(
        &mut self,
        key: TechnicianKey,
        rate: Decimal,
        month: Option<MonthKey>,
        amounts: &JobAmounts,
    ) -> MoneyResult<()> {
        let JobAmounts {
            gross,
            parts,
            tip,
            split,
        } = amounts;

        let mut grand = self.grand;
        grand.add_job(*gross, *parts, *tip, split)?;

        let month_sums = match month {
            Some(month) => {
                let mut sums = self.months.get(&month).copied().unwrap_or_default();
                sums.add_job(*gross, *parts, *tip, split)?;
                Some((month, sums))
            }
            None => None,
        };

        let mut tech_sums = self
            .technicians
            .get(&key)
            .map(|t| t.sums)
            .unwrap_or_default();
        tech_sums.add_job(*gross, *parts, *tip, split)?;

        self.grand = grand;
        if let Some((month, sums)) = month_sums {
            self.months.insert(month, sums);
        }
        self.technicians
            .entry(key)
            .or_insert_with(|| TechnicianAccumulator {
                rate,
                sums: Rollup::default(),
                jobs: Vec::new(),
            })
            .sums = tech_sums;
        Ok(())
    }
}

/// Build a report stamped with the current time
///
/// See [`build_report_at`].
pub fn build_report(
    jobs: &[JobRecord],
    technicians: &[TechnicianRecord],
    name_overrides: Option<&HashMap<TechnicianId, String>>,
    scope_label: &str,
) -> Report {
    build_report_at(jobs, technicians, name_overrides, scope_label, Utc::now())
}

/// Build a report from raw rows
///
/// Only `done` jobs contribute. Null money fields count as zero, unknown
/// technicians land in the "Unassigned" bucket at a 0% commission, and
/// unparseable dates only drop the job from the period and monthly figures.
/// Never fails for well-formed rows.
#[instrument(skip_all, fields(scope = scope_label, jobs = jobs.len()))]
pub fn build_report_at(
    jobs: &[JobRecord],
    technicians: &[TechnicianRecord],
    name_overrides: Option<&HashMap<TechnicianId, String>>,
    scope_label: &str,
    generated_at: DateTime<Utc>,
) -> Report {
    let directory = TechnicianDirectory::new(technicians, name_overrides);
    let mut acc = Accumulator::default();

    for job in jobs.iter().filter(|j| j.is_done()) {
        let key = directory.resolve(job.technician_id);
        acc.fold(job, key, directory.rate(key));
    }

    debug!(
        completed = acc.grand.job_count,
        technicians = acc.technicians.len(),
        months = acc.months.len(),
        "Aggregated completed jobs"
    );

    let period = period_label(acc.grand.job_count, acc.first_date, acc.last_date);
    let totals = build_totals(&acc);
    let monthly = build_monthly(&acc);
    let (technicians, job_details) = build_technician_rows(acc, &directory);

    Report {
        title: DEFAULT_TITLE.to_string(),
        scope_label: scope_label.to_string(),
        period,
        generated_at,
        totals,
        technicians,
        monthly,
        job_details,
    }
}

fn build_totals(acc: &Accumulator) -> Totals {
    let grand = &acc.grand;
    Totals {
        job_count: grand.job_count,
        gross_revenue: grand.gross_revenue,
        parts_cost: grand.parts_cost,
        net_revenue: grand.net_revenue,
        tech_pay: grand.tech_pay,
        company_net: grand.company_net,
        total_tips: grand.tips,
        avg_revenue_per_job: money::average(grand.gross_revenue, grand.job_count),
        company_net_margin_pct: money::round_dp(
            money::percent_of(grand.company_net, grand.gross_revenue),
            1,
        ),
        latest_month_gross: acc
            .months
            .values()
            .next_back()
            .map(|m| m.gross_revenue)
            .unwrap_or(Decimal::ZERO),
    }
}

fn build_monthly(acc: &Accumulator) -> Vec<MonthlyAggregate> {
    acc.months
        .iter()
        .map(|(month, sums)| MonthlyAggregate {
            month: *month,
            label: month.label(),
            sums: *sums,
            pct_of_total: money::percent_of(sums.gross_revenue, acc.grand.gross_revenue),
            company_net_pct: money::percent_of(sums.company_net, sums.gross_revenue),
        })
        .collect()
}

fn build_technician_rows(
    acc: Accumulator,
    directory: &TechnicianDirectory<'_>,
) -> (Vec<TechnicianAggregate>, Vec<TechJobDetailGroup>) {
    let mut rows = Vec::with_capacity(acc.technicians.len());
    let mut groups = Vec::with_capacity(acc.technicians.len());

    for (key, tech) in acc.technicians {
        let name = directory.name(key);
        let split_label = money::split_label(tech.rate);

        rows.push(TechnicianAggregate {
            key,
            name: name.clone(),
            commission_rate: tech.rate,
            split_label: split_label.clone(),
            sums: tech.sums,
            company_net_pct: money::percent_of(tech.sums.company_net, tech.sums.gross_revenue),
        });

        let mut jobs = tech.jobs;
        // Stable: undated jobs keep their input order after the dated ones
        jobs.sort_by(|a, b| match (a.date, b.date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        groups.push(TechJobDetailGroup {
            key,
            technician_name: name,
            commission_rate: tech.rate,
            split_label,
            jobs,
            totals: tech.sums,
        });
    }

    // Ties broken by key so output does not depend on hash order
    rows.sort_by(|a, b| {
        b.sums
            .gross_revenue
            .cmp(&a.sums.gross_revenue)
            .then_with(|| a.key.cmp(&b.key))
    });
    groups.sort_by(|a, b| {
        b.totals
            .gross_revenue
            .cmp(&a.totals.gross_revenue)
            .then_with(|| a.key.cmp(&b.key))
    });

    (rows, groups)
}

/// "March 1, 2025 — April 30, 2025", or a sentinel when no range exists
fn period_label(job_count: usize, first: Option<NaiveDate>, last: Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(first), Some(last)) => {
            format!("{} — {}", long_date(first), long_date(last))
        }
        _ if job_count == 0 => NO_COMPLETED_JOBS.to_string(),
        _ => NO_DATED_JOBS.to_string(),
    }
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
