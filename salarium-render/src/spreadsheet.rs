//! Spreadsheet renderer (.xlsx)
//!
//! Sheet 1 "Financial Report": banner, KPI grid, technician table, monthly table.
//! Sheet 2 "Job Detail": one section per technician.

use rust_decimal::Decimal;
use shared::money::to_f64;
use shared::report::{JobDetailRow, Report, Rollup, TechJobDetailGroup};
use tracing::{debug, instrument};

use crate::error::RenderResult;
use crate::format::{format_count, percent_fraction};
use crate::renderer::{ExportFormat, Renderer, TOTAL_LABEL};
use crate::xlsx::{CellStyle, Workbook, Worksheet};

pub const SUMMARY_SHEET: &str = "Financial Report";
pub const DETAIL_SHEET: &str = "Job Detail";

const SUMMARY_COLUMNS: u16 = 10;
const DETAIL_COLUMNS: u16 = 10;

const SUMMARY_WIDTHS: [f64; SUMMARY_COLUMNS as usize] =
    [26.0, 20.0, 10.0, 15.0, 14.0, 15.0, 15.0, 15.0, 13.0, 13.0];
const DETAIL_WIDTHS: [f64; DETAIL_COLUMNS as usize] =
    [12.0, 16.0, 36.0, 11.0, 14.0, 13.0, 14.0, 11.0, 14.0, 15.0];

const TITLE_ROW_HEIGHT: f64 = 32.0;
const BANNER_ROW_HEIGHT: f64 = 22.0;
const HEADER_ROW_HEIGHT: f64 = 30.0;

const TECHNICIAN_HEADERS: [&str; 10] = [
    "Technician",
    "Split",
    "Jobs",
    "Gross",
    "Parts",
    "Net",
    "Tech Pay",
    "Company Net",
    "Tips",
    "Margin",
];

const MONTHLY_HEADERS: [&str; 10] = [
    "Month",
    "Jobs",
    "Gross",
    "Parts",
    "Net",
    "Tech Pay",
    "Company Net",
    "Tips",
    "% of Total",
    "Co. Net %",
];

const DETAIL_HEADERS: [&str; 10] = [
    "Date",
    "Work Order",
    "Address",
    "Month",
    "Gross",
    "Parts",
    "Net",
    "Tip",
    "Tech Pay",
    "Company Net",
];

/// Renders a [`Report`] as a styled two-sheet workbook
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetRenderer;

impl SpreadsheetRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Build the workbook model without serialising it
    pub fn build_workbook(&self, report: &Report) -> Workbook {
        let mut wb = Workbook::new();
        wb.set_title(&report.title);
        write_summary_sheet(wb.add_worksheet(SUMMARY_SHEET), report);
        write_detail_sheet(wb.add_worksheet(DETAIL_SHEET), report);
        wb
    }
}

impl Renderer for SpreadsheetRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    #[instrument(skip_all, fields(scope = %report.scope_label))]
    fn render(&self, report: &Report) -> RenderResult<Vec<u8>> {
        let bytes = self.build_workbook(report).save_to_buffer()?;
        debug!(bytes = bytes.len(), "Workbook rendered");
        Ok(bytes)
    }
}

// ============================================================================
// Sheet 1: Financial Report
// ============================================================================

fn write_summary_sheet(sheet: &mut Worksheet, report: &Report) {
    for (col, width) in SUMMARY_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width);
    }
    sheet.set_landscape();

    let last_col = SUMMARY_COLUMNS - 1;
    sheet.merge_range(0, 0, 0, last_col, &report.title, CellStyle::Title);
    sheet.set_row_height(0, TITLE_ROW_HEIGHT);
    sheet.merge_range(
        1,
        0,
        1,
        last_col,
        &format!(
            "Scope: {}  |  Period: {}  |  Generated: {}",
            report.scope_label,
            report.period,
            report.generated_label()
        ),
        CellStyle::Subtitle,
    );

    let mut row = 3;
    row = write_kpi_block(sheet, row, report);
    row = write_technician_table(sheet, row + 1, report);
    write_monthly_table(sheet, row + 1, report);
}

enum KpiValue {
    Currency(Decimal),
    Percent(Decimal),
    Count(usize),
}

fn kpi_entries(report: &Report) -> [(&'static str, KpiValue); 9] {
    let t = &report.totals;
    [
        ("Gross Revenue", KpiValue::Currency(t.gross_revenue)),
        ("Parts Cost", KpiValue::Currency(t.parts_cost)),
        ("Net Revenue", KpiValue::Currency(t.net_revenue)),
        ("Company Net", KpiValue::Currency(t.company_net)),
        ("Completed Jobs", KpiValue::Count(t.job_count)),
        ("Avg / Job", KpiValue::Currency(t.avg_revenue_per_job)),
        ("Company Net Margin", KpiValue::Percent(t.company_net_margin_pct)),
        ("Total Tips", KpiValue::Currency(t.total_tips)),
        ("Latest Month Gross", KpiValue::Currency(t.latest_month_gross)),
    ]
}

/// 3-column grid of label/value pairs; returns the next free row
fn write_kpi_block(sheet: &mut Worksheet, start: u32, report: &Report) -> u32 {
    sheet.merge_range(start, 0, start, SUMMARY_COLUMNS - 1, "Key Metrics", CellStyle::Banner);
    sheet.set_row_height(start, BANNER_ROW_HEIGHT);

    // Pairs sit in columns (A,B) (D,E) (G,H)
    let entries = kpi_entries(report);
    for (i, (label, value)) in entries.iter().enumerate() {
        let row = start + 1 + (i / 3) as u32;
        let col = (i % 3) as u16 * 3;
        sheet.write_string(row, col, label, CellStyle::KpiLabel);
        let (number, style) = match value {
            KpiValue::Currency(v) => (to_f64(*v), CellStyle::KpiCurrency),
            KpiValue::Percent(v) => (percent_fraction(*v), CellStyle::KpiPercent),
            KpiValue::Count(v) => (*v as f64, CellStyle::KpiCount),
        };
        sheet.write_number(row, col + 1, number, style);
    }
    start + 1 + entries.len().div_ceil(3) as u32
}

fn write_header_row(sheet: &mut Worksheet, row: u32, headers: &[&str]) {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(row, col as u16, header, CellStyle::TableHeader);
    }
    sheet.set_row_height(row, HEADER_ROW_HEIGHT);
}

/// Jobs, Gross, Parts, Net, Tech Pay, Company Net, Tips starting at `col`
fn write_rollup_cells(sheet: &mut Worksheet, row: u32, col: u16, sums: &Rollup, total: bool) {
    let (count_style, money_style) = if total {
        (CellStyle::TotalCount, CellStyle::TotalCurrency)
    } else {
        (CellStyle::Count, CellStyle::Currency)
    };
    sheet.write_number(row, col, sums.job_count as f64, count_style);
    let amounts = [
        sums.gross_revenue,
        sums.parts_cost,
        sums.net_revenue,
        sums.tech_pay,
        sums.company_net,
        sums.tips,
    ];
    for (i, amount) in amounts.iter().enumerate() {
        sheet.write_number(row, col + 1 + i as u16, to_f64(*amount), money_style);
    }
}

fn totals_rollup(report: &Report) -> Rollup {
    let t = &report.totals;
    Rollup {
        job_count: t.job_count,
        gross_revenue: t.gross_revenue,
        parts_cost: t.parts_cost,
        tips: t.total_tips,
        net_revenue: t.net_revenue,
        tech_pay: t.tech_pay,
        company_net: t.company_net,
    }
}

fn write_technician_table(sheet: &mut Worksheet, start: u32, report: &Report) -> u32 {
    sheet.merge_range(
        start,
        0,
        start,
        SUMMARY_COLUMNS - 1,
        "Technician Performance",
        CellStyle::Banner,
    );
    sheet.set_row_height(start, BANNER_ROW_HEIGHT);
    write_header_row(sheet, start + 1, &TECHNICIAN_HEADERS);

    let mut row = start + 2;
    for tech in &report.technicians {
        sheet.write_string(row, 0, &tech.name, CellStyle::Text);
        sheet.write_string(row, 1, &tech.split_label, CellStyle::Text);
        write_rollup_cells(sheet, row, 2, &tech.sums, false);
        sheet.write_number(
            row,
            9,
            percent_fraction(tech.company_net_pct),
            CellStyle::Percent,
        );
        row += 1;
    }

    sheet.write_string(row, 0, TOTAL_LABEL, CellStyle::TotalText);
    sheet.write_string(row, 1, "", CellStyle::TotalText);
    write_rollup_cells(sheet, row, 2, &totals_rollup(report), true);
    sheet.write_number(
        row,
        9,
        percent_fraction(report.totals.company_net_margin_pct),
        CellStyle::TotalPercent,
    );
    row + 1
}

fn write_monthly_table(sheet: &mut Worksheet, start: u32, report: &Report) -> u32 {
    sheet.merge_range(
        start,
        0,
        start,
        SUMMARY_COLUMNS - 1,
        "Monthly Comparison",
        CellStyle::Banner,
    );
    sheet.set_row_height(start, BANNER_ROW_HEIGHT);
    write_header_row(sheet, start + 1, &MONTHLY_HEADERS);

    let mut row = start + 2;
    if report.monthly.is_empty() {
        sheet.merge_range(row, 0, row, SUMMARY_COLUMNS - 1, &report.period, CellStyle::Subtitle);
        return row + 1;
    }
    for month in &report.monthly {
        sheet.write_string(row, 0, &month.label, CellStyle::Text);
        write_rollup_cells(sheet, row, 1, &month.sums, false);
        sheet.write_number(row, 8, percent_fraction(month.pct_of_total), CellStyle::Percent);
        sheet.write_number(row, 9, percent_fraction(month.company_net_pct), CellStyle::Percent);
        row += 1;
    }
    row
}

// ============================================================================
// Sheet 2: Job Detail
// ============================================================================

fn write_detail_sheet(sheet: &mut Worksheet, report: &Report) {
    for (col, width) in DETAIL_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width);
    }
    sheet.set_landscape();

    sheet.merge_range(0, 0, 0, DETAIL_COLUMNS - 1, "Job Detail by Technician", CellStyle::Title);
    sheet.set_row_height(0, TITLE_ROW_HEIGHT);
    sheet.merge_range(
        1,
        0,
        1,
        DETAIL_COLUMNS - 1,
        &format!("{}  |  {}", report.scope_label, report.period),
        CellStyle::Subtitle,
    );

    let mut row = 3;
    for group in &report.job_details {
        row = write_detail_group(sheet, row, group) + 1;
    }
}

fn write_detail_group(sheet: &mut Worksheet, start: u32, group: &TechJobDetailGroup) -> u32 {
    sheet.merge_range(
        start,
        0,
        start,
        DETAIL_COLUMNS - 1,
        &format!(
            "{}  ({})  |  {} jobs",
            group.technician_name,
            group.split_label,
            format_count(group.totals.job_count)
        ),
        CellStyle::Banner,
    );
    sheet.set_row_height(start, BANNER_ROW_HEIGHT);
    write_header_row(sheet, start + 1, &DETAIL_HEADERS);

    let mut row = start + 2;
    for job in &group.jobs {
        write_detail_row(sheet, row, job);
        row += 1;
    }

    let t = &group.totals;
    sheet.write_string(row, 0, TOTAL_LABEL, CellStyle::TotalText);
    sheet.write_string(row, 1, "", CellStyle::TotalText);
    sheet.write_string(
        row,
        2,
        &format!("{} jobs", format_count(t.job_count)),
        CellStyle::TotalText,
    );
    sheet.write_string(row, 3, "", CellStyle::TotalText);
    let amounts = [
        t.gross_revenue,
        t.parts_cost,
        t.net_revenue,
        t.tips,
        t.tech_pay,
        t.company_net,
    ];
    for (i, amount) in amounts.iter().enumerate() {
        sheet.write_number(row, 4 + i as u16, to_f64(*amount), CellStyle::TotalCurrency);
    }
    row + 1
}

fn write_detail_row(sheet: &mut Worksheet, row: u32, job: &JobDetailRow) {
    let date = job
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    sheet.write_string(row, 0, &date, CellStyle::Text);
    sheet.write_string(row, 1, &job.work_order_id, CellStyle::Text);
    sheet.write_string(row, 2, &job.address, CellStyle::Text);
    sheet.write_string(row, 3, &job.month_label, CellStyle::Text);
    let amounts = [
        job.gross_revenue,
        job.parts_cost,
        job.net_revenue,
        job.tip,
        job.tech_pay,
        job.company_net,
    ];
    for (i, amount) in amounts.iter().enumerate() {
        sheet.write_number(row, 4 + i as u16, to_f64(*amount), CellStyle::Currency);
    }
}
