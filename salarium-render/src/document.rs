//! PDF renderer
//!
//! Page 1: banner, KPI grid and technician table.
//! Page 2: monthly comparison.
//! Pages 3+: one page per technician detail group.
//!
//! Tables that run past the bottom margin continue on a new page with the
//! header row repeated. Footers ("Page N of M" and the confidentiality
//! label) are drawn once the page count is known.

use shared::report::{JobDetailRow, MonthlyAggregate, Report, Rollup, TechnicianAggregate, Totals};
use tracing::{debug, instrument};

use crate::error::RenderResult;
use crate::format::{format_count, format_currency, format_percent};
use crate::pdf::{A4_LANDSCAPE, Align, Color, Font, Page, PdfDocument, truncate_to_width};
use crate::renderer::{ExportFormat, Renderer, TOTAL_LABEL};

/// Printed at the bottom-left of every page
pub const CONFIDENTIAL_LABEL: &str = "Confidential — for internal use only";

const MARGIN: f32 = 36.0;
const CONTENT_WIDTH: f32 = A4_LANDSCAPE.0 - 2.0 * MARGIN;
const CONTENT_BOTTOM: f32 = 48.0;
const FOOTER_BASELINE: f32 = 22.0;
const FOOTER_RULE_Y: f32 = 34.0;

const BANNER_HEIGHT: f32 = 72.0;
const HEADING_HEIGHT: f32 = 22.0;
const HEADER_ROW_HEIGHT: f32 = 20.0;
const ROW_HEIGHT: f32 = 16.0;
const CELL_PADDING: f32 = 4.0;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 8.0;
const FOOTER_SIZE: f32 = 7.5;

const KPI_BOX_HEIGHT: f32 = 40.0;
const KPI_GAP: f32 = 6.0;

struct Column {
    header: &'static str,
    width: f32,
    align: Align,
}

const fn col(header: &'static str, width: f32, align: Align) -> Column {
    Column {
        header,
        width,
        align,
    }
}

const TECHNICIAN_COLUMNS: [Column; 10] = [
    col("Technician", 130.0, Align::Left),
    col("Split", 110.0, Align::Left),
    col("Jobs", 45.0, Align::Right),
    col("Gross", 75.0, Align::Right),
    col("Parts", 65.0, Align::Right),
    col("Net", 75.0, Align::Right),
    col("Tech Pay", 70.0, Align::Right),
    col("Company Net", 80.0, Align::Right),
    col("Tips", 60.0, Align::Right),
    col("Margin", 60.0, Align::Right),
];

const MONTHLY_COLUMNS: [Column; 10] = [
    col("Month", 120.0, Align::Left),
    col("Jobs", 50.0, Align::Right),
    col("Gross", 85.0, Align::Right),
    col("Parts", 75.0, Align::Right),
    col("Net", 85.0, Align::Right),
    col("Tech Pay", 80.0, Align::Right),
    col("Company Net", 90.0, Align::Right),
    col("Tips", 65.0, Align::Right),
    col("% of Total", 60.0, Align::Right),
    col("Co. Net %", 60.0, Align::Right),
];

const DETAIL_COLUMNS: [Column; 10] = [
    col("Date", 62.0, Align::Left),
    col("Work Order", 70.0, Align::Left),
    col("Address", 178.0, Align::Left),
    col("Month", 55.0, Align::Left),
    col("Gross", 70.0, Align::Right),
    col("Parts", 60.0, Align::Right),
    col("Net", 70.0, Align::Right),
    col("Tip", 50.0, Align::Right),
    col("Tech Pay", 70.0, Align::Right),
    col("Company Net", 85.0, Align::Right),
];

/// Renders a [`Report`] as a paginated landscape PDF
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Lay out every page without serialising
    pub fn build_document(&self, report: &Report) -> RenderResult<PdfDocument> {
        let mut doc = PdfDocument::new(A4_LANDSCAPE.0, A4_LANDSCAPE.1, &report.title);

        let mut cursor = Cursor::new(&mut doc);
        draw_summary_page(&mut cursor, report)?;

        cursor.new_page();
        draw_monthly_page(&mut cursor, report)?;

        for group in &report.job_details {
            cursor.new_page();
            let title = format!("{} — {}", group.technician_name, group.split_label);
            cursor.heading(&title)?;
            cursor.caption(&format!(
                "{} jobs  |  Gross {}  |  Company Net {}",
                format_count(group.totals.job_count),
                format_currency(group.totals.gross_revenue),
                format_currency(group.totals.company_net)
            ))?;
            let rows: Vec<Vec<String>> = group.jobs.iter().map(detail_cells).collect();
            let footer = detail_total_cells(&group.totals);
            cursor.table(&title, &DETAIL_COLUMNS, &rows, Some(footer.as_slice()))?;
        }

        draw_footers(&mut doc, &format!("Generated {}", report.generated_label()));
        Ok(doc)
    }
}

impl Renderer for PdfRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    #[instrument(skip_all, fields(scope = %report.scope_label))]
    fn render(&self, report: &Report) -> RenderResult<Vec<u8>> {
        let doc = self.build_document(report)?;
        let bytes = doc.save_to_buffer()?;
        debug!(pages = doc.page_count(), bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }
}

// ============================================================================
// Layout cursor
// ============================================================================

/// Current page plus the top edge of the next element
struct Cursor<'a> {
    doc: &'a mut PdfDocument,
    page: usize,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(doc: &'a mut PdfDocument) -> Self {
        let page = doc.add_page();
        let y = doc.height() - MARGIN;
        Self { doc, page, y }
    }

    fn new_page(&mut self) {
        self.page = self.doc.add_page();
        self.y = self.doc.height() - MARGIN;
    }

    fn page(&mut self) -> RenderResult<&mut Page> {
        self.doc.page_mut(self.page)
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= CONTENT_BOTTOM
    }

    fn heading(&mut self, text: &str) -> RenderResult<()> {
        let baseline = self.y - 14.0;
        self.page()?
            .text(MARGIN, baseline, text, HEADING_SIZE, Font::Bold, Color::NAVY, Align::Left)
            .line(
                MARGIN,
                baseline - 5.0,
                MARGIN + CONTENT_WIDTH,
                baseline - 5.0,
                0.75,
                Color::NAVY,
            );
        self.y -= HEADING_HEIGHT;
        Ok(())
    }

    fn caption(&mut self, text: &str) -> RenderResult<()> {
        let baseline = self.y - 10.0;
        self.page()?
            .text(MARGIN, baseline, text, BODY_SIZE, Font::Regular, Color::SLATE, Align::Left);
        self.y -= ROW_HEIGHT;
        Ok(())
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    /// Draw a table, breaking onto new pages as needed
    fn table(
        &mut self,
        title: &str,
        columns: &[Column],
        rows: &[Vec<String>],
        footer: Option<&[String]>,
    ) -> RenderResult<()> {
        if !self.fits(HEADER_ROW_HEIGHT + ROW_HEIGHT) {
            self.continue_on_new_page(title)?;
        }
        self.header_row(columns)?;

        for cells in rows {
            if !self.fits(ROW_HEIGHT) {
                self.continue_on_new_page(title)?;
                self.header_row(columns)?;
            }
            self.body_row(columns, cells, Font::Regular, None)?;
        }

        if let Some(cells) = footer {
            if !self.fits(ROW_HEIGHT) {
                self.continue_on_new_page(title)?;
                self.header_row(columns)?;
            }
            self.body_row(columns, cells, Font::Bold, Some(Color::TOTAL_FILL))?;
        }
        Ok(())
    }

    fn continue_on_new_page(&mut self, title: &str) -> RenderResult<()> {
        self.new_page();
        self.heading(&format!("{} (continued)", title))
    }

    fn header_row(&mut self, columns: &[Column]) -> RenderResult<()> {
        let top = self.y;
        let page = self.doc.page_mut(self.page)?;
        page.fill_rect(
            MARGIN,
            top - HEADER_ROW_HEIGHT,
            CONTENT_WIDTH,
            HEADER_ROW_HEIGHT,
            Color::HEADER_FILL,
        );
        let baseline = top - HEADER_ROW_HEIGHT + 7.0;
        let mut x = MARGIN;
        for column in columns {
            draw_cell(page, x, baseline, column, column.header, Font::Bold);
            x += column.width;
        }
        self.y -= HEADER_ROW_HEIGHT;
        Ok(())
    }

    fn body_row(
        &mut self,
        columns: &[Column],
        cells: &[String],
        font: Font,
        fill: Option<Color>,
    ) -> RenderResult<()> {
        let top = self.y;
        let page = self.doc.page_mut(self.page)?;
        if let Some(color) = fill {
            page.fill_rect(MARGIN, top - ROW_HEIGHT, CONTENT_WIDTH, ROW_HEIGHT, color);
        }
        let baseline = top - ROW_HEIGHT + 5.0;
        let mut x = MARGIN;
        for (column, text) in columns.iter().zip(cells) {
            draw_cell(page, x, baseline, column, text, font);
            x += column.width;
        }
        page.line(
            MARGIN,
            top - ROW_HEIGHT,
            MARGIN + CONTENT_WIDTH,
            top - ROW_HEIGHT,
            0.25,
            Color::RULE,
        );
        self.y -= ROW_HEIGHT;
        Ok(())
    }
}

fn draw_cell(page: &mut Page, x: f32, baseline: f32, column: &Column, text: &str, font: Font) {
    let text = truncate_to_width(text, column.width - 2.0 * CELL_PADDING, BODY_SIZE, font);
    let anchor = match column.align {
        Align::Left => x + CELL_PADDING,
        Align::Center => x + column.width / 2.0,
        Align::Right => x + column.width - CELL_PADDING,
    };
    page.text(anchor, baseline, &text, BODY_SIZE, font, Color::BLACK, column.align);
}

// ============================================================================
// Page content
// ============================================================================

fn draw_summary_page(cursor: &mut Cursor<'_>, report: &Report) -> RenderResult<()> {
    let width = cursor.doc.width();
    let top = cursor.doc.height();
    cursor
        .page()?
        .fill_rect(0.0, top - BANNER_HEIGHT, width, BANNER_HEIGHT, Color::NAVY)
        .text(MARGIN, top - 36.0, &report.title, TITLE_SIZE, Font::Bold, Color::WHITE, Align::Left)
        .text(
            MARGIN,
            top - 56.0,
            &format!(
                "Scope: {}  |  Period: {}  |  Generated: {}",
                report.scope_label,
                report.period,
                report.generated_label()
            ),
            BODY_SIZE + 1.0,
            Font::Regular,
            Color::WHITE,
            Align::Left,
        );
    cursor.y = top - BANNER_HEIGHT - 16.0;

    cursor.heading("Key Metrics")?;
    draw_kpi_grid(cursor, &report.totals)?;
    cursor.gap(10.0);

    cursor.heading("Technician Performance")?;
    let rows: Vec<Vec<String>> = report.technicians.iter().map(technician_cells).collect();
    let footer = technician_total_cells(&report.totals);
    cursor.table("Technician Performance", &TECHNICIAN_COLUMNS, &rows, Some(footer.as_slice()))
}

fn kpi_entries(t: &Totals) -> [(&'static str, String); 9] {
    [
        ("Gross Revenue", format_currency(t.gross_revenue)),
        ("Parts Cost", format_currency(t.parts_cost)),
        ("Net Revenue", format_currency(t.net_revenue)),
        ("Company Net", format_currency(t.company_net)),
        ("Completed Jobs", format_count(t.job_count)),
        ("Avg / Job", format_currency(t.avg_revenue_per_job)),
        ("Company Net Margin", format_percent(t.company_net_margin_pct)),
        ("Total Tips", format_currency(t.total_tips)),
        ("Latest Month Gross", format_currency(t.latest_month_gross)),
    ]
}

/// Three boxes per row, label above value
fn draw_kpi_grid(cursor: &mut Cursor<'_>, totals: &Totals) -> RenderResult<()> {
    let box_width = (CONTENT_WIDTH - 2.0 * KPI_GAP) / 3.0;
    let entries = kpi_entries(totals);
    let top = cursor.y;
    let page = cursor.page()?;
    for (i, (label, value)) in entries.iter().enumerate() {
        let x = MARGIN + (i % 3) as f32 * (box_width + KPI_GAP);
        let box_top = top - (i / 3) as f32 * (KPI_BOX_HEIGHT + KPI_GAP);
        page.fill_rect(x, box_top - KPI_BOX_HEIGHT, box_width, KPI_BOX_HEIGHT, Color::HEADER_FILL)
            .text(x + 8.0, box_top - 13.0, label, BODY_SIZE, Font::Regular, Color::SLATE, Align::Left)
            .text(x + 8.0, box_top - 32.0, value, 14.0, Font::Bold, Color::BLACK, Align::Left);
    }
    let rows = entries.len().div_ceil(3) as f32;
    cursor.y -= rows * (KPI_BOX_HEIGHT + KPI_GAP);
    Ok(())
}

fn draw_monthly_page(cursor: &mut Cursor<'_>, report: &Report) -> RenderResult<()> {
    cursor.heading("Monthly Comparison")?;
    cursor.caption(&format!("{}  |  {}", report.scope_label, report.period))?;
    if report.monthly.is_empty() {
        return cursor.caption(&report.period);
    }
    let rows: Vec<Vec<String>> = report.monthly.iter().map(monthly_cells).collect();
    let footer = monthly_total_cells(&report.totals);
    cursor.table("Monthly Comparison", &MONTHLY_COLUMNS, &rows, Some(footer.as_slice()))
}

/// Footer on every page; needs the final page count
fn draw_footers(doc: &mut PdfDocument, generated: &str) {
    let total = doc.page_count();
    let right = doc.width() - MARGIN;
    let center = doc.width() / 2.0;
    for (i, page) in doc.pages_mut().enumerate() {
        page.line(MARGIN, FOOTER_RULE_Y, right, FOOTER_RULE_Y, 0.5, Color::RULE)
            .text(
                MARGIN,
                FOOTER_BASELINE,
                CONFIDENTIAL_LABEL,
                FOOTER_SIZE,
                Font::Regular,
                Color::SLATE,
                Align::Left,
            )
            .text(
                center,
                FOOTER_BASELINE,
                generated,
                FOOTER_SIZE,
                Font::Regular,
                Color::SLATE,
                Align::Center,
            )
            .text(
                right,
                FOOTER_BASELINE,
                &format!("Page {} of {}", i + 1, total),
                FOOTER_SIZE,
                Font::Regular,
                Color::SLATE,
                Align::Right,
            );
    }
}

// ============================================================================
// Row cells
// ============================================================================

fn rollup_money(sums: &Rollup) -> [String; 6] {
    [
        format_currency(sums.gross_revenue),
        format_currency(sums.parts_cost),
        format_currency(sums.net_revenue),
        format_currency(sums.tech_pay),
        format_currency(sums.company_net),
        format_currency(sums.tips),
    ]
}

fn technician_cells(tech: &TechnicianAggregate) -> Vec<String> {
    let mut cells = vec![
        tech.name.clone(),
        tech.split_label.clone(),
        format_count(tech.sums.job_count),
    ];
    cells.extend(rollup_money(&tech.sums));
    cells.push(format_percent(tech.company_net_pct));
    cells
}

fn totals_as_rollup(t: &Totals) -> Rollup {
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

fn technician_total_cells(t: &Totals) -> Vec<String> {
    let mut cells = vec![
        TOTAL_LABEL.to_string(),
        String::new(),
        format_count(t.job_count),
    ];
    cells.extend(rollup_money(&totals_as_rollup(t)));
    cells.push(format_percent(t.company_net_margin_pct));
    cells
}

fn monthly_cells(month: &MonthlyAggregate) -> Vec<String> {
    let mut cells = vec![month.label.clone(), format_count(month.sums.job_count)];
    cells.extend(rollup_money(&month.sums));
    cells.push(format_percent(month.pct_of_total));
    cells.push(format_percent(month.company_net_pct));
    cells
}

fn monthly_total_cells(t: &Totals) -> Vec<String> {
    let mut cells = vec![TOTAL_LABEL.to_string(), format_count(t.job_count)];
    cells.extend(rollup_money(&totals_as_rollup(t)));
    cells.push(String::new());
    cells.push(format_percent(t.company_net_margin_pct));
    cells
}

fn detail_cells(job: &JobDetailRow) -> Vec<String> {
    vec![
        job.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        job.work_order_id.clone(),
        job.address.clone(),
        job.month_label.clone(),
        format_currency(job.gross_revenue),
        format_currency(job.parts_cost),
        format_currency(job.net_revenue),
        format_currency(job.tip),
        format_currency(job.tech_pay),
        format_currency(job.company_net),
    ]
}

fn detail_total_cells(t: &Rollup) -> Vec<String> {
    vec![
        TOTAL_LABEL.to_string(),
        String::new(),
        format!("{} jobs", format_count(t.job_count)),
        String::new(),
        format_currency(t.gross_revenue),
        format_currency(t.parts_cost),
        format_currency(t.net_revenue),
        format_currency(t.tips),
        format_currency(t.tech_pay),
        format_currency(t.company_net),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_report, sample_report_with_jobs};
    use lopdf::content::Content;
    use lopdf::{Document, Object};

    /// Literal strings drawn on each page, in drawing order
    fn page_strings(bytes: &[u8]) -> Vec<Vec<String>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|page_id| {
                let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| match op.operands.first() {
                        Some(Object::String(bytes, _)) => {
                            Some(String::from_utf8_lossy(bytes).into_owned())
                        }
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_page_structure() {
        let report = sample_report();
        let bytes = PdfRenderer::new().render(&report).unwrap();
        let pages = page_strings(&bytes);

        // Summary, monthly, then one page per technician group
        assert_eq!(pages.len(), 2 + report.job_details.len());
        assert!(pages[0].contains(&report.title));
        assert!(pages[0].contains(&"Technician Performance".to_string()));
        assert!(pages[1].contains(&"Monthly Comparison".to_string()));
    }

    #[test]
    fn test_every_page_has_footer() {
        let report = sample_report();
        let bytes = PdfRenderer::new().render(&report).unwrap();
        let pages = page_strings(&bytes);
        let total = pages.len();
        for (i, strings) in pages.iter().enumerate() {
            assert!(strings.contains(&format!("Page {} of {}", i + 1, total)));
            assert!(strings.iter().any(|s| s.starts_with("Confidential")));
        }
    }

    #[test]
    fn test_summary_totals_printed() {
        let report = sample_report();
        let bytes = PdfRenderer::new().render(&report).unwrap();
        let pages = page_strings(&bytes);
        assert!(pages[0].contains(&format_currency(report.totals.gross_revenue)));
        assert!(pages[0].contains(&format_currency(report.totals.company_net)));
        assert!(pages[0].contains(&format_percent(report.totals.company_net_margin_pct)));
        assert!(pages[0].contains(&TOTAL_LABEL.to_string()));
    }

    #[test]
    fn test_every_table_closes_with_total_row() {
        let report = sample_report();
        let pages = page_strings(&PdfRenderer::new().render(&report).unwrap());
        // Summary, monthly, then one page per detail group
        assert_eq!(pages.len(), 2 + report.job_details.len());
        for (i, page) in pages.iter().enumerate() {
            assert!(page.contains(&TOTAL_LABEL.to_string()), "page {} has no total row", i + 1);
        }
    }

    #[test]
    fn test_long_table_repeats_header() {
        let report = sample_report_with_jobs(80);
        let doc = PdfRenderer::new().build_document(&report).unwrap();
        let bytes = doc.save_to_buffer().unwrap();
        let pages = page_strings(&bytes);

        // 80 detail rows cannot fit a single landscape page
        assert!(pages.len() > 2 + report.job_details.len());
        let continued: Vec<&Vec<String>> = pages
            .iter()
            .filter(|p| p.iter().any(|s| s.ends_with("(continued)")))
            .collect();
        assert!(!continued.is_empty());
        for page in continued {
            assert!(page.contains(&"Work Order".to_string()));
        }
    }

    #[test]
    fn test_empty_report_still_renders() {
        let mut report = sample_report();
        report.technicians.clear();
        report.monthly.clear();
        report.job_details.clear();
        report.totals = Totals::default();
        report.period = shared::report::NO_COMPLETED_JOBS.to_string();

        let bytes = PdfRenderer::new().render(&report).unwrap();
        let pages = page_strings(&bytes);
        assert_eq!(pages.len(), 2);
        assert!(pages[1].contains(&shared::report::NO_COMPLETED_JOBS.to_string()));
        assert!(pages[0].contains(&"$0.00".to_string()));
    }
}
