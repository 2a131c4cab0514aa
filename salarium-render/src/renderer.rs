//! Renderer capability
//!
//! Both output formats implement [`Renderer`] over the same [`Report`], so
//! the numbers cannot drift between formats.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::report::Report;

use crate::error::RenderResult;

/// Prefix of every exported file name
pub const FILE_PREFIX: &str = "dashboard-financial-report";

/// First cell of every total row, in both formats
pub const TOTAL_LABEL: &str = "TOTAL";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Trait for document renderers
///
/// Implementations only format and lay out values already on the report;
/// they never derive money figures themselves.
pub trait Renderer {
    /// Output format produced by this renderer
    fn format(&self) -> ExportFormat;

    /// Render the complete document in memory
    fn render(&self, report: &Report) -> RenderResult<Vec<u8>>;
}

/// `dashboard-financial-report-<scope>-<yyyy-mm-dd>.<ext>`
///
/// Scope is lower-cased with whitespace runs replaced by hyphens.
pub fn export_file_name(scope_label: &str, date: NaiveDate, format: ExportFormat) -> String {
    let scope = scope_label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!(
        "{}-{}-{}.{}",
        FILE_PREFIX,
        scope,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        assert_eq!(
            export_file_name("Current Filter", date, ExportFormat::Xlsx),
            "dashboard-financial-report-current-filter-2025-05-02.xlsx"
        );
        assert_eq!(
            export_file_name("All Records", date, ExportFormat::Pdf),
            "dashboard-financial-report-all-records-2025-05-02.pdf"
        );
        assert_eq!(
            export_file_name("  Q1   Chimney ", date, ExportFormat::Pdf),
            "dashboard-financial-report-q1-chimney-2025-05-02.pdf"
        );
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(ExportFormat::Xlsx.to_string(), "xlsx");
    }
}
