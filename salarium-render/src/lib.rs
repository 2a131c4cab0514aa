//! # salarium-render
//!
//! Document renderers for the financial report.
//!
//! ## Scope
//!
//! This crate handles HOW a report is laid out:
//! - Spreadsheet workbooks (.xlsx, two styled sheets)
//! - Paginated landscape PDFs with repeated table headers
//! - Currency, percent and count formatting
//!
//! WHAT is reported (every total, split and percentage) is computed by
//! `salarium-engine` and arrives on a [`shared::report::Report`].
//!
//! ## Example
//!
//! ```ignore
//! use salarium_render::{PdfRenderer, Renderer, SpreadsheetRenderer};
//!
//! let xlsx = SpreadsheetRenderer::new().render(&report)?;
//! let pdf = PdfRenderer::new().render(&report)?;
//! ```

mod document;
mod error;
mod format;
mod pdf;
mod renderer;
mod spreadsheet;
mod xlsx;

#[cfg(test)]
mod test_support;

// Re-exports
pub use document::{CONFIDENTIAL_LABEL, PdfRenderer};
pub use error::{RenderError, RenderResult};
pub use format::{format_count, format_currency, format_percent, percent_fraction};
pub use renderer::{ExportFormat, FILE_PREFIX, Renderer, TOTAL_LABEL, export_file_name};
pub use spreadsheet::{DETAIL_SHEET, SUMMARY_SHEET, SpreadsheetRenderer};
pub use xlsx::{Cell, CellStyle, CellValue, Workbook, Worksheet};
