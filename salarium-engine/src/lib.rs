//! Salarium Engine - financial aggregation and report export
//!
//! # Overview
//!
//! Turns raw job and technician rows into a single immutable
//! [`Report`](shared::report::Report) and exports it as a spreadsheet and a PDF.
//! Dashboard KPIs and chart series are read off the same report, so every
//! surface shows the same money.
//!
//! # Module layout
//!
//! ```text
//! salarium-engine/src/
//! ├── aggregate/     # build_report: the one place money is derived
//! ├── dashboard.rs   # KPI cards and chart series
//! ├── export/        # render + atomic save
//! ├── input.rs       # JSON row loading
//! ├── core/          # configuration
//! └── utils/         # errors, logging
//! ```

pub mod aggregate;
pub mod core;
pub mod dashboard;
pub mod export;
pub mod input;
pub mod utils;

pub use aggregate::{DEFAULT_TITLE, build_report, build_report_at};
pub use crate::core::ExportConfig;
pub use dashboard::{DashboardSummary, KpiCard, KpiKind, MonthlyPoint, TechnicianBar};
pub use export::{ALL_FORMATS, ExportService};
pub use input::{load_jobs, load_name_overrides, load_technicians};
pub use utils::{ExportError, ExportResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
