//! Shared types for Salarium
//!
//! Common types used across the reporting crates: the input rows supplied
//! by the persistence layer, the decimal money layer, and the `Report`
//! contract consumed by every renderer.

pub mod models;
pub mod money;
pub mod report;

// Re-exports
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};

pub use models::{JobRecord, JobStatus, TechnicianId, TechnicianRecord};
pub use money::{MoneyError, MoneyResult, MoneySplit, Precision, RawAmount};
pub use report::{
    JobDetailRow, MonthKey, MonthlyAggregate, Report, Rollup, TechJobDetailGroup,
    TechnicianAggregate, TechnicianKey, Totals,
};
