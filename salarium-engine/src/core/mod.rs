//! Core module: configuration
//!
//! - [`ExportConfig`] - export and logging configuration

pub mod config;

pub use config::ExportConfig;
