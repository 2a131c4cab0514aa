use std::path::PathBuf;

use crate::aggregate::DEFAULT_TITLE;

/// Export configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | EXPORT_DIR | ./exports | Directory exported documents are written to |
/// | LOG_LEVEL | info | tracing level filter |
/// | LOG_DIR | (unset) | Daily rolling log files go here when the directory exists |
/// | REPORT_TITLE | Salarium Financial Report | Title printed on every document |
/// | ENVIRONMENT | development | development / staging / production |
///
/// # Example
///
/// ```ignore
/// EXPORT_DIR=/tmp/reports LOG_LEVEL=debug salarium-report jobs.json technicians.json
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output directory for exported documents
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// Replaces the engine's default report title
    pub report_title: String,
    /// development | staging | production
    pub environment: String,
}

impl ExportConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            output_dir: std::env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./exports")),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            report_title: std::env::var("REPORT_TITLE")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Environment config with a fixed output directory
    ///
    /// Mostly used by tests.
    pub fn with_overrides(output_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.output_dir = output_dir.into();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
