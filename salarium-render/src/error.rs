//! Error types for the renderer library

use thiserror::Error;

/// Renderer error types
///
/// A failed render produces exactly one of these and no output bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Zip container error while assembling a workbook
    #[error("Spreadsheet container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PDF assembly or serialisation failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// IO error while writing document bytes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Layout could not be produced (e.g. invalid cell reference)
    #[error("Layout error: {0}")]
    Layout(String),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;
