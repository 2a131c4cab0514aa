//! Export and input error types

use std::path::PathBuf;

use salarium_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Document rendering failed; nothing was written
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input rows could not be parsed
    #[error("invalid input in {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
