//! Export Service
//!
//! Renders a [`Report`] in memory and saves it atomically:
//!
//! ```text
//! Report ──render──► bytes ──write──► <name>.part ──rename──► <name>
//! ```
//!
//! A failed render touches no file. A failed write or rename removes the
//! partial file, so the output directory only ever holds complete documents.

use std::path::{Path, PathBuf};

use salarium_render::{ExportFormat, PdfRenderer, Renderer, SpreadsheetRenderer, export_file_name};
use shared::report::Report;
use tracing::{error, info, instrument, warn};

use crate::core::ExportConfig;
use crate::utils::{ExportError, ExportResult};

/// Formats written by [`ExportService::export_all`], in order
pub const ALL_FORMATS: [ExportFormat; 2] = [ExportFormat::Xlsx, ExportFormat::Pdf];

#[derive(Debug, Clone)]
pub struct ExportService {
    config: ExportConfig,
    spreadsheet: SpreadsheetRenderer,
    pdf: PdfRenderer,
}

impl ExportService {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            spreadsheet: SpreadsheetRenderer::new(),
            pdf: PdfRenderer::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    fn renderer(&self, format: ExportFormat) -> &dyn Renderer {
        match format {
            ExportFormat::Xlsx => &self.spreadsheet,
            ExportFormat::Pdf => &self.pdf,
        }
    }

    /// Render `report` and save it to the output directory
    ///
    /// The file name carries the report's generation date. Returns the path
    /// of the saved document.
    #[instrument(skip(self, report), fields(scope = %report.scope_label))]
    pub async fn export(&self, report: &Report, format: ExportFormat) -> ExportResult<PathBuf> {
        let bytes = self
            .renderer(format)
            .render(report)
            .inspect_err(|e| error!(format = %format, error = %e, "Render failed, nothing written"))?;

        let dir = self.output_dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExportError::io(dir, e))?;

        let file_name = export_file_name(
            &report.scope_label,
            report.generated_at.date_naive(),
            format,
        );
        let path = dir.join(&file_name);
        let tmp_path = dir.join(format!("{file_name}.part"));

        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            warn!(path = %tmp_path.display(), error = %e, "Failed to write export file");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ExportError::io(&tmp_path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            warn!(path = %path.display(), error = %e, "Failed to move export file into place");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(ExportError::io(&path, e));
        }

        info!(path = %path.display(), size = bytes.len(), "Report exported");
        Ok(path)
    }

    /// Export every format; stops at the first failure
    pub async fn export_all(&self, report: &Report) -> ExportResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(ALL_FORMATS.len());
        for format in ALL_FORMATS {
            paths.push(self.export(report, format).await?);
        }
        Ok(paths)
    }
}
