use std::fs;
use std::path::{Path, PathBuf};

use hive_core::error::AppError;
use hive_core::ports::{Attachment, RenderedArtifact, WorkbookRenderer};
use hive_core::report::{ExportPayload, Sheet};
use tracing::debug;

pub const CHARTS_FILE_NAME: &str = "charts.json";

/// Renders every non-blank sheet as its own CSV attachment, plus a `charts.json`
/// with the chart specs resolved to literal category/value arrays (CSV has no
/// formula-linked charts).
#[derive(Debug, Clone)]
pub struct CsvBundleRenderer {
    stem: String,
}

impl CsvBundleRenderer {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }

    pub fn file_name_for(&self, sheet_name: &str) -> String {
        format!("{}_{}.csv", slug(&self.stem), slug(sheet_name))
    }
}

impl Default for CsvBundleRenderer {
    fn default() -> Self {
        Self::new("Hive Metrics")
    }
}

/// Filesystem-safe lowercase name: runs of anything but ASCII alphanumerics become `_`.
pub fn slug(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn sheet_csv(sheet: &Sheet) -> Result<Vec<u8>, AppError> {
    let fail = |e: String| {
        AppError::new("RENDER_CSV_FAILED", "Failed to write sheet as CSV")
            .with_details(format!("sheet={}; err={e}", sheet.name))
    };

    let mut wtr = csv::WriterBuilder::new()
        .flexible(false)
        .from_writer(Vec::new());
    wtr.write_record(&sheet.columns).map_err(|e| fail(e.to_string()))?;
    for row in &sheet.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| fail(e.to_string()))?;
    }
    wtr.into_inner().map_err(|e| fail(e.to_string()))
}

impl WorkbookRenderer for CsvBundleRenderer {
    fn render(&self, payload: &ExportPayload) -> Result<RenderedArtifact, AppError> {
        let mut attachments = Vec::new();
        for sheet in payload.sheets.iter().filter(|s| !s.is_blank()) {
            let bytes = sheet_csv(sheet)?;
            debug!(sheet = %sheet.name, bytes = bytes.len(), "rendered sheet");
            attachments.push(Attachment {
                file_name: self.file_name_for(&sheet.name),
                content_type: "text/csv".to_string(),
                bytes,
            });
        }

        let charts = payload.with_literal_charts()?.charts;
        let bytes = serde_json::to_vec_pretty(&charts).map_err(|e| {
            AppError::new("RENDER_CSV_FAILED", "Failed to encode chart specs")
                .with_details(e.to_string())
        })?;
        attachments.push(Attachment {
            file_name: CHARTS_FILE_NAME.to_string(),
            content_type: "application/json".to_string(),
            bytes,
        });

        Ok(RenderedArtifact { attachments })
    }
}

/// Persist every attachment under `dir`, returning the written paths in order.
pub fn write_artifact(dir: &Path, artifact: &RenderedArtifact) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new("RENDER_WRITE_FAILED", "Failed to create output directory")
            .with_details(format!("path={}: {}", dir.display(), e))
    })?;

    let mut written = Vec::with_capacity(artifact.attachments.len());
    for a in &artifact.attachments {
        let path = dir.join(&a.file_name);
        fs::write(&path, &a.bytes).map_err(|e| {
            AppError::new("RENDER_WRITE_FAILED", "Failed to write report file")
                .with_details(format!("path={}: {}", path.display(), e))
        })?;
        written.push(path);
    }
    Ok(written)
}
