use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::reconcile::{AlbumStatus, CompareReport, PhotoMatch};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// Write a comparison report. CSV output has one row per missing photo,
/// plus one row for each album with nothing missing.
pub fn export_compare_report(report: &CompareReport, output_path: &Path, format: ExportFormat) -> Result<usize> {
    match format {
        ExportFormat::Json => export_json(report, output_path)?,
        ExportFormat::Csv => export_report_csv(report, output_path)?,
    }
    Ok(report.albums.len())
}

/// Write the local-to-remote photo matches.
pub fn export_matches(matches: &[PhotoMatch], output_path: &Path, format: ExportFormat) -> Result<usize> {
    match format {
        ExportFormat::Json => export_json(matches, output_path)?,
        ExportFormat::Csv => export_matches_csv(matches, output_path)?,
    }
    Ok(matches.len())
}

fn export_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn csv_writer(output_path: &Path) -> Result<csv::Writer<File>> {
    csv::Writer::from_path(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))
}

fn export_report_csv(report: &CompareReport, output_path: &Path) -> Result<()> {
    let mut wtr = csv_writer(output_path)?;

    wtr.write_record([
        "album",
        "status",
        "remote_album_id",
        "local_count",
        "remote_count",
        "missing_filename",
        "width",
        "height",
    ])?;

    for album in &report.albums {
        let remote_id = album.status.remote_album_id().unwrap_or("");
        let remote_count = match &album.status {
            AlbumStatus::NeedsReconcile { remote_count, .. } => remote_count.to_string(),
            AlbumStatus::InSync { .. } => album.local_count.to_string(),
            AlbumStatus::ToCreate { .. } => String::new(),
        };
        let local_count = album.local_count.to_string();
        let prefix = [
            album.title.as_str(),
            album.status.label(),
            remote_id,
            local_count.as_str(),
            remote_count.as_str(),
        ];

        let missing = album.status.missing();
        if missing.is_empty() {
            wtr.write_record(prefix.iter().copied().chain(["", "", ""]))?;
        }
        for photo in missing {
            let width = photo.width.to_string();
            let height = photo.height.to_string();
            wtr.write_record(
                prefix
                    .iter()
                    .copied()
                    .chain([photo.filename.as_str(), width.as_str(), height.as_str()]),
            )?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn export_matches_csv(matches: &[PhotoMatch], output_path: &Path) -> Result<()> {
    let mut wtr = csv_writer(output_path)?;

    wtr.write_record([
        "album",
        "local_id",
        "filename",
        "width",
        "height",
        "remote_id",
        "remote_filename",
        "remote_album",
    ])?;

    for m in matches {
        let remote = m.remote.as_ref();
        let width = m.width.to_string();
        let height = m.height.to_string();
        wtr.write_record([
            m.album_title.as_str(),
            m.local_id.as_str(),
            m.filename.as_str(),
            width.as_str(),
            height.as_str(),
            remote.map(|r| r.id.as_str()).unwrap_or(""),
            remote.map(|r| r.filename.as_str()).unwrap_or(""),
            remote.and_then(|r| r.album_title.as_deref()).unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
