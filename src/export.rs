//! Tabular export of indicator series.
//!
//! Each indicator becomes one Polars [`DataFrame`] with the columns
//! `date, sample_size, mean, std, ic95`, written as one CSV or Parquet file
//! named after the indicator id. Batches of reports are exported
//! concurrently, one output directory per report.

use crate::constants::EXPORT_COLUMNS;
use crate::error::{Result, StudyError};
use crate::models::{Indicator, StudyResult};

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::task;
use tracing::{debug, info, warn};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename pattern"));

/// Output file format for indicator tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Build the table of one indicator's series
pub fn indicator_frame(indicator: &Indicator) -> Result<DataFrame> {
    let series = indicator.series();

    let frame = DataFrame::new(vec![
        Column::new(
            EXPORT_COLUMNS[0].into(),
            series.iter().map(|p| p.date).collect::<Vec<f64>>(),
        ),
        Column::new(
            EXPORT_COLUMNS[1].into(),
            series.iter().map(|p| p.sample_size).collect::<Vec<u64>>(),
        ),
        Column::new(
            EXPORT_COLUMNS[2].into(),
            series.iter().map(|p| p.mean).collect::<Vec<f64>>(),
        ),
        Column::new(
            EXPORT_COLUMNS[3].into(),
            series.iter().map(|p| p.std).collect::<Vec<f64>>(),
        ),
        Column::new(
            EXPORT_COLUMNS[4].into(),
            series.iter().map(|p| p.ic95).collect::<Vec<f64>>(),
        ),
    ])?;

    Ok(frame)
}

/// One table per indicator, keyed by indicator id in report order
pub fn indicator_frames(result: &StudyResult) -> Result<IndexMap<String, DataFrame>> {
    result
        .indicators()
        .iter()
        .map(|(id, indicator)| Ok((id.clone(), indicator_frame(indicator)?)))
        .collect()
}

/// File name for an indicator table; unsafe characters become `_`
pub fn table_filename(indicator_id: &str, format: ExportFormat) -> String {
    let stem = UNSAFE_FILENAME_CHARS.replace_all(indicator_id, "_");
    format!("{}.{}", stem, format.extension())
}

/// Write every indicator table of `result` into `dir`
pub fn write_tables(result: &StudyResult, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (id, mut frame) in indicator_frames(result)? {
        let path = dir.join(table_filename(&id, format));
        let file = std::fs::File::create(&path)?;

        match format {
            ExportFormat::Csv => {
                CsvWriter::new(file)
                    .include_header(true)
                    .finish(&mut frame)?;
            }
            ExportFormat::Parquet => {
                ParquetWriter::new(file).finish(&mut frame)?;
            }
        }

        debug!("Wrote {} rows for '{}' to {}", frame.height(), id, path.display());
        written.push(path);
    }

    info!("Exported {} indicator tables to {}", written.len(), dir.display());
    Ok(written)
}

/// Outcome of exporting one report in a batch
#[derive(Debug)]
pub struct ReportExport {
    pub report: PathBuf,
    pub output_dir: PathBuf,
    pub outcome: Result<Vec<PathBuf>>,
}

/// Statistics of a batch export
#[derive(Debug, Default)]
pub struct ExportStats {
    pub reports_exported: usize,
    pub reports_failed: usize,
    pub tables_written: usize,
}

/// Concurrent exporter for many report files
#[derive(Debug, Clone)]
pub struct BatchExporter {
    output_root: PathBuf,
    format: ExportFormat,
    parallelism: usize,
    show_progress: bool,
}

impl BatchExporter {
    pub fn new(output_root: PathBuf, format: ExportFormat) -> Self {
        Self {
            output_root,
            format,
            parallelism: num_cpus::get(),
            show_progress: true,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Directory receiving the tables of `report`
    pub fn output_dir_for(&self, report: &Path) -> PathBuf {
        let stem = report
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "report".to_string());
        self.output_root.join(stem)
    }

    /// Parse and export every report; failures are collected, not fatal
    pub async fn export_all(&self, reports: Vec<PathBuf>) -> (Vec<ReportExport>, ExportStats) {
        let progress = if self.show_progress {
            let bar = ProgressBar::new(reports.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let exports = stream::iter(reports)
            .map(|report| {
                let output_dir = self.output_dir_for(&report);
                let format = self.format;
                let progress = progress.clone();
                async move {
                    let report_for_task = report.clone();
                    let dir_for_task = output_dir.clone();
                    let outcome = task::spawn_blocking(move || {
                        let result = StudyResult::from_report_file(&report_for_task)?;
                        write_tables(&result, &dir_for_task, format)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(StudyError::Io(std::io::Error::other(format!(
                            "export task failed: {e}"
                        ))))
                    });

                    progress.inc(1);
                    ReportExport {
                        report,
                        output_dir,
                        outcome,
                    }
                }
            })
            .buffer_unordered(self.parallelism)
            .collect::<Vec<_>>()
            .await;

        progress.finish_and_clear();

        let mut stats = ExportStats::default();
        for export in &exports {
            match &export.outcome {
                Ok(tables) => {
                    stats.reports_exported += 1;
                    stats.tables_written += tables.len();
                }
                Err(e) => {
                    stats.reports_failed += 1;
                    warn!("Failed to export {}: {}", export.report.display(), e);
                }
            }
        }

        (exports, stats)
    }
}
