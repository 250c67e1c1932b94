#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline extraction of one federal state from raw Unfallatlas exports.
//!
//! The nationwide yearly CSV files are large; the map only needs one
//! state. [`run`] filters every `.csv` file of a source directory by its
//! `ULAND` column and replaces the `.csv` files of the target directory
//! with the results.

pub mod bundesland;
pub mod filter;
pub mod staging;

use std::path::{Path, PathBuf};

use accident_map_delimited::ParseError;
use accident_map_source::progress::ProgressCallback;

use crate::filter::{RowCounts, filter_file};
use crate::staging::{StagingDir, csv_files};

/// Errors that abort an extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The file has no header row.
    #[error("Missing header row in {file}")]
    MissingHeader { file: String },

    /// The header has no `ULAND` column.
    #[error("Missing ULAND column in {file}")]
    MissingRegionColumn { file: String },

    /// A data row ends before the `ULAND` column.
    #[error("Malformed CSV row at line {line} in {file}: missing ULAND value")]
    MalformedRow { file: String, line: usize },

    /// The file is not valid delimited text.
    #[error("Malformed CSV in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    /// The requested state is neither a known name nor a two-digit code.
    #[error("Unsupported bundesland: {value:?}. Use a known name or a 2-digit code (e.g. 08).")]
    UnsupportedRegion { value: String },

    /// Source and target resolve to the same directory.
    #[error("Source and target directories must be different: {}", path.display())]
    SameDirectory { path: PathBuf },

    /// The source directory does not exist.
    #[error("Source directory does not exist: {}", path.display())]
    MissingSourceDir { path: PathBuf },

    /// The source directory holds no `.csv` files.
    #[error("No CSV files found in: {}", path.display())]
    NoSourceFiles { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Row counts of one extracted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file_name: String,
    pub rows: RowCounts,
}

/// Result of a whole extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub code: String,
    pub files: Vec<FileSummary>,
}

impl ExtractSummary {
    /// Row counts summed over all files.
    #[must_use]
    pub fn totals(&self) -> RowCounts {
        self.files
            .iter()
            .fold(RowCounts::default(), |totals, file| RowCounts {
                total: totals.total + file.rows.total,
                kept: totals.kept + file.rows.kept,
            })
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Filters every `.csv` file of `source_dir` down to the rows of state
/// `code` and syncs the results into `target_dir`.
///
/// The target is only touched after every file has been filtered.
///
/// # Errors
///
/// Returns [`ExtractError`] if the directories are invalid or any file
/// fails to filter. The target directory is unchanged in that case.
pub fn run(
    source_dir: &Path,
    target_dir: &Path,
    code: &str,
    progress: &dyn ProgressCallback,
) -> Result<ExtractSummary, ExtractError> {
    let source_dir = absolute(source_dir)?;
    let target_dir = absolute(target_dir)?;

    if source_dir == target_dir {
        return Err(ExtractError::SameDirectory { path: source_dir });
    }
    if !source_dir.is_dir() {
        return Err(ExtractError::MissingSourceDir { path: source_dir });
    }

    let files = csv_files(&source_dir)?;
    if files.is_empty() {
        return Err(ExtractError::NoSourceFiles { path: source_dir });
    }

    let staging = StagingDir::beside(&target_dir)?;
    progress.set_total(files.len() as u64);

    let mut summary = ExtractSummary {
        code: code.to_string(),
        files: Vec::with_capacity(files.len()),
    };
    for file_name in files {
        progress.set_message(file_name.clone());
        let rows = filter_file(
            &source_dir.join(&file_name),
            &staging.path().join(&file_name),
            code,
        )?;
        log::info!(
            "[{file_name}] kept {} of {} rows for ULAND={code}",
            rows.kept,
            rows.total
        );
        progress.inc(1);
        summary.files.push(FileSummary { file_name, rows });
    }

    staging.sync_into(&target_dir)?;

    let totals = summary.totals();
    progress.finish(format!("ULAND={code}: {} files", summary.files.len()));
    log::info!(
        "Wrote {} filtered CSV file(s) to {}",
        summary.files.len(),
        target_dir.display()
    );
    log::info!(
        "Total rows kept: {} of {} for ULAND={code}",
        totals.kept,
        totals.total
    );

    Ok(summary)
}
