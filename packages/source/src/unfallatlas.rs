//! Parsing of one yearly Unfallatlas export.
//!
//! A year file is parsed in a single pass: the first non-blank record is
//! the header, every following non-blank record is mapped to a marker or
//! counted as skipped. Parsing yields back to the runtime every
//! `yield_interval` rows so a large file never monopolizes the executor.

use std::collections::BTreeMap;
use std::sync::Arc;

use accident_map_delimited::{DelimitedReader, ReaderOptions};
use accident_map_source_models::Marker;

use crate::SourceError;
use crate::marker::{SkipReason, from_unfallatlas_row};
use crate::schema::{ColumnIndex, SchemaError, UNFALLATLAS_COLUMNS};

/// Default number of rows between cooperative yields.
pub const DEFAULT_YIELD_INTERVAL: usize = 5000;

/// Markers parsed from one year file.
#[derive(Debug, Default)]
pub struct YearBatch {
    pub year: i32,
    /// Markers in file order.
    pub markers: Vec<Marker>,
    /// Non-blank data rows seen.
    pub rows: u64,
    /// Rows that did not produce a marker, by reason.
    pub skipped: BTreeMap<SkipReason, u64>,
}

impl YearBatch {
    /// Total number of skipped rows.
    #[must_use]
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }
}

/// Parser settings for Unfallatlas exports.
#[derive(Debug, Clone)]
pub struct YearParser {
    source_name: Arc<str>,
    options: ReaderOptions,
    yield_interval: usize,
}

impl YearParser {
    #[must_use]
    pub fn new(source_name: impl Into<Arc<str>>) -> Self {
        Self {
            source_name: source_name.into(),
            options: ReaderOptions::semicolon(),
            yield_interval: DEFAULT_YIELD_INTERVAL,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    /// Sets the number of rows between yields. Zero disables yielding.
    #[must_use]
    pub const fn with_yield_interval(mut self, yield_interval: usize) -> Self {
        self.yield_interval = yield_interval;
        self
    }

    /// Parses the full text of one year file.
    ///
    /// # Errors
    ///
    /// * [`SourceError::Schema`] if there is no header row or the header
    ///   lacks required columns.
    /// * [`SourceError::Parse`] if the text cannot be read.
    ///
    /// Rows that cannot be mapped are counted in
    /// [`YearBatch::skipped`], never returned as errors.
    pub async fn parse(&self, text: &str, year: i32) -> Result<YearBatch, SourceError> {
        let mut records = DelimitedReader::new(text.as_bytes(), self.options);

        let columns = loop {
            match records.next().transpose()? {
                Some(record) if record.is_blank() => {}
                Some(record) => break ColumnIndex::resolve(&record.fields, UNFALLATLAS_COLUMNS)?,
                None => return Err(SchemaError::MissingHeader.into()),
            }
        };

        let mut batch = YearBatch {
            year,
            ..YearBatch::default()
        };

        for record in records {
            let record = record?;
            if record.is_blank() {
                continue;
            }

            batch.rows += 1;
            match from_unfallatlas_row(&record.fields, &columns, year, &self.source_name) {
                Ok(marker) => batch.markers.push(marker),
                Err(reason) => *batch.skipped.entry(reason).or_default() += 1,
            }

            if self.yield_interval > 0 && batch.rows % self.yield_interval as u64 == 0 {
                tokio::task::yield_now().await;
            }
        }

        log::debug!(
            "Parsed {year}: {} rows, {} markers, {} skipped",
            batch.rows,
            batch.markers.len(),
            batch.skipped_total()
        );

        Ok(batch)
    }
}
