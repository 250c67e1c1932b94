//! Row filtering of one export file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use accident_map_delimited::{DelimitedReader, ReaderOptions};

use crate::ExtractError;
use crate::bundesland::normalize_code;

/// Header of the state code column.
pub const REGION_COLUMN: &str = "ULAND";

/// Row counts of one filtered file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Non-blank data rows read.
    pub total: u64,
    /// Rows whose state code matched.
    pub kept: u64,
}

/// Copies the header and every row whose `ULAND` equals `code` from
/// `input` to `output`. Records are written exactly as read.
///
/// # Errors
///
/// * [`ExtractError::MissingHeader`] if `input` is empty.
/// * [`ExtractError::MissingRegionColumn`] if the header has no `ULAND`.
/// * [`ExtractError::MalformedRow`] if a row is too short to hold a state
///   code.
/// * [`ExtractError::Parse`] if a quoted field is never closed.
pub fn filter_rows<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    code: &str,
    file: &str,
) -> Result<RowCounts, ExtractError> {
    let parse_error = |source| ExtractError::Parse {
        file: file.to_string(),
        source,
    };
    let mut records = DelimitedReader::new(input, ReaderOptions::semicolon().strict());

    let header = records
        .next()
        .transpose()
        .map_err(parse_error)?
        .ok_or_else(|| ExtractError::MissingHeader {
            file: file.to_string(),
        })?;
    let column = header
        .fields
        .iter()
        .position(|field| field == REGION_COLUMN)
        .ok_or_else(|| ExtractError::MissingRegionColumn {
            file: file.to_string(),
        })?;
    writeln!(output, "{}", header.raw)?;

    let mut counts = RowCounts::default();
    for record in records {
        let record = record.map_err(parse_error)?;
        if record.raw.trim().is_empty() {
            continue;
        }

        let value = record.get(column).ok_or_else(|| ExtractError::MalformedRow {
            file: file.to_string(),
            line: record.line,
        })?;

        counts.total += 1;
        if normalize_code(value) == code {
            writeln!(output, "{}", record.raw)?;
            counts.kept += 1;
        }
    }

    Ok(counts)
}

/// Filters the file at `source` into a new file at `target`.
///
/// # Errors
///
/// Returns [`ExtractError`] if either file cannot be opened or the source
/// is not a valid export.
pub fn filter_file(source: &Path, target: &Path, code: &str) -> Result<RowCounts, ExtractError> {
    let input = BufReader::new(File::open(source)?);
    let mut output = BufWriter::new(File::create(target)?);
    let counts = filter_rows(input, &mut output, code, &source.display().to_string())?;
    output.flush()?;
    Ok(counts)
}
