//! Error types surfaced by the ingestion and filtering core.
//!
//! Only two conditions ever reach the caller: the source could not be read
//! as a table at all ([`IngestionError`]), or a filter selection matched no
//! rows ([`EmptyResult`]). Dirty cells are coerced during normalization and
//! never produce an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("source is empty")]
    EmptySource,
    #[error("source is not valid {encoding} text")]
    Decode { encoding: &'static str },
    #[error("failed to parse delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("spreadsheet does not contain any sheets")]
    NoSheets,
    #[error("source does not contain a header row")]
    MissingHeader,
    #[error("row {row} has {found} cell(s) but the header defines {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("required column '{0}' not found")]
    MissingColumn(&'static str),
}

/// A filter selection matched zero rows.
///
/// Not a fault: callers show a notice and skip aggregation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No data matches the selected filters.")]
pub struct EmptyResult;
