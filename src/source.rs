//! Raw tabular sources: spreadsheets and delimited text.
//!
//! The format is detected from the leading bytes. Zip containers (xlsx,
//! xlsm, ods) and compound documents (legacy xls) are read with
//! `calamine`; everything else is treated as delimited text.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{data::Cell, error::IngestionError, io_utils};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited,
}

impl SourceFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(CFB_MAGIC) {
            SourceFormat::Spreadsheet
        } else {
            SourceFormat::Delimited
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

/// Header row plus data rows, each padded to the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

pub fn load_raw_table(bytes: &[u8], options: &IngestOptions) -> Result<RawTable, IngestionError> {
    if bytes.is_empty() {
        return Err(IngestionError::EmptySource);
    }
    let format = SourceFormat::detect(bytes);
    debug!("Detected {format:?} source ({} byte(s))", bytes.len());
    match format {
        SourceFormat::Spreadsheet => read_spreadsheet(bytes),
        SourceFormat::Delimited => read_delimited(bytes, options),
    }
}

fn read_delimited(bytes: &[u8], options: &IngestOptions) -> Result<RawTable, IngestionError> {
    let text = io_utils::decode_bytes(bytes, options.encoding)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), options.delimiter);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    let mut builder = TableBuilder::new(headers)?;
    for record in reader.records() {
        let record = record?;
        builder.push(record.iter().map(Cell::from_text).collect())?;
    }
    Ok(builder.finish())
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawTable, IngestionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestionError::NoSheets)??;
    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(IngestionError::MissingHeader)?
        .iter()
        .map(|cell| spreadsheet_cell(cell).as_display().trim().to_string())
        .collect::<Vec<_>>();
    let mut builder = TableBuilder::new(headers)?;
    for row in rows {
        builder.push(row.iter().map(spreadsheet_cell).collect())?;
    }
    Ok(builder.finish())
}

fn spreadsheet_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Float(dt.as_f64())),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    seen: usize,
}

impl TableBuilder {
    fn new(mut headers: Vec<String>) -> Result<Self, IngestionError> {
        while headers.last().is_some_and(|h| h.is_empty()) {
            headers.pop();
        }
        if headers.is_empty() {
            return Err(IngestionError::MissingHeader);
        }
        Ok(Self {
            headers,
            rows: Vec::new(),
            seen: 0,
        })
    }

    fn push(&mut self, mut row: Vec<Cell>) -> Result<(), IngestionError> {
        self.seen += 1;
        let expected = self.headers.len();
        while row.len() > expected && row.last().is_some_and(Cell::is_empty) {
            row.pop();
        }
        if row.len() > expected {
            return Err(IngestionError::RaggedRow {
                row: self.seen + 1,
                expected,
                found: row.len(),
            });
        }
        if row.iter().all(Cell::is_empty) {
            return Ok(());
        }
        row.resize(expected, Cell::Empty);
        self.rows.push(row);
        Ok(())
    }

    fn finish(self) -> RawTable {
        debug!(
            "Read {} row(s) across {} column(s)",
            self.rows.len(),
            self.headers.len()
        );
        RawTable {
            headers: self.headers,
            rows: self.rows,
        }
    }
}
