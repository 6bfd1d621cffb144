//! CSV export of a filtered table.
//!
//! Columns follow [`NormalizedTable::headers`]: source order with canonical
//! names, then the computed `rank`. Output is UTF-8 with every field quoted.

use std::io::Write;

use anyhow::{Context, Result};

use crate::{filter::FilteredTable, io_utils, normalize::NormalizedTable};

pub fn write_csv<W: Write>(filtered: &FilteredTable<'_>, writer: W) -> Result<()> {
    let table: &NormalizedTable = filtered.table();
    let mut csv = io_utils::csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
    csv.write_record(table.headers())
        .context("Writing export header")?;
    for (idx, record) in filtered.records().enumerate() {
        csv.write_record(table.row_values(record))
            .with_context(|| format!("Writing export row {}", idx + 1))?;
    }
    csv.flush().context("Flushing export")?;
    Ok(())
}

pub fn to_csv_bytes(filtered: &FilteredTable<'_>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(filtered, &mut buffer)?;
    Ok(buffer)
}
