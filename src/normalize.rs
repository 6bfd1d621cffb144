//! Ingestion and normalization of contestant data.
//!
//! `normalize` turns raw source bytes into a [`NormalizedTable`]: headers are
//! mapped to canonical names, cells coerced to their field types and every
//! record ranked by clicks. The function is pure, so identical bytes always
//! produce an identical table.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::{
    columns::{ColumnLayout, Field, RANK_COLUMN, Slot},
    data::{Cell, coerce_clicks},
    error::IngestionError,
    source::{IngestOptions, RawTable, load_raw_table},
};

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestantRecord {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub num_clicks: u64,
    pub date_participated: Option<NaiveDate>,
    pub profile_creation_date: Option<NaiveDate>,
    pub rank: u32,
    /// Pass-through cells, aligned with [`NormalizedTable::extra_names`].
    pub extras: Vec<Cell>,
}

impl ContestantRecord {
    fn from_row(layout: &ColumnLayout, row: &[Cell]) -> Self {
        let cell = |field: Field| {
            layout
                .position(field)
                .and_then(|idx| row.get(idx))
                .unwrap_or(&EMPTY_CELL)
        };
        let extras = layout
            .slots
            .iter()
            .zip(row)
            .filter(|(slot, _)| matches!(slot, Slot::Extra(_)))
            .map(|(_, value)| value.clone())
            .collect();
        Self {
            user_id: cell(Field::UserId).as_text(),
            name: cell(Field::Name).as_text(),
            gender: cell(Field::Gender).as_text(),
            location: cell(Field::Location).as_text(),
            num_clicks: coerce_clicks(cell(Field::NumClicks)),
            date_participated: cell(Field::DateParticipated).as_date(),
            profile_creation_date: cell(Field::ProfileCreationDate).as_date(),
            rank: 0,
            extras,
        }
    }

    /// Cell text for an output column of the normalized table.
    pub fn field_display(&self, field: Field) -> String {
        let format_date = |date: Option<NaiveDate>| {
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        match field {
            Field::UserId => self.user_id.clone().unwrap_or_default(),
            Field::Name => self.name.clone().unwrap_or_default(),
            Field::Gender => self.gender.clone().unwrap_or_default(),
            Field::Location => self.location.clone().unwrap_or_default(),
            Field::NumClicks => self.num_clicks.to_string(),
            Field::DateParticipated => format_date(self.date_participated),
            Field::ProfileCreationDate => format_date(self.profile_creation_date),
        }
    }
}

/// Canonical contestant table, ordered by clicks descending.
///
/// Ties keep their source order. Never mutated after construction; filters
/// produce views over it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    layout: ColumnLayout,
    records: Vec<ContestantRecord>,
}

impl NormalizedTable {
    pub fn from_raw(raw: &RawTable) -> Result<Self, IngestionError> {
        let layout = ColumnLayout::from_headers(&raw.headers)?;
        let mut records = raw
            .rows
            .iter()
            .map(|row| ContestantRecord::from_row(&layout, row))
            .collect::<Vec<_>>();
        assign_ranks(&mut records);
        debug!(
            "Normalized {} record(s) with {} pass-through column(s)",
            records.len(),
            layout.extra_names.len()
        );
        Ok(Self { layout, records })
    }

    pub fn records(&self) -> &[ContestantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extra_names(&self) -> &[String] {
        &self.layout.extra_names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.layout.extra_index(name).is_some()
    }

    /// Pass-through cell of `record` for the named column.
    pub fn extra<'a>(&self, record: &'a ContestantRecord, name: &str) -> Option<&'a Cell> {
        self.layout
            .extra_index(name)
            .and_then(|idx| record.extras.get(idx))
    }

    /// Export header: source column order with renamed headers, then `rank`.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self
            .layout
            .output_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        headers.push(RANK_COLUMN.to_string());
        headers
    }

    /// Row cells in the order given by [`NormalizedTable::headers`].
    pub fn row_values(&self, record: &ContestantRecord) -> Vec<String> {
        let mut values = self
            .layout
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Field(field) => record.field_display(*field),
                Slot::Extra(idx) => record
                    .extras
                    .get(*idx)
                    .map(Cell::as_display)
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        values.push(record.rank.to_string());
        values
    }
}

/// Orders records by clicks descending and assigns min-tie ranks.
///
/// `rank = 1 + |{records with strictly more clicks}|`, so clicks
/// `[50, 50, 30]` rank as `[1, 1, 3]`.
pub fn assign_ranks(records: &mut [ContestantRecord]) {
    records.sort_by(|a, b| b.num_clicks.cmp(&a.num_clicks));
    let mut previous: Option<(u64, u32)> = None;
    for (position, record) in records.iter_mut().enumerate() {
        let rank = match previous {
            Some((clicks, rank)) if clicks == record.num_clicks => rank,
            _ => u32::try_from(position + 1).unwrap_or(u32::MAX),
        };
        record.rank = rank;
        previous = Some((record.num_clicks, rank));
    }
}

pub fn normalize(bytes: &[u8]) -> Result<NormalizedTable, IngestionError> {
    normalize_with(bytes, &IngestOptions::default())
}

pub fn normalize_with(
    bytes: &[u8],
    options: &IngestOptions,
) -> Result<NormalizedTable, IngestionError> {
    let raw = load_raw_table(bytes, options)?;
    NormalizedTable::from_raw(&raw)
}
