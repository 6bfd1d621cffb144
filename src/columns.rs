//! Canonical column mapping.
//!
//! Source headers are matched exactly (case and wording sensitive) against a
//! fixed table. Matches for the seven contestant fields become typed fields
//! of [`crate::normalize::ContestantRecord`]; `rank` and `Device/Browser Info`
//! are renamed but passed through; every other header passes through
//! verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::IngestionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    UserId,
    Name,
    Gender,
    Location,
    NumClicks,
    DateParticipated,
    ProfileCreationDate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::UserId,
        Field::Name,
        Field::Gender,
        Field::Location,
        Field::NumClicks,
        Field::DateParticipated,
        Field::ProfileCreationDate,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::UserId => "user_id",
            Field::Name => "name",
            Field::Gender => "gender",
            Field::Location => "location",
            Field::NumClicks => "num_clicks",
            Field::DateParticipated => "date_participated",
            Field::ProfileCreationDate => "profile_creation_date",
        }
    }

    fn from_canonical(name: &str) -> Option<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.canonical_name() == name)
    }
}

pub const RANK_COLUMN: &str = "rank";
pub const AGE_COLUMN: &str = "Age";
pub const PROVIDED_RANK_COLUMN: &str = "provided_rank";
pub const DEVICE_COLUMN: &str = "device";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Field(Field),
    Rename(&'static str),
}

const SOURCE_COLUMN_MAP: &[(&str, Target)] = &[
    ("Contestant id", Target::Field(Field::UserId)),
    ("Name", Target::Field(Field::Name)),
    ("gender", Target::Field(Field::Gender)),
    ("Location", Target::Field(Field::Location)),
    ("number of clicks/ points", Target::Field(Field::NumClicks)),
    ("Date of Participation", Target::Field(Field::DateParticipated)),
    ("Profile Creation Date", Target::Field(Field::ProfileCreationDate)),
    ("Device/Browser Info", Target::Rename(DEVICE_COLUMN)),
    ("rank", Target::Rename(PROVIDED_RANK_COLUMN)),
];

fn resolve(header: &str) -> Option<Target> {
    SOURCE_COLUMN_MAP
        .iter()
        .find(|(source, _)| *source == header)
        .map(|(_, target)| *target)
        .or_else(|| Field::from_canonical(header).map(Target::Field))
}

/// Pass-through name that collides with no other output header: canonical
/// field names, the computed `rank` and earlier pass-through columns. A
/// colliding name gets the first free `_2`, `_3`, ... suffix.
fn unique_name(candidate: &str, taken: &[String]) -> String {
    let is_free = |name: &str| {
        name != RANK_COLUMN
            && Field::from_canonical(name).is_none()
            && !taken.iter().any(|t| t == name)
    };
    if is_free(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{candidate}_{n}"))
        .find(|name| is_free(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Where a source column ends up in the normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Field(Field),
    /// Index into the record's pass-through cells.
    Extra(usize),
}

/// Resolved layout of a source header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub slots: Vec<Slot>,
    pub extra_names: Vec<String>,
    field_positions: HashMap<Field, usize>,
}

impl ColumnLayout {
    pub fn from_headers(headers: &[String]) -> Result<Self, IngestionError> {
        let mut slots = Vec::with_capacity(headers.len());
        let mut extra_names = Vec::new();
        let mut field_positions = HashMap::new();

        for (idx, header) in headers.iter().enumerate() {
            let slot = match resolve(header) {
                Some(Target::Field(field)) if !field_positions.contains_key(&field) => {
                    field_positions.insert(field, idx);
                    Slot::Field(field)
                }
                Some(Target::Rename(renamed)) => {
                    extra_names.push(unique_name(renamed, &extra_names));
                    Slot::Extra(extra_names.len() - 1)
                }
                _ => {
                    extra_names.push(unique_name(header, &extra_names));
                    Slot::Extra(extra_names.len() - 1)
                }
            };
            slots.push(slot);
        }

        if let Some(missing) = Field::ALL
            .into_iter()
            .find(|field| !field_positions.contains_key(field))
        {
            return Err(IngestionError::MissingColumn(missing.canonical_name()));
        }

        Ok(Self {
            slots,
            extra_names,
            field_positions,
        })
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        self.field_positions.get(&field).copied()
    }

    pub fn extra_index(&self, name: &str) -> Option<usize> {
        self.extra_names.iter().position(|n| n == name)
    }

    /// Output header for each slot, in source order.
    pub fn output_names(&self) -> Vec<&str> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Field(field) => field.canonical_name(),
                Slot::Extra(idx) => self.extra_names[*idx].as_str(),
            })
            .collect()
    }
}
