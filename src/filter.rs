use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::EmptyResult,
    normalize::{ContestantRecord, NormalizedTable},
};

/// Inclusive participation-date bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// An absent date never satisfies a date predicate.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Inclusive rank bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RankRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl RankRange {
    pub fn between(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, rank: u32) -> bool {
        self.min.is_none_or(|min| rank >= min) && self.max.is_none_or(|max| rank <= max)
    }
}

/// Conjunction of optional predicates. `None` means unrestricted, so the
/// default selection matches every record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSelection {
    pub date_range: Option<DateRange>,
    pub locations: Option<BTreeSet<String>>,
    pub genders: Option<BTreeSet<String>>,
    pub rank_range: Option<RankRange>,
}

impl FilterSelection {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_genders<I, S>(mut self, genders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genders = Some(genders.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rank_range(mut self, range: RankRange) -> Self {
        self.rank_range = Some(range);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.date_range.is_none()
            && self.locations.is_none()
            && self.genders.is_none()
            && self.rank_range.is_none()
    }

    pub fn matches(&self, record: &ContestantRecord) -> bool {
        self.date_range
            .is_none_or(|range| range.contains(record.date_participated))
            && self
                .locations
                .as_ref()
                .is_none_or(|set| member_of(set, record.location.as_deref()))
            && self
                .genders
                .as_ref()
                .is_none_or(|set| member_of(set, record.gender.as_deref()))
            && self
                .rank_range
                .is_none_or(|range| range.contains(record.rank))
    }

    /// Restricts `table` to the matching records, keeping table order.
    pub fn apply<'a>(&self, table: &'a NormalizedTable) -> Result<FilteredTable<'a>, EmptyResult> {
        let rows = table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if rows.is_empty() {
            Err(EmptyResult)
        } else {
            Ok(FilteredTable { table, rows })
        }
    }
}

fn member_of(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    value.is_some_and(|v| set.contains(v))
}

/// Non-empty view over a normalized table.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    table: &'a NormalizedTable,
    rows: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    pub fn table(&self) -> &'a NormalizedTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: construction fails with [`EmptyResult`] instead.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a ContestantRecord> + '_ {
        let records = self.table.records();
        self.rows.iter().map(move |idx| &records[*idx])
    }
}

/// Observed value domain of a table, used to populate filter widgets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterDomain {
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub locations: Vec<String>,
    pub genders: Vec<String>,
    pub rank_bounds: Option<(u32, u32)>,
}

impl FilterDomain {
    pub fn observe(table: &NormalizedTable) -> Self {
        let records = table.records();
        let dates = records.iter().filter_map(|r| r.date_participated);
        let date_bounds = dates.clone().min().zip(dates.max());
        let ranks = records.iter().map(|r| r.rank);
        let rank_bounds = ranks.clone().min().zip(ranks.max());
        Self {
            date_bounds,
            locations: distinct(records.iter().map(|r| r.location.as_deref())),
            genders: distinct(records.iter().map(|r| r.gender.as_deref())),
            rank_bounds,
        }
    }

    /// Every predicate populated with the full observed domain.
    ///
    /// Records with an absent date, location or gender fall outside this
    /// selection, unlike [`FilterSelection::default`]. A predicate whose
    /// observed domain is empty is left unset.
    pub fn select_all(&self) -> FilterSelection {
        FilterSelection {
            date_range: self
                .date_bounds
                .map(|(from, to)| DateRange::between(from, to)),
            locations: populated(&self.locations),
            genders: populated(&self.genders),
            rank_range: Some(
                self.rank_bounds
                    .map(|(min, max)| RankRange::between(min, max))
                    .unwrap_or_default(),
            ),
        }
    }
}

fn populated(values: &[String]) -> Option<BTreeSet<String>> {
    (!values.is_empty()).then(|| values.iter().cloned().collect())
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn sample() -> NormalizedTable {
        normalize(
            b"Contestant id,Name,gender,Location,number of clicks/ points,Date of Participation,Profile Creation Date\n\
A,Ann,M,NY,50,2024-01-05,2023-01-01\n\
B,Bob,F,LA,50,2024-02-10,2023-01-01\n\
C,Cara,M,NY,30,2024-01-20,2023-01-01\n\
D,Dan,,SF,10,,2023-01-01\n",
        )
        .unwrap()
    }

    fn ids(filtered: &FilteredTable<'_>) -> Vec<String> {
        filtered
            .records()
            .filter_map(|r| r.user_id.clone())
            .collect()
    }

    #[test]
    fn default_selection_keeps_everything() {
        let table = sample();
        let filtered = FilterSelection::default().apply(&table).unwrap();
        assert_eq!(filtered.len(), table.len());
    }

    #[test]
    fn location_filter_keeps_table_order() {
        let table = sample();
        let filtered = FilterSelection::default()
            .with_locations(["NY"])
            .apply(&table)
            .unwrap();
        assert_eq!(ids(&filtered), vec!["A", "C"]);
    }

    #[test]
    fn absent_dates_never_match_a_date_range() {
        let table = sample();
        let open = DateRange {
            from: None,
            to: None,
        };
        let filtered = FilterSelection::default()
            .with_date_range(open)
            .apply(&table)
            .unwrap();
        assert!(!ids(&filtered).contains(&"D".to_string()));
    }

    #[test]
    fn date_and_rank_bounds_are_inclusive() {
        let table = sample();
        let jan = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        );
        let filtered = FilterSelection::default()
            .with_date_range(jan)
            .with_rank_range(RankRange::between(1, 3))
            .apply(&table)
            .unwrap();
        assert_eq!(ids(&filtered), vec!["A", "C"]);
    }

    #[test]
    fn no_match_reports_empty_result() {
        let table = sample();
        let result = FilterSelection::default().with_genders(["X"]).apply(&table);
        assert_eq!(result.unwrap_err(), EmptyResult);

        let inverted = FilterSelection::default().with_rank_range(RankRange::between(3, 1));
        assert!(inverted.apply(&table).is_err());
    }

    #[test]
    fn domain_spans_observed_values() {
        let table = sample();
        let domain = FilterDomain::observe(&table);
        assert_eq!(domain.locations, vec!["LA", "NY", "SF"]);
        assert_eq!(domain.genders, vec!["F", "M"]);
        assert_eq!(domain.rank_bounds, Some((1, 4)));
        assert_eq!(
            domain.date_bounds,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
            ))
        );

        let filtered = domain.select_all().apply(&table).unwrap();
        assert_eq!(ids(&filtered), vec!["A", "B", "C"]);
    }

    #[test]
    fn select_all_skips_predicates_with_no_observed_values() {
        let table = normalize(
            b"Contestant id,Name,gender,Location,number of clicks/ points,Date of Participation,Profile Creation Date\n\
A,Ann,,NY,5,n/a,\n\
B,Bob,,LA,7,,\n",
        )
        .unwrap();
        let domain = FilterDomain::observe(&table);
        assert_eq!(domain.date_bounds, None);
        let selection = domain.select_all();
        assert_eq!(selection.date_range, None);
        assert_eq!(selection.genders, None);
        assert_eq!(ids(&selection.apply(&table).unwrap()), vec!["B", "A"]);
    }
}
