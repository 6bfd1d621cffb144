//! Aggregates over a filtered table.
//!
//! Every aggregate is a free function of a [`FilteredTable`], which is
//! non-empty by construction, so means and maxima are always defined.
//! [`Aggregates::compute`] bundles them for display.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::{
    columns::AGE_COLUMN,
    error::EmptyResult,
    filter::{FilterSelection, FilteredTable},
    normalize::{ContestantRecord, NormalizedTable},
};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 20;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub leaderboard_size: usize,
    pub histogram_bins: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyClicks {
    pub month: YearMonth,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub num_clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub total: usize,
    pub by_gender: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgePoint {
    pub age: f64,
    pub num_clicks: u64,
    pub gender: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub row_count: usize,
    pub total_clicks: u64,
    pub distinct_contestants: usize,
    pub mean_clicks: f64,
    pub max_clicks: u64,
    pub monthly_clicks: Vec<MonthlyClicks>,
    pub gender_clicks: Vec<GroupTotal>,
    pub location_clicks: Vec<GroupTotal>,
    pub gender_counts: Vec<GroupTotal>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub click_histogram: Vec<HistogramBin>,
    /// Present only when the source carries an `Age` column.
    pub age_points: Option<Vec<AgePoint>>,
}

impl Aggregates {
    pub fn compute(filtered: &FilteredTable<'_>, options: &ReportOptions) -> Self {
        Self {
            row_count: filtered.len(),
            total_clicks: total_clicks(filtered),
            distinct_contestants: distinct_contestants(filtered),
            mean_clicks: mean_clicks(filtered),
            max_clicks: max_clicks(filtered),
            monthly_clicks: monthly_clicks(filtered),
            gender_clicks: gender_clicks(filtered),
            location_clicks: location_clicks(filtered),
            gender_counts: gender_counts(filtered),
            leaderboard: leaderboard(filtered, options.leaderboard_size),
            click_histogram: click_histogram(filtered, options.histogram_bins),
            age_points: age_points(filtered),
        }
    }
}

pub fn filter_and_aggregate<'a>(
    table: &'a NormalizedTable,
    selection: &FilterSelection,
) -> Result<(FilteredTable<'a>, Aggregates), EmptyResult> {
    filter_and_aggregate_with(table, selection, &ReportOptions::default())
}

pub fn filter_and_aggregate_with<'a>(
    table: &'a NormalizedTable,
    selection: &FilterSelection,
    options: &ReportOptions,
) -> Result<(FilteredTable<'a>, Aggregates), EmptyResult> {
    let filtered = selection.apply(table)?;
    let aggregates = Aggregates::compute(&filtered, options);
    Ok((filtered, aggregates))
}

/// Saturates at `u64::MAX` instead of overflowing.
pub fn total_clicks(filtered: &FilteredTable<'_>) -> u64 {
    filtered
        .records()
        .map(|r| r.num_clicks)
        .fold(0, u64::saturating_add)
}

pub fn distinct_contestants(filtered: &FilteredTable<'_>) -> usize {
    filtered
        .records()
        .filter_map(|r| r.user_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Total clicks over the filtered row count, not the distinct contestants.
pub fn mean_clicks(filtered: &FilteredTable<'_>) -> f64 {
    total_clicks(filtered) as f64 / filtered.len() as f64
}

pub fn max_clicks(filtered: &FilteredTable<'_>) -> u64 {
    filtered.records().map(|r| r.num_clicks).max().unwrap_or(0)
}

/// Click totals per participation month, oldest first. Records without a
/// participation date are not attributed to any month.
pub fn monthly_clicks(filtered: &FilteredTable<'_>) -> Vec<MonthlyClicks> {
    let mut months: BTreeMap<YearMonth, u64> = BTreeMap::new();
    for record in filtered.records() {
        if let Some(date) = record.date_participated {
            let total = months.entry(YearMonth::of(date)).or_insert(0);
            *total = total.saturating_add(record.num_clicks);
        }
    }
    months
        .into_iter()
        .map(|(month, clicks)| MonthlyClicks { month, clicks })
        .collect()
}

/// Click totals per gender, ordered by gender.
pub fn gender_clicks(filtered: &FilteredTable<'_>) -> Vec<GroupTotal> {
    sum_by(filtered, |r| r.gender.as_deref(), |r| r.num_clicks)
}

/// Click totals per location, highest first.
pub fn location_clicks(filtered: &FilteredTable<'_>) -> Vec<GroupTotal> {
    let mut totals = sum_by(filtered, |r| r.location.as_deref(), |r| r.num_clicks);
    totals.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    totals
}

/// Row counts per gender, most frequent first.
pub fn gender_counts(filtered: &FilteredTable<'_>) -> Vec<GroupTotal> {
    let mut counts = sum_by(filtered, |r| r.gender.as_deref(), |_| 1);
    counts.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    counts
}

fn sum_by<'a, K, V>(filtered: &FilteredTable<'a>, key: K, value: V) -> Vec<GroupTotal>
where
    K: Fn(&'a ContestantRecord) -> Option<&'a str>,
    V: Fn(&'a ContestantRecord) -> u64,
{
    let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
    for record in filtered.records() {
        if let Some(k) = key(record) {
            let total = groups.entry(k).or_insert(0);
            *total = total.saturating_add(value(record));
        }
    }
    groups
        .into_iter()
        .map(|(key, value)| GroupTotal {
            key: key.to_string(),
            value,
        })
        .collect()
}

/// First `limit` records by ascending rank; equal ranks keep table order.
pub fn leaderboard(filtered: &FilteredTable<'_>, limit: usize) -> Vec<LeaderboardEntry> {
    filtered
        .records()
        .sorted_by_key(|r| r.rank)
        .take(limit)
        .map(|r| LeaderboardEntry {
            rank: r.rank,
            name: r.name.clone(),
            gender: r.gender.clone(),
            location: r.location.clone(),
            num_clicks: r.num_clicks,
        })
        .collect()
}

/// Equal-width histogram of clicks over `[min, max]`, last bin closed.
pub fn click_histogram(filtered: &FilteredTable<'_>, bins: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = filtered
        .records()
        .map(|r| r.num_clicks)
        .minmax()
        .into_option()
    else {
        return Vec::new();
    };
    let (min, max) = (min as f64, max as f64);
    let bins = if max > min { bins.max(1) } else { 1 };
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut histogram = (0..bins)
        .map(|idx| HistogramBin {
            lower: min + width * idx as f64,
            upper: if idx + 1 == bins {
                max.max(min + width)
            } else {
                min + width * (idx + 1) as f64
            },
            total: 0,
            by_gender: BTreeMap::new(),
        })
        .collect::<Vec<_>>();

    for record in filtered.records() {
        let offset = (record.num_clicks as f64 - min) / width;
        let idx = (offset.floor() as usize).min(bins - 1);
        let bin = &mut histogram[idx];
        bin.total += 1;
        if let Some(gender) = &record.gender {
            *bin.by_gender.entry(gender.clone()).or_insert(0) += 1;
        }
    }
    histogram
}

/// Age against clicks, when the source has an `Age` column. Rows whose age
/// is not numeric are left out.
pub fn age_points(filtered: &FilteredTable<'_>) -> Option<Vec<AgePoint>> {
    let table = filtered.table();
    if !table.has_column(AGE_COLUMN) {
        return None;
    }
    let points = filtered
        .records()
        .filter_map(|r| {
            let age = table.extra(r, AGE_COLUMN)?.as_f64()?;
            Some(AgePoint {
                age,
                num_clicks: r.num_clicks,
                gender: r.gender.clone(),
                name: r.name.clone(),
                location: r.location.clone(),
                rank: r.rank,
            })
        })
        .collect();
    Some(points)
}
