//! Presentation-layer session state.
//!
//! A [`Dashboard`] owns everything that outlives a single recomputation: the
//! cached normalized table and the per-session download counter. The
//! pipeline functions it calls stay stateless.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};

use crate::{
    aggregate::{Aggregates, ReportOptions, filter_and_aggregate_with},
    cache::TableCache,
    error::{EmptyResult, IngestionError},
    export,
    filter::{FilterDomain, FilterSelection, FilteredTable},
    normalize::NormalizedTable,
    source::IngestOptions,
};

/// Counts user-initiated downloads within one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadCounter(usize);

impl DownloadCounter {
    pub fn increment(&mut self) -> usize {
        self.0 += 1;
        self.0
    }

    pub fn count(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    cache: TableCache,
    downloads: DownloadCounter,
    ingest: IngestOptions,
    report: ReportOptions,
}

impl Dashboard {
    pub fn new(ingest: IngestOptions, report: ReportOptions) -> Self {
        Self {
            ingest,
            report,
            ..Self::default()
        }
    }

    /// Loads a source, reusing the cached table when the bytes are unchanged.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Arc<NormalizedTable>, IngestionError> {
        let table = self.cache.get_or_normalize(bytes, &self.ingest)?;
        info!("Loaded {} contestant record(s)", table.len());
        Ok(table)
    }

    pub fn domain(table: &NormalizedTable) -> FilterDomain {
        FilterDomain::observe(table)
    }

    pub fn refresh<'a>(
        &self,
        table: &'a NormalizedTable,
        selection: &FilterSelection,
    ) -> Result<(FilteredTable<'a>, Aggregates), EmptyResult> {
        debug!("Applying filter selection {selection:?}");
        filter_and_aggregate_with(table, selection, &self.report)
    }

    /// Renders the filtered table as CSV and records the download.
    pub fn download_csv(&mut self, filtered: &FilteredTable<'_>) -> Result<Vec<u8>> {
        let bytes = export::to_csv_bytes(filtered)?;
        let count = self.downloads.increment();
        info!("CSV downloaded {count} time(s) this session");
        Ok(bytes)
    }

    pub fn downloads(&self) -> DownloadCounter {
        self.downloads
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &[u8] = b"Contestant id,Name,gender,Location,number of clicks/ points,Date of Participation,Profile Creation Date\n\
A,Ann,M,NY,50,2024-01-05,2023-01-01\n\
B,Bob,F,LA,50,2024-02-10,2023-01-01\n\
C,Cara,M,NY,30,2024-01-20,2023-01-01\n";

    #[test]
    fn reload_of_same_source_is_cached() {
        let mut dashboard = Dashboard::default();
        dashboard.load(SOURCE).unwrap();
        dashboard.load(SOURCE).unwrap();
        assert_eq!(dashboard.cache().hits(), 1);
        assert_eq!(dashboard.cache().misses(), 1);
    }

    #[test]
    fn downloads_are_counted_per_call() {
        let mut dashboard = Dashboard::default();
        let table = dashboard.load(SOURCE).unwrap();
        let (filtered, _) = dashboard
            .refresh(&table, &FilterSelection::default())
            .unwrap();
        dashboard.download_csv(&filtered).unwrap();
        dashboard.download_csv(&filtered).unwrap();
        assert_eq!(dashboard.downloads().count(), 2);
    }

    #[test]
    fn refresh_honours_report_options() {
        let options = ReportOptions {
            leaderboard_size: 2,
            ..ReportOptions::default()
        };
        let mut dashboard = Dashboard::new(IngestOptions::default(), options);
        let table = dashboard.load(SOURCE).unwrap();
        let (_, aggregates) = dashboard
            .refresh(&table, &FilterSelection::default())
            .unwrap();
        assert_eq!(aggregates.leaderboard.len(), 2);
    }

    #[test]
    fn empty_selection_short_circuits() {
        let mut dashboard = Dashboard::default();
        let table = dashboard.load(SOURCE).unwrap();
        let selection = FilterSelection::default().with_locations(["Nowhere"]);
        assert_eq!(
            dashboard.refresh(&table, &selection).unwrap_err(),
            EmptyResult
        );
    }
}
