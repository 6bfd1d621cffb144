//! Content-addressed cache for the normalized table.
//!
//! Holds at most one table, keyed by the SHA-256 digest of the source bytes
//! together with the ingest options that read them. Loading a source with a
//! different key replaces the entry, so a table is never shared across
//! sources or across readings of the same bytes.

use std::{fmt, sync::Arc};

use log::debug;
use sha2::{Digest, Sha256};

use crate::{
    error::IngestionError,
    normalize::{NormalizedTable, normalize_with},
    source::IngestOptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    digest: String,
    delimiter: u8,
    encoding: &'static str,
}

impl SourceKey {
    pub fn of(bytes: &[u8], options: &IngestOptions) -> Self {
        SourceKey {
            digest: format!("{:x}", Sha256::digest(bytes)),
            delimiter: options.delimiter,
            encoding: options.encoding.name(),
        }
    }

    /// Hex SHA-256 of the source bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, delimiter {:?})",
            self.digest, self.encoding, self.delimiter as char
        )
    }
}

#[derive(Debug, Default)]
pub struct TableCache {
    entry: Option<(SourceKey, Arc<NormalizedTable>)>,
    hits: usize,
    misses: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `bytes`, normalizing on a miss.
    ///
    /// A failed normalization leaves the previous entry untouched.
    pub fn get_or_normalize(
        &mut self,
        bytes: &[u8],
        options: &IngestOptions,
    ) -> Result<Arc<NormalizedTable>, IngestionError> {
        let key = SourceKey::of(bytes, options);
        if let Some((cached_key, table)) = &self.entry
            && *cached_key == key
        {
            self.hits += 1;
            debug!("Cache hit for source {key}");
            return Ok(Arc::clone(table));
        }
        self.misses += 1;
        debug!("Cache miss for source {key}");
        let table = Arc::new(normalize_with(bytes, options)?);
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    pub fn current_key(&self) -> Option<&SourceKey> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn invalidate(&mut self) {
        if let Some((key, _)) = self.entry.take() {
            debug!("Invalidated cached table for source {key}");
        }
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
