//! In-memory provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use oncotier_common::KnowledgeSource;

use crate::error::{KbError, Result};
use crate::provider::KnowledgeSourceProvider;
use crate::record::{KbEntry, KbHit, KbQuery};
use crate::snapshot::SourceTable;

/// Mock provider with hardcoded records, or one that always fails.
pub struct MockProvider {
    source: KnowledgeSource,
    table: SourceTable,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(source: KnowledgeSource) -> Self {
        Self { source, table: SourceTable::default(), failure: None, calls: AtomicUsize::new(0) }
    }

    /// Provider whose every lookup returns `KbError::Unavailable`.
    pub fn failing(source: KnowledgeSource, reason: &str) -> Self {
        Self { failure: Some(reason.to_string()), ..Self::new(source) }
    }

    /// Add a record.
    pub fn with(mut self, entry: KbEntry) -> Self {
        self.table.insert(entry);
        self
    }

    /// Number of lookups served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl KnowledgeSourceProvider for MockProvider {
    fn source(&self) -> KnowledgeSource {
        self.source
    }

    fn lookup(&self, query: &KbQuery) -> Result<Vec<KbHit>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(reason) => Err(KbError::Unavailable { kb: self.source, reason: reason.clone() }),
            None => Ok(self.table.lookup(self.source, query)),
        }
    }
}
