//! Immutable in-memory knowledge-base snapshot.
//!
//! A snapshot is loaded once (from a JSON export or built in memory) and
//! then only read. Each source gets its own gene-indexed table, exposed to
//! the engine as a [`SnapshotProvider`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use oncotier_common::hgvs::normalise_protein_change;
use oncotier_common::{CancerMatch, KnowledgeSource};

use crate::error::Result;
use crate::provider::{KnowledgeBase, KnowledgeSourceProvider};
use crate::record::{Alteration, KbEntry, KbHit, KbQuery};

/// On-disk snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: String,
    #[serde(default)]
    pub sources: BTreeMap<KnowledgeSource, Vec<KbEntry>>,
}

/// Records of one source, indexed by upper-cased gene symbol.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    by_gene: HashMap<String, Vec<KbEntry>>,
}

impl SourceTable {
    pub fn insert(&mut self, entry: KbEntry) {
        self.by_gene.entry(entry.gene.to_uppercase()).or_default().push(entry);
    }

    pub fn len(&self) -> usize {
        self.by_gene.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gene.is_empty()
    }

    /// Records for the query's gene that match its alteration and cancer type.
    ///
    /// With a cancer type, records curated for that tumor are `Specific` and
    /// pan-cancer records are `PanCancer`; records for other tumors are
    /// skipped. Without one, every record is returned as `PanCancer`.
    pub fn lookup(&self, source: KnowledgeSource, query: &KbQuery) -> Vec<KbHit> {
        let Some(entries) = self.by_gene.get(&query.gene.to_uppercase()) else {
            return Vec::new();
        };
        let match_level = query.alteration.match_level();
        entries
            .iter()
            .filter(|entry| alteration_matches(entry, &query.alteration))
            .filter_map(|entry| {
                let cancer_match = match &query.cancer_type {
                    Some(_) if entry.is_pan_cancer() => CancerMatch::PanCancer,
                    Some(ct) if entry.cancer_types.iter().any(|c| cancer_type_matches(c, ct)) => {
                        CancerMatch::Specific
                    }
                    Some(_) => return None,
                    None => CancerMatch::PanCancer,
                };
                Some(KbHit {
                    source,
                    alteration: entry.alteration.clone(),
                    cancer_types: entry.cancer_types.clone(),
                    match_level,
                    cancer_match,
                    record: entry.record.clone(),
                })
            })
            .collect()
    }
}

fn strip_protein_prefix(s: &str) -> &str {
    let s = s.trim();
    let s = s.rsplit_once(':').map(|(_, r)| r).unwrap_or(s);
    s.strip_prefix("p.").unwrap_or(s)
}

fn alteration_matches(entry: &KbEntry, alteration: &Alteration) -> bool {
    let Some(raw) = entry.alteration.as_deref() else {
        return matches!(alteration, Alteration::Gene);
    };
    match alteration {
        Alteration::Gene => true,
        Alteration::ShortForm(short) => strip_protein_prefix(raw).eq_ignore_ascii_case(short),
        Alteration::Exact(hgvs) => {
            let stored = strip_protein_prefix(raw);
            if stored.eq_ignore_ascii_case(strip_protein_prefix(hgvs)) {
                return true;
            }
            // Same change, but only when the record itself uses three-letter notation
            match (normalise_protein_change(raw), normalise_protein_change(hgvs)) {
                (Some(a), Some(b)) => a == b && stored.starts_with(a.ref_aa.as_str()),
                _ => false,
            }
        }
    }
}

/// Case-insensitive match that also accepts containment, so "Melanoma"
/// matches "Cutaneous Melanoma".
pub fn cancer_type_matches(record_type: &str, query: &str) -> bool {
    let a = record_type.trim().to_lowercase();
    let b = query.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Versioned, read-only collection of source tables.
#[derive(Debug, Clone)]
pub struct KbSnapshot {
    version: String,
    loaded_at: DateTime<Utc>,
    tables: BTreeMap<KnowledgeSource, Arc<SourceTable>>,
}

impl KbSnapshot {
    pub fn from_entries(
        version: impl Into<String>,
        entries: impl IntoIterator<Item = (KnowledgeSource, KbEntry)>,
    ) -> Self {
        let mut tables: BTreeMap<KnowledgeSource, SourceTable> = BTreeMap::new();
        for (source, entry) in entries {
            tables.entry(source).or_default().insert(entry);
        }
        Self {
            version: version.into(),
            loaded_at: Utc::now(),
            tables: tables.into_iter().map(|(s, t)| (s, Arc::new(t))).collect(),
        }
    }

    pub fn from_file(file: SnapshotFile) -> Self {
        let SnapshotFile { version, sources } = file;
        Self::from_entries(
            version,
            sources
                .into_iter()
                .flat_map(|(source, entries)| entries.into_iter().map(move |e| (source, e))),
        )
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        Ok(Self::from_file(file))
    }

    /// Load a JSON snapshot export from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            version = %snapshot.version,
            sources = snapshot.tables.len(),
            entries = snapshot.entry_count(),
            "Knowledge-base snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn sources(&self) -> Vec<KnowledgeSource> {
        self.tables.keys().copied().collect()
    }

    pub fn entry_count(&self) -> usize {
        self.tables.values().map(|t| t.len()).sum()
    }

    pub fn lookup(&self, source: KnowledgeSource, query: &KbQuery) -> Vec<KbHit> {
        self.tables
            .get(&source)
            .map(|t| t.lookup(source, query))
            .unwrap_or_default()
    }

    /// One provider per source table, sharing the underlying data.
    pub fn providers(&self) -> Vec<Arc<dyn KnowledgeSourceProvider>> {
        self.tables
            .iter()
            .map(|(source, table)| {
                Arc::new(SnapshotProvider { source: *source, table: Arc::clone(table) })
                    as Arc<dyn KnowledgeSourceProvider>
            })
            .collect()
    }

    pub fn into_knowledge_base(self) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new(self.version.clone());
        for provider in self.providers() {
            kb = kb.with_provider(provider);
        }
        kb
    }
}

/// Provider backed by one snapshot table.
pub struct SnapshotProvider {
    source: KnowledgeSource,
    table: Arc<SourceTable>,
}

impl KnowledgeSourceProvider for SnapshotProvider {
    fn source(&self) -> KnowledgeSource {
        self.source
    }

    fn lookup(&self, query: &KbQuery) -> Result<Vec<KbHit>> {
        let hits = self.table.lookup(self.source, query);
        debug!(source = %self.source, gene = %query.gene, hits = hits.len(), "snapshot lookup");
        Ok(hits)
    }
}
