//! Memoisation of evidence aggregation.
//!
//! Keys include the knowledge-base version, so entries from an older
//! snapshot can never be served after a reload; the engine also clears the
//! cache on reload to release them.

use std::sync::Arc;

use moka::sync::Cache;

use oncotier_common::{AnalysisType, VariantAnnotation};
use oncotier_config::CacheConfig;

use crate::aggregator::AggregatedEvidence;

#[derive(Clone)]
pub struct EvidenceCache {
    inner: Cache<String, Arc<AggregatedEvidence>>,
}

impl EvidenceCache {
    pub fn new(max_entries: u64) -> Self {
        Self { inner: Cache::new(max_entries) }
    }

    /// `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.max_entries))
    }

    /// Whole-variant key: two annotations that differ in any field never
    /// share an entry.
    pub fn key(
        kb_version: &str,
        analysis_type: AnalysisType,
        cancer_type: Option<&str>,
        variant: &VariantAnnotation,
    ) -> String {
        let body = serde_json::to_string(variant).unwrap_or_else(|_| variant.variant_key());
        format!("{}|{}|{}|{}", kb_version, analysis_type.as_str(), cancer_type.unwrap_or("-"), body)
    }

    pub fn get_or_insert_with(
        &self,
        key: String,
        aggregate: impl FnOnce() -> AggregatedEvidence,
    ) -> Arc<AggregatedEvidence> {
        self.inner.get_with(key, || Arc::new(aggregate()))
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl std::fmt::Debug for EvidenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> AggregatedEvidence {
        AggregatedEvidence {
            evidence: Vec::new(),
            annotation_completeness: 0.5,
            sources_queried: Vec::new(),
            sources_failed: Vec::new(),
        }
    }

    #[test]
    fn test_second_lookup_is_memoised() {
        let cache = EvidenceCache::new(16);
        let v = VariantAnnotation::new("KRAS", "12", 25398284, "C", "T");
        let key = EvidenceCache::key("v1", AnalysisType::TumorOnly, Some("NSCLC"), &v);
        let mut calls = 0;
        cache.get_or_insert_with(key.clone(), || {
            calls += 1;
            empty()
        });
        cache.get_or_insert_with(key.clone(), || {
            calls += 1;
            empty()
        });
        assert_eq!(calls, 1);
        assert_eq!(cache.entry_count(), 1);
        cache.invalidate_all();
        assert!(cache.inner.get(&key).is_none());
    }

    #[test]
    fn test_key_separates_versions_and_pathways() {
        let v = VariantAnnotation::new("KRAS", "12", 25398284, "C", "T");
        let a = EvidenceCache::key("v1", AnalysisType::TumorOnly, None, &v);
        let b = EvidenceCache::key("v2", AnalysisType::TumorOnly, None, &v);
        let c = EvidenceCache::key("v1", AnalysisType::TumorNormal, None, &v);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(EvidenceCache::from_config(&CacheConfig::default()).is_none());
    }
}
