//! Evidence aggregation across knowledge sources.
//!
//! For each provider the aggregator walks the match cascade
//! (exact HGVS → one-letter short form → gene level), stopping at the first
//! rung that returns records. Each rung asks for the query cancer type
//! first and falls back to the pan-cancer query when nothing cancer-specific
//! matched. Hits are converted to evidence, deduplicated on (source, code),
//! weighted by the workflow router and returned in a stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use oncotier_common::{
    CancerMatch, Evidence, EvidencePayload, KnowledgeSource, VariantAnnotation,
};
use oncotier_config::ThresholdTable;
use oncotier_kb::{Alteration, KbHit, KbQuery, KnowledgeBase, KnowledgeSourceProvider};

use crate::criteria::{build_evidence, CriteriaInput};
use crate::router::WorkflowRouter;

/// Share of annotation completeness given to knowledge-source coverage;
/// the rest comes from the variant's own annotation fields.
const SOURCE_COVERAGE_SHARE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEvidence {
    /// Deduplicated, weighted and sorted by (source, code)
    pub evidence: Vec<Evidence>,
    /// 0.0–1.0
    pub annotation_completeness: f64,
    pub sources_queried: Vec<KnowledgeSource>,
    pub sources_failed: Vec<KnowledgeSource>,
}

pub struct EvidenceAggregator<'a> {
    kb: &'a KnowledgeBase,
    thresholds: &'a ThresholdTable,
}

impl<'a> EvidenceAggregator<'a> {
    pub fn new(kb: &'a KnowledgeBase, thresholds: &'a ThresholdTable) -> Self {
        Self { kb, thresholds }
    }

    /// Collect all evidence for one variant.
    #[instrument(skip(self, variant, router), fields(gene = %variant.gene, analysis = router.analysis_type().as_str()))]
    pub fn aggregate_evidence(
        &self,
        variant: &VariantAnnotation,
        cancer_type: Option<&str>,
        router: &dyn WorkflowRouter,
    ) -> AggregatedEvidence {
        let rungs = cascade(variant);
        let mut hits = Vec::new();
        let mut sources_queried = Vec::new();
        let mut sources_failed = Vec::new();

        for provider in self.kb.providers() {
            let source = provider.source();
            sources_queried.push(source);
            match query_provider(provider.as_ref(), &variant.gene, &rungs, cancer_type) {
                Ok(found) => hits.extend(found),
                Err(e) => {
                    warn!(source = %source, error = %e, "Knowledge source unavailable, continuing without it");
                    sources_failed.push(source);
                }
            }
        }

        let input = CriteriaInput { variant, cancer_type, thresholds: self.thresholds };
        let raw = build_evidence(input, &hits);
        let mut evidence = deduplicate(raw);
        for ev in &mut evidence {
            let weight = router.get_evidence_weight(ev.source);
            ev.score *= weight;
            ev.confidence = (ev.confidence * weight).clamp(0.0, 1.0);
            ev.weight = Some(weight);
        }
        evidence.sort_by(|a, b| a.dedup_key().cmp(&b.dedup_key()));

        let annotation_completeness =
            completeness(variant, sources_queried.len(), sources_failed.len());
        debug!(
            hits = hits.len(),
            evidence = evidence.len(),
            failed = sources_failed.len(),
            completeness = annotation_completeness,
            "Evidence aggregated"
        );

        AggregatedEvidence { evidence, annotation_completeness, sources_queried, sources_failed }
    }
}

/// Alteration rungs for a variant, most specific first.
fn cascade(variant: &VariantAnnotation) -> Vec<Alteration> {
    let mut rungs = Vec::with_capacity(3);
    match variant.protein_change() {
        Some(pc) => {
            rungs.push(Alteration::Exact(pc.hgvs_p));
            rungs.push(Alteration::ShortForm(pc.short_form));
        }
        // Indels and other notations the normaliser does not cover
        None => {
            if let Some(raw) = variant.hgvs_p.as_deref().filter(|p| !p.trim().is_empty()) {
                rungs.push(Alteration::Exact(raw.trim().to_string()));
            }
        }
    }
    rungs.push(Alteration::Gene);
    rungs
}

fn query_provider(
    provider: &dyn KnowledgeSourceProvider,
    gene: &str,
    rungs: &[Alteration],
    cancer_type: Option<&str>,
) -> oncotier_kb::Result<Vec<KbHit>> {
    for alteration in rungs {
        let mut hits = Vec::new();
        if let Some(ct) = cancer_type {
            hits = provider.lookup(&KbQuery::new(gene, alteration.clone(), Some(ct)))?;
        }
        if !hits.iter().any(|h| h.cancer_match == CancerMatch::Specific) {
            hits = provider.lookup(&KbQuery::new(gene, alteration.clone(), None))?;
        }
        if !hits.is_empty() {
            return Ok(hits);
        }
    }
    Ok(Vec::new())
}

fn merge_therapies(into: &mut Vec<String>, from: &[String]) {
    for therapy in from {
        if !into.iter().any(|t| t.eq_ignore_ascii_case(therapy)) {
            into.push(therapy.clone());
        }
    }
}

fn therapies_of(ev: &Evidence) -> &[String] {
    match &ev.payload {
        EvidencePayload::Biomarker(b) => &b.therapies,
        EvidencePayload::OncoKbImplication(o) => &o.therapies,
        _ => &[],
    }
}

/// Keep one record per (source, code): highest confidence, cancer-specific
/// on ties, with therapies merged across duplicates.
fn deduplicate(evidence: Vec<Evidence>) -> Vec<Evidence> {
    let mut kept: BTreeMap<(KnowledgeSource, String), Evidence> = BTreeMap::new();
    for ev in evidence {
        let key = ev.dedup_key();
        let Some(existing) = kept.get_mut(&key) else {
            kept.insert(key, ev);
            continue;
        };
        let prefer_new = ev.confidence > existing.confidence
            || (ev.confidence == existing.confidence
                && ev.provenance.cancer_match == CancerMatch::Specific
                && existing.provenance.cancer_match != CancerMatch::Specific);
        let mut therapies = therapies_of(existing).to_vec();
        merge_therapies(&mut therapies, therapies_of(&ev));
        if prefer_new {
            *existing = ev;
        }
        match &mut existing.payload {
            EvidencePayload::Biomarker(b) => b.therapies = therapies,
            EvidencePayload::OncoKbImplication(o) => o.therapies = therapies,
            _ => {}
        }
    }
    kept.into_values().collect()
}

/// Fraction of sources that answered, blended with the fraction of
/// annotation fields present on the variant.
fn completeness(variant: &VariantAnnotation, queried: usize, failed: usize) -> f64 {
    let coverage = if queried == 0 {
        0.0
    } else {
        (queried - failed) as f64 / queried as f64
    };
    let fields = [
        variant.hgvs_p.is_some(),
        variant.hgvs_c.is_some(),
        !variant.consequences.is_empty(),
        variant.vaf.is_some(),
        variant.depth.is_some(),
    ];
    let present = fields.iter().filter(|f| **f).count() as f64 / fields.len() as f64;
    SOURCE_COVERAGE_SHARE * coverage + (1.0 - SOURCE_COVERAGE_SHARE) * present
}
