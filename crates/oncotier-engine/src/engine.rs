//! Tier Assignment Engine: the public entry point.
//!
//! `assign_tier` is a pure function of the variant, the cancer type, the
//! analysis type and the knowledge base current at call time. Batches are
//! tiered in parallel with rayon; the only shared state is the read-only
//! knowledge base and the optional evidence cache.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use oncotier_common::{AnalysisType, Result, TieringError, VariantAnnotation};
use oncotier_config::EngineConfig;
use oncotier_kb::{KbRegistry, KnowledgeBase};

use crate::aggregator::{AggregatedEvidence, EvidenceAggregator};
use crate::cache::EvidenceCache;
use crate::dsc::DscCalculator;
use crate::oncokb::calculate_oncokb_score;
use crate::purity::{PurityEstimate, PurityEstimator, PurityMetadata};
use crate::router::{PathwayRouter, WorkflowRouter};
use crate::strategies::StrategyManager;
use crate::tiering::{
    compute_amp_scoring, confidence_score, proposed_primary_tier, tumor_only_disclaimers, TierCap,
    TierResult,
};
use crate::vicc::calculate_vicc_score;

/// Per-call purity inputs for tumor-only DSC scoring.
#[derive(Debug, Clone, Default)]
pub struct TierOptions<'a> {
    /// Caller-supplied purity; wins over everything else
    pub tumor_purity: Option<f64>,
    /// Cohort to estimate purity from when none is supplied
    pub cohort: Option<&'a [VariantAnnotation]>,
    /// Purity already estimated for the whole sample
    pub purity_estimate: Option<PurityEstimate>,
}

pub struct TierEngine {
    registry: Arc<KbRegistry>,
    config: EngineConfig,
    cache: Option<EvidenceCache>,
    strategies: StrategyManager,
}

impl TierEngine {
    pub fn new(kb: KnowledgeBase, config: EngineConfig) -> Self {
        Self::from_registry(Arc::new(KbRegistry::new(kb)), config)
    }

    /// Share a registry with other components that may reload it.
    pub fn from_registry(registry: Arc<KbRegistry>, config: EngineConfig) -> Self {
        let cache = EvidenceCache::from_config(&config.cache);
        let strategies = StrategyManager::new(&config.thresholds.tiers);
        Self { registry, config, cache, strategies }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kb_version(&self) -> String {
        self.registry.version()
    }

    /// Swap in a new knowledge base and drop memoised evidence.
    pub fn reload_kb(&self, kb: KnowledgeBase) -> String {
        let previous = self.registry.reload(kb);
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        previous.version().to_string()
    }

    pub fn assign_tier(
        &self,
        variant: &VariantAnnotation,
        cancer_type: Option<&str>,
        analysis_type: AnalysisType,
    ) -> Result<TierResult> {
        self.assign_tier_with(variant, cancer_type, analysis_type, &TierOptions::default())
    }

    #[instrument(skip(self, variant, options), fields(variant = %variant.variant_key(), analysis = analysis_type.as_str()))]
    pub fn assign_tier_with(
        &self,
        variant: &VariantAnnotation,
        cancer_type: Option<&str>,
        analysis_type: AnalysisType,
        options: &TierOptions<'_>,
    ) -> Result<TierResult> {
        variant.validate()?;
        if let Some(purity) = options.tumor_purity.filter(|p| !(0.0..=1.0).contains(p)) {
            return Err(TieringError::OutOfRange { field: "tumor_purity", value: purity });
        }
        let cancer_type = cancer_type.map(str::trim).filter(|c| !c.is_empty());
        if cancer_type.is_none() {
            warn!(gene = %variant.gene, "No cancer type given, matching pan-cancer only");
        }

        let kb = self.registry.current();
        let thresholds = &self.config.thresholds;
        let router = PathwayRouter::from_config(&self.config, analysis_type);
        let aggregated = self.aggregate(&kb, variant, cancer_type, &router);

        let vicc = calculate_vicc_score(&aggregated.evidence, thresholds);
        let oncokb = calculate_oncokb_score(&aggregated.evidence);

        let dsc = match analysis_type {
            AnalysisType::TumorNormal => None,
            AnalysisType::TumorOnly => {
                let calculator = DscCalculator::new(router.vaf_thresholds(), &thresholds.purity);
                let purity = if options.tumor_purity.or(variant.tumor_purity).is_some() {
                    calculator.resolve_purity(variant, options.tumor_purity, None, analysis_type)
                } else if let Some(estimate) = &options.purity_estimate {
                    Some(estimate.clone())
                } else {
                    calculator.resolve_purity(variant, None, options.cohort, analysis_type)
                };
                Some(calculator.score_with_purity(variant, &aggregated.evidence, purity.as_ref()))
            }
        };

        let amp = compute_amp_scoring(
            &aggregated.evidence,
            &vicc,
            &oncokb,
            dsc.as_ref(),
            thresholds,
            &self.strategies,
        );
        let proposed = proposed_primary_tier(&amp);
        let capped = proposed != amp.primary_tier;
        if capped {
            debug!(proposed = %proposed, tier = %amp.primary_tier, "Tier capped by DSC gate");
        }

        let confidence = confidence_score(
            &amp,
            !aggregated.evidence.is_empty(),
            aggregated.annotation_completeness,
            cancer_type.is_some(),
            dsc.as_ref(),
            capped,
        );
        let disclaimers = dsc
            .as_ref()
            .map(|d| tumor_only_disclaimers(d, capped, &thresholds.dsc))
            .unwrap_or_default();

        debug!(
            tier = %amp.primary_tier,
            context = amp.primary_context.as_str(),
            vicc = vicc.classification.label(),
            confidence,
            "Variant tiered"
        );

        Ok(TierResult {
            variant_key: variant.variant_key(),
            gene: variant.gene.clone(),
            hgvs_p: variant.hgvs_p.clone(),
            analysis_type,
            cancer_type: cancer_type.map(str::to_string),
            tier_capped: capped.then_some(TierCap { proposed, final_tier: amp.primary_tier }),
            amp_scoring: amp,
            vicc_scoring: vicc,
            oncokb_scoring: oncokb,
            dsc_scoring: dsc,
            evidence: aggregated.evidence.clone(),
            confidence_score: confidence,
            annotation_completeness: aggregated.annotation_completeness,
            tumor_only_disclaimers: disclaimers,
            threshold_version: thresholds.version.clone(),
            kb_version: kb.version().to_string(),
        })
    }

    fn aggregate(
        &self,
        kb: &KnowledgeBase,
        variant: &VariantAnnotation,
        cancer_type: Option<&str>,
        router: &dyn WorkflowRouter,
    ) -> Arc<AggregatedEvidence> {
        let run = || EvidenceAggregator::new(kb, &self.config.thresholds).aggregate_evidence(variant, cancer_type, router);
        match &self.cache {
            Some(cache) => {
                let key = EvidenceCache::key(kb.version(), router.analysis_type(), cancer_type, variant);
                cache.get_or_insert_with(key, run)
            }
            None => Arc::new(run()),
        }
    }

    /// Estimate sample purity once for a batch.
    pub fn estimate_purity(
        &self,
        cohort: &[VariantAnnotation],
        analysis_type: AnalysisType,
        metadata: Option<&PurityMetadata>,
    ) -> PurityEstimate {
        PurityEstimator::new(&self.config.vaf, &self.config.thresholds.purity)
            .estimate_purity(cohort, analysis_type, metadata)
    }

    /// Tier a whole sample in parallel. Results keep the input order; a
    /// variant that violates the input contract yields an error in its slot
    /// without affecting the others.
    pub fn assign_tiers(
        &self,
        cohort: &[VariantAnnotation],
        cancer_type: Option<&str>,
        analysis_type: AnalysisType,
        metadata: Option<&PurityMetadata>,
    ) -> Vec<Result<TierResult>> {
        let purity_estimate = match analysis_type {
            AnalysisType::TumorOnly => Some(self.estimate_purity(cohort, analysis_type, metadata)),
            AnalysisType::TumorNormal => None,
        };
        let options = TierOptions { tumor_purity: None, cohort: None, purity_estimate };

        let results: Vec<Result<TierResult>> = cohort
            .par_iter()
            .map(|variant| self.assign_tier_with(variant, cancer_type, analysis_type, &options))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            variants = cohort.len(),
            failed,
            analysis = analysis_type.as_str(),
            kb_version = %self.kb_version(),
            "Batch tiered"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{AmpTier, KnowledgeSource};
    use oncotier_kb::{KbEntry, KbRecord, MockProvider};

    fn engine_with(provider: MockProvider, cache: bool) -> TierEngine {
        let mut config = EngineConfig::default();
        config.cache.enabled = cache;
        TierEngine::new(KnowledgeBase::new("kb-test").with_provider(Arc::new(provider)), config)
    }

    fn variant() -> VariantAnnotation {
        let mut v = VariantAnnotation::new("KRAS", "12", 25398284, "C", "T");
        v.hgvs_p = Some("p.Gly12Asp".into());
        v.consequences = vec!["missense_variant".into()];
        v.vaf = Some(0.3);
        v.depth = Some(120);
        v
    }

    #[test]
    fn test_invalid_variant_is_rejected() {
        let engine = engine_with(MockProvider::new(KnowledgeSource::Civic), false);
        let mut v = variant();
        v.gene = String::new();
        assert_eq!(
            engine.assign_tier(&v, Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorNormal),
            Err(TieringError::MissingField("gene"))
        );
    }

    #[test]
    fn test_failing_source_still_returns_result() {
        let engine = engine_with(MockProvider::failing(KnowledgeSource::Civic, "down"), false);
        let result = engine.assign_tier(&variant(), Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorNormal).unwrap();
        assert_eq!(result.primary_tier(), AmpTier::TierIV);
        assert!(result.annotation_completeness < 0.5);
        assert!(result.tumor_only_disclaimers.is_empty());
        assert!(result.dsc_scoring.is_none());
    }

    #[test]
    fn test_cache_hit_and_reload_invalidation() {
        let provider = Arc::new(MockProvider::new(KnowledgeSource::Civic).with(
            KbEntry::new("KRAS", KbRecord::Oncogenic { oncogenic: true, functional_study: true }).alteration("G12D"),
        ));
        let mut config = EngineConfig::default();
        config.cache.enabled = true;
        let engine = TierEngine::new(KnowledgeBase::new("v1").with_provider(provider.clone()), config);

        let first = engine.assign_tier(&variant(), Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorNormal).unwrap();
        let calls = provider.call_count();
        let second = engine.assign_tier(&variant(), Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorNormal).unwrap();
        assert_eq!(provider.call_count(), calls);
        assert_eq!(first, second);

        let previous = engine.reload_kb(KnowledgeBase::new("v2"));
        assert_eq!(previous, "v1");
        let third = engine.assign_tier(&variant(), Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorNormal).unwrap();
        assert_eq!(third.kb_version, "v2");
        assert!(third.evidence.is_empty());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_errors() {
        let engine = engine_with(MockProvider::new(KnowledgeSource::Civic), false);
        let mut bad = variant();
        bad.vaf = Some(2.0);
        let cohort = vec![variant(), bad, variant()];
        let results = engine.assign_tiers(&cohort, Some("Pancreatic Adenocarcinoma"), AnalysisType::TumorOnly, None);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        // Three variants are too few to estimate purity
        let dsc = results[0].as_ref().unwrap().dsc_scoring.as_ref().unwrap();
        assert_eq!(dsc.inputs.purity_method, Some(crate::purity::PurityMethod::InsufficientData));
    }
}
