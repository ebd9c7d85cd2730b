//! End-to-end tiering against the reference knowledge base.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use oncotier_common::{
    ActionabilityContext, AmpTier, AnalysisType, KnowledgeSource, OncoKbOncogenicity, TieringError,
    ViccClassification,
};
use oncotier_config::{EngineConfig, ThresholdTable};
use oncotier_engine::purity::PurityEstimator;
use oncotier_engine::tiering::{DISCLAIMER_GERMLINE_UNCONFIRMED, DISCLAIMER_TIER_CAPPED};
use oncotier_engine::vicc::calculate_vicc_score;
use oncotier_engine::{PurityMethod, TierCap, TierEngine, TierOptions};
use oncotier_kb::{KbEntry, KbRecord, KbSnapshot, KnowledgeBase, MockProvider};
use oncotier_test_utils::{
    braf_v600e, egfr_l858r, germline_like, germline_noise, kras_g12d, obscure, reference_entries, reference_kb,
    reference_snapshot_json, synthetic_cohort, tp53_r273c, REFERENCE_KB_VERSION,
};

fn engine() -> TierEngine {
    TierEngine::new(reference_kb(), EngineConfig::default())
}

fn with_purity(purity: f64) -> TierOptions<'static> {
    TierOptions { tumor_purity: Some(purity), ..TierOptions::default() }
}

// ── Oncogenicity ─────────────────────────────────────────────────────────────

#[test]
fn test_no_criteria_is_uncertain_significance() {
    let scoring = calculate_vicc_score(&[], &ThresholdTable::default());
    assert_eq!(scoring.total_score, 0);
    assert_eq!(scoring.classification, ViccClassification::UncertainSignificance);
}

// ── Matched-normal scenarios ─────────────────────────────────────────────────

#[test]
fn test_braf_melanoma_tumor_normal_is_tier_ia() {
    let result = engine()
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();

    assert_eq!(result.primary_tier(), AmpTier::TierIA);
    assert_eq!(result.vicc_scoring.classification, ViccClassification::Oncogenic);
    assert!(result.confidence_score > 0.8, "confidence {}", result.confidence_score);
    assert!(result.dsc_scoring.is_none());
    assert!(result.tumor_only_disclaimers.is_empty());
    assert_eq!(result.tier_capped, None);
    assert_eq!(result.kb_version, REFERENCE_KB_VERSION);
    assert!(result.oncokb_scoring.fda_approved_therapies.contains(&"Dabrafenib".to_string()));
}

#[test]
fn test_obscure_gene_without_evidence_is_tier_iv() {
    let result = engine()
        .assign_tier(&obscure(0.3), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    assert!(result.evidence.is_empty());
    assert_eq!(result.primary_tier(), AmpTier::TierIV);
    assert!(result.confidence_score < 0.5);
    assert_eq!(result.vicc_scoring.classification, ViccClassification::UncertainSignificance);
}

#[test]
fn test_uncurated_oncokb_answer_keeps_tier_iv() {
    // What the live OncoKB API returns for a variant nobody has curated
    let oncokb = MockProvider::new(KnowledgeSource::OncoKb).with(
        KbEntry::new(
            "ZNF717",
            KbRecord::OncoKb {
                level: None,
                context: ActionabilityContext::Therapeutic,
                therapies: Vec::new(),
                oncogenicity: Some(OncoKbOncogenicity::Unknown),
                fda_approved: false,
            },
        )
        .alteration("Q400R"),
    );
    let kb = reference_kb().with_provider(Arc::new(oncokb));
    let result = TierEngine::new(kb, EngineConfig::default())
        .assign_tier(&obscure(0.3), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    assert!(result.evidence.is_empty(), "evidence {:?}", result.evidence);
    assert_eq!(result.primary_tier(), AmpTier::TierIV);
    assert!(result.confidence_score < 0.5);
}

#[test]
fn test_off_label_match_does_not_reach_level_a() {
    // Only the colorectal CIViC record and the pan-cancer facts apply in
    // thyroid cancer; FDA and guideline records are matched off-label
    let result = engine()
        .assign_tier(&braf_v600e(0.4), Some("Thyroid Cancer"), AnalysisType::TumorNormal)
        .unwrap();
    assert!(result.primary_tier() > AmpTier::TierIB, "tier {}", result.primary_tier());
}

// ── Tumor-only scenarios ─────────────────────────────────────────────────────

#[test]
fn test_braf_tumor_only_keeps_tier_ia_with_lower_confidence() {
    let engine = engine();
    let matched = engine
        .assign_tier(&braf_v600e(0.45), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    let tumor_only = engine
        .assign_tier_with(&braf_v600e(0.45), Some("Melanoma"), AnalysisType::TumorOnly, &with_purity(0.8))
        .unwrap();

    let dsc = tumor_only.dsc_scoring.as_ref().unwrap();
    assert!(dsc.dsc_score > 0.9, "dsc {}", dsc.dsc_score);
    assert_eq!(dsc.inputs.purity_method, Some(PurityMethod::Metadata));
    assert!(dsc.inputs.hotspot_evidence);
    assert_eq!(tumor_only.primary_tier(), AmpTier::TierIA);
    assert!(tumor_only.confidence_score < matched.confidence_score);
    assert!(tumor_only
        .tumor_only_disclaimers
        .contains(&DISCLAIMER_GERMLINE_UNCONFIRMED.to_string()));
}

#[test]
fn test_moderate_somatic_support_caps_at_tier_ii() {
    let result = engine()
        .assign_tier_with(
            &egfr_l858r(0.25),
            Some("Non-Small Cell Lung Cancer"),
            AnalysisType::TumorOnly,
            &with_purity(0.6),
        )
        .unwrap();

    let dsc = result.dsc_scoring.as_ref().unwrap();
    assert!((0.6..0.9).contains(&dsc.dsc_score), "dsc {}", dsc.dsc_score);
    assert_eq!(result.primary_tier(), AmpTier::TierIIC);
    assert_eq!(
        result.tier_capped,
        Some(TierCap { proposed: AmpTier::TierIA, final_tier: AmpTier::TierIIC })
    );
    assert!(result.tumor_only_disclaimers.contains(&DISCLAIMER_TIER_CAPPED.to_string()));
}

#[test]
fn test_braf_without_hotspot_caps_at_tier_iic() {
    let entries = reference_entries()
        .into_iter()
        .filter(|(_, e)| !(e.gene == "BRAF" && matches!(e.record, KbRecord::Hotspot { .. })));
    let kb = KbSnapshot::from_entries("reference-no-braf-hotspot", entries).into_knowledge_base();
    let result = TierEngine::new(kb, EngineConfig::default())
        .assign_tier_with(&braf_v600e(0.25), Some("Melanoma"), AnalysisType::TumorOnly, &with_purity(0.6))
        .unwrap();

    let dsc = result.dsc_scoring.as_ref().unwrap();
    assert!(!dsc.inputs.hotspot_evidence);
    assert!((0.6..0.9).contains(&dsc.dsc_score), "dsc {}", dsc.dsc_score);
    assert_eq!(result.primary_tier(), AmpTier::TierIIC);
    assert_eq!(
        result.tier_capped,
        Some(TierCap { proposed: AmpTier::TierIA, final_tier: AmpTier::TierIIC })
    );
}

#[test]
fn test_out_of_range_supplied_purity_is_rejected() {
    let cohort = synthetic_cohort(0.6, 20, 7);
    let options = TierOptions { tumor_purity: Some(1.5), cohort: Some(&cohort), ..TierOptions::default() };
    let result = engine().assign_tier_with(&braf_v600e(0.3), Some("Melanoma"), AnalysisType::TumorOnly, &options);
    assert_eq!(result, Err(TieringError::OutOfRange { field: "tumor_purity", value: 1.5 }));
}

#[test]
fn test_germline_looking_variant_is_tier_iii_or_lower() {
    let result = engine()
        .assign_tier_with(&germline_like(0.48), Some("Breast Cancer"), AnalysisType::TumorOnly, &with_purity(0.75))
        .unwrap();

    let dsc = result.dsc_scoring.as_ref().unwrap();
    assert!(dsc.dsc_score < 0.5, "dsc {}", dsc.dsc_score);
    assert!(result.primary_tier() >= AmpTier::TierIII);
}

#[test]
fn test_low_dsc_never_beats_tier_iii() {
    let engine = engine();
    let cases = [
        (braf_v600e(0.9), 0.4),
        (braf_v600e(0.5), 0.9),
        (egfr_l858r(0.05), 0.9),
        (kras_g12d(0.48), 0.75),
        (germline_like(0.5), 0.8),
    ];
    let mut gated = 0;
    for (variant, purity) in cases {
        let result = engine
            .assign_tier_with(&variant, Some("Non-Small Cell Lung Cancer"), AnalysisType::TumorOnly, &with_purity(purity))
            .unwrap();
        let dsc = result.dsc_scoring.as_ref().unwrap();
        if dsc.dsc_score < 0.6 {
            gated += 1;
            assert!(
                result.primary_tier() >= AmpTier::TierIII,
                "{} at dsc {} reached {}",
                result.variant_key,
                dsc.dsc_score,
                result.primary_tier()
            );
        }
    }
    assert!(gated > 0);
}

#[test]
fn test_cohort_purity_is_used_when_none_supplied() {
    let cohort = synthetic_cohort(0.7, 20, 11);
    let options = TierOptions { cohort: Some(&cohort), ..TierOptions::default() };
    let result = engine()
        .assign_tier_with(&braf_v600e(0.35), Some("Melanoma"), AnalysisType::TumorOnly, &options)
        .unwrap();
    let dsc = result.dsc_scoring.as_ref().unwrap();
    assert_eq!(dsc.inputs.purity_method, Some(PurityMethod::VafPeak));
    let purity = dsc.inputs.tumor_purity.unwrap();
    assert!((purity - 0.7).abs() < 0.1, "purity {}", purity);
}

// ── Invariants ───────────────────────────────────────────────────────────────

#[test]
fn test_assign_tier_is_idempotent() {
    let engine = engine();
    for variant in [braf_v600e(0.42), kras_g12d(0.3), tp53_r273c(0.2), germline_like(0.5)] {
        let a = engine
            .assign_tier_with(&variant, Some("Colorectal Cancer"), AnalysisType::TumorOnly, &with_purity(0.6))
            .unwrap();
        let b = engine
            .assign_tier_with(&variant, Some("Colorectal Cancer"), AnalysisType::TumorOnly, &with_purity(0.6))
            .unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}

#[test]
fn test_primary_tier_rederives_from_result() {
    let engine = engine();
    let thresholds = ThresholdTable::default();
    let runs = [
        (braf_v600e(0.42), "Melanoma", AnalysisType::TumorNormal),
        (egfr_l858r(0.25), "Non-Small Cell Lung Cancer", AnalysisType::TumorOnly),
        (kras_g12d(0.3), "Colorectal Cancer", AnalysisType::TumorNormal),
        (germline_like(0.48), "Breast Cancer", AnalysisType::TumorOnly),
    ];
    for (variant, cancer, analysis) in runs {
        let result = engine
            .assign_tier_with(&variant, Some(cancer), analysis, &with_purity(0.6))
            .unwrap();
        assert_eq!(result.rederive_primary_tier(&thresholds), result.primary_tier());
    }
}

#[test]
fn test_result_survives_json_round_trip() {
    let result = engine()
        .assign_tier_with(&braf_v600e(0.45), Some("Melanoma"), AnalysisType::TumorOnly, &with_purity(0.8))
        .unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back: oncotier_engine::TierResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.primary_tier(), result.primary_tier());
    assert_eq!(back.evidence.len(), result.evidence.len());
    assert_eq!(back.threshold_version, result.threshold_version);
}

#[test]
fn test_purity_round_trip() {
    let config = EngineConfig::default();
    let estimator = PurityEstimator::new(&config.vaf, &config.thresholds.purity);
    for (purity, seed) in [(0.4, 1), (0.6, 2), (0.8, 3)] {
        let cohort = synthetic_cohort(purity, 15, seed);
        let estimate = estimator.estimate_purity(&cohort, AnalysisType::TumorOnly, None);
        assert_eq!(estimate.method, PurityMethod::VafPeak);
        assert!((estimate.purity - purity).abs() <= 0.1, "{} vs {}", estimate.purity, purity);
        assert!(estimate.confidence >= 0.5, "confidence {}", estimate.confidence);
        assert_eq!(estimate.supporting_variants, 15);
    }
}

#[test]
fn test_tumor_only_purity_ignores_germline_noise() {
    let config = EngineConfig::default();
    let estimator = PurityEstimator::new(&config.vaf, &config.thresholds.purity);
    let mut cohort = synthetic_cohort(0.4, 15, 4);
    cohort.extend(germline_noise(20, 5));

    let tumor_only = estimator.estimate_purity(&cohort, AnalysisType::TumorOnly, None);
    assert_eq!(tumor_only.method, PurityMethod::VafPeak);
    assert_eq!(tumor_only.supporting_variants, 15);
    assert!((tumor_only.purity - 0.4).abs() <= 0.1, "purity {}", tumor_only.purity);

    // With a matched normal nothing is filtered and the germline peak dominates
    let tumor_normal = estimator.estimate_purity(&cohort, AnalysisType::TumorNormal, None);
    assert_eq!(tumor_normal.supporting_variants, 35);
    assert!(tumor_normal.purity > 0.8, "purity {}", tumor_normal.purity);
}

// ── Degraded knowledge base ──────────────────────────────────────────────────

#[test]
fn test_failed_source_lowers_completeness_only() {
    let healthy = engine()
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();

    let mut kb = reference_kb();
    kb = kb.with_provider(Arc::new(MockProvider::failing(KnowledgeSource::Cosmic, "timed out")));
    let degraded = TierEngine::new(kb, EngineConfig::default())
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();

    assert_eq!(degraded.primary_tier(), healthy.primary_tier());
    assert!(degraded.annotation_completeness < healthy.annotation_completeness);
    assert!(degraded.confidence_score < healthy.confidence_score);
}

#[test]
fn test_snapshot_json_loads_the_same_knowledge() {
    let from_json = KbSnapshot::from_json_str(&reference_snapshot_json()).unwrap();
    let engine_json = TierEngine::new(from_json.into_knowledge_base(), EngineConfig::default());
    let a = engine_json
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    let b = engine()
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_reload_changes_version_and_results() {
    let engine = engine();
    let before = engine
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    engine.reload_kb(KnowledgeBase::new("empty-2025.1"));
    let after = engine
        .assign_tier(&braf_v600e(0.42), Some("Melanoma"), AnalysisType::TumorNormal)
        .unwrap();
    assert_eq!(after.kb_version, "empty-2025.1");
    assert!(after.primary_tier() > before.primary_tier());
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[test]
fn test_batch_matches_single_calls() {
    let engine = engine();
    let mut cohort = synthetic_cohort(0.6, 20, 5);
    cohort.push(braf_v600e(0.3));
    cohort.push(kras_g12d(0.28));

    let batch = engine.assign_tiers(&cohort, Some("Melanoma"), AnalysisType::TumorOnly, None);
    assert_eq!(batch.len(), cohort.len());

    let estimate = engine.estimate_purity(&cohort, AnalysisType::TumorOnly, None);
    let options = TierOptions { purity_estimate: Some(estimate), ..TierOptions::default() };
    for (variant, result) in cohort.iter().zip(&batch) {
        let single = engine
            .assign_tier_with(variant, Some("Melanoma"), AnalysisType::TumorOnly, &options)
            .unwrap();
        assert_eq!(result.as_ref().unwrap(), &single);
    }
}

#[test]
fn test_cached_engine_matches_uncached() {
    let mut config = EngineConfig::default();
    config.cache.enabled = true;
    let cached = TierEngine::new(reference_kb(), config);
    let plain = engine();
    for _ in 0..2 {
        let a = cached
            .assign_tier(&kras_g12d(0.3), Some("Colorectal Cancer"), AnalysisType::TumorNormal)
            .unwrap();
        let b = plain
            .assign_tier(&kras_g12d(0.3), Some("Colorectal Cancer"), AnalysisType::TumorNormal)
            .unwrap();
        assert_eq!(a, b);
    }
}
