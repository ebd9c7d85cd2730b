//! AMP/ASCO/CAP 2017 tier assignment.
//!
//! Each actionability context is tiered independently from its evidence
//! score, the oncogenicity call and the OncoKB levels. The primary tier is
//! the strongest context tier (Therapeutic wins ties). In tumor-only runs
//! the DSC score sets a ceiling on every context.
//!
//! Everything here is a pure function of the evidence list and the
//! sub-scores, so a [`TierResult`] can always be re-derived from its own
//! fields.

use serde::{Deserialize, Serialize};

use oncotier_common::confidence::clamp_unit;
use oncotier_common::{
    ActionabilityContext, AmpTier, AnalysisType, Evidence, EvidencePayload, EvidenceStrength,
    OncoKbLevel,
};
use oncotier_config::{DscThresholds, ThresholdTable};

use crate::conflict::{detect_conflicts, is_context_uncertain, EvidenceConflict};
use crate::dsc::DynamicSomaticConfidence;
use crate::oncokb::OncoKbScoring;
use crate::purity::PurityMethod;
use crate::strategies::StrategyManager;
use crate::vicc::ViccScoring;

// Disclaimer codes attached to tumor-only results
pub const DISCLAIMER_GERMLINE_UNCONFIRMED: &str = "TUMOR_ONLY_GERMLINE_UNCONFIRMED";
pub const DISCLAIMER_TIER_CAPPED: &str = "TIER_CAPPED_BY_DSC";
pub const DISCLAIMER_LOW_DSC_CONFIDENCE: &str = "LOW_DSC_CONFIDENCE";
pub const DISCLAIMER_POSSIBLE_GERMLINE: &str = "POSSIBLE_GERMLINE";
pub const DISCLAIMER_PURITY_ESTIMATED: &str = "PURITY_ESTIMATED";

/// DSC confidence below which the gate itself is flagged as shaky.
const LOW_DSC_CONFIDENCE: f64 = 0.5;
const UNKNOWN_CANCER_PENALTY: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTier {
    pub context: ActionabilityContext,
    /// Tier before the tumor-only DSC ceiling
    pub proposed_tier: AmpTier,
    pub tier: AmpTier,
    pub evidence_score: f64,
    pub strongest_evidence: Option<EvidenceStrength>,
    pub evidence_count: usize,
    pub oncokb_level: Option<OncoKbLevel>,
    /// An unresolved conflict held this context at Tier III
    pub conflicted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpScoring {
    pub contexts: Vec<ContextTier>,
    pub primary_tier: AmpTier,
    pub primary_context: ActionabilityContext,
    pub conflicts: Vec<EvidenceConflict>,
}

impl AmpScoring {
    pub fn context(&self, context: ActionabilityContext) -> Option<&ContextTier> {
        self.contexts.iter().find(|c| c.context == context)
    }
}

/// Proposed and final primary tier when the DSC gate lowered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCap {
    pub proposed: AmpTier,
    #[serde(rename = "final")]
    pub final_tier: AmpTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierResult {
    pub variant_key: String,
    pub gene: String,
    pub hgvs_p: Option<String>,
    pub analysis_type: AnalysisType,
    pub cancer_type: Option<String>,
    pub amp_scoring: AmpScoring,
    pub vicc_scoring: ViccScoring,
    pub oncokb_scoring: OncoKbScoring,
    /// Present only for tumor-only analysis
    pub dsc_scoring: Option<DynamicSomaticConfidence>,
    pub evidence: Vec<Evidence>,
    pub confidence_score: f64,
    pub annotation_completeness: f64,
    pub tumor_only_disclaimers: Vec<String>,
    pub tier_capped: Option<TierCap>,
    pub threshold_version: String,
    pub kb_version: String,
}

impl TierResult {
    pub fn primary_tier(&self) -> AmpTier {
        self.amp_scoring.primary_tier
    }

    /// Recompute the primary tier from the embedded evidence and sub-scores.
    pub fn rederive_primary_tier(&self, thresholds: &ThresholdTable) -> AmpTier {
        let strategies = StrategyManager::new(&thresholds.tiers);
        compute_amp_scoring(
            &self.evidence,
            &self.vicc_scoring,
            &self.oncokb_scoring,
            self.dsc_scoring.as_ref(),
            thresholds,
            &strategies,
        )
        .primary_tier
    }
}

/// Highest tier a tumor-only result may reach at this DSC score.
pub fn dsc_ceiling(dsc_score: f64, gates: &DscThresholds) -> AmpTier {
    if dsc_score >= gates.tier1_min {
        AmpTier::TierIA
    } else if dsc_score >= gates.tier2_min {
        AmpTier::TierIIC
    } else {
        AmpTier::TierIII
    }
}

/// Highest population allele frequency seen in the evidence.
pub fn max_population_af(evidence: &[Evidence]) -> Option<f64> {
    evidence
        .iter()
        .filter_map(|e| match &e.payload {
            EvidencePayload::PopulationFrequency { allele_frequency, .. } => Some(*allele_frequency),
            _ => None,
        })
        .fold(None, |acc, af| Some(acc.map_or(af, |m: f64| m.max(af))))
}

fn is_high_strength(strength: Option<EvidenceStrength>) -> bool {
    matches!(strength, Some(EvidenceStrength::Regulatory | EvidenceStrength::Guideline))
}

/// Tier every context and pick the primary one.
pub fn compute_amp_scoring(
    evidence: &[Evidence],
    vicc: &ViccScoring,
    oncokb: &OncoKbScoring,
    dsc: Option<&DynamicSomaticConfidence>,
    thresholds: &ThresholdTable,
    strategies: &StrategyManager,
) -> AmpScoring {
    let t = &thresholds.tiers;
    let conflicts = detect_conflicts(evidence, vicc);
    let population_common = max_population_af(evidence).is_some_and(|af| af > t.population_common_af);
    let benign = vicc.classification.is_benign() || population_common;
    let oncogenic = vicc.classification.is_oncogenic() || oncokb.is_oncogenic();
    let ceiling = dsc.map(|d| dsc_ceiling(d.dsc_score, &thresholds.dsc));

    let contexts: Vec<ContextTier> = ActionabilityContext::ALL
        .into_iter()
        .map(|context| {
            let scored = strategies.context_score(evidence, context);
            let conflicted = is_context_uncertain(&conflicts, context);
            let proposed_tier = if evidence.is_empty() || benign {
                AmpTier::TierIV
            } else if scored.evidence_count == 0 || conflicted {
                AmpTier::TierIII
            } else if oncogenic
                && scored.score >= t.tier_ia_min
                && is_high_strength(scored.strongest_specific)
            {
                AmpTier::TierIA
            } else if oncogenic
                && scored.score >= t.tier_ib_min
                && scored.strongest_specific.is_some_and(|s| s <= EvidenceStrength::ClinicalStudy)
            {
                AmpTier::TierIB
            } else if scored.score >= t.tier_iic_min
                && scored.strongest.is_some_and(|s| s <= EvidenceStrength::ExpertConsensus)
            {
                AmpTier::TierIIC
            } else if scored.score >= t.tier_iid_min {
                AmpTier::TierIID
            } else {
                AmpTier::TierIII
            };
            let tier = ceiling.map_or(proposed_tier, |c| proposed_tier.capped_at(c));
            ContextTier {
                context,
                proposed_tier,
                tier,
                evidence_score: scored.score,
                strongest_evidence: scored.strongest,
                evidence_count: scored.evidence_count,
                oncokb_level: oncokb.level_for(context),
                conflicted,
            }
        })
        .collect();

    // ALL is ordered Therapeutic first, so strict comparison keeps it on ties
    let mut primary = &contexts[0];
    for ctx in &contexts[1..] {
        if ctx.tier.is_stronger_than(&primary.tier) {
            primary = ctx;
        }
    }
    let (primary_tier, primary_context) = (primary.tier, primary.context);

    AmpScoring { contexts, primary_tier, primary_context, conflicts }
}

/// Best proposed (pre-ceiling) tier across contexts.
pub fn proposed_primary_tier(amp: &AmpScoring) -> AmpTier {
    amp.contexts.iter().map(|c| c.proposed_tier).min().unwrap_or(AmpTier::TierIV)
}

pub fn tumor_only_disclaimers(
    dsc: &DynamicSomaticConfidence,
    capped: bool,
    gates: &DscThresholds,
) -> Vec<String> {
    let mut out = vec![DISCLAIMER_GERMLINE_UNCONFIRMED.to_string()];
    if capped {
        out.push(DISCLAIMER_TIER_CAPPED.to_string());
    }
    if dsc.dsc_confidence < LOW_DSC_CONFIDENCE {
        out.push(DISCLAIMER_LOW_DSC_CONFIDENCE.to_string());
    }
    if dsc.dsc_score < gates.tier2_min {
        out.push(DISCLAIMER_POSSIBLE_GERMLINE.to_string());
    }
    if dsc.inputs.purity_method.is_some_and(|m| m != PurityMethod::Metadata) {
        out.push(DISCLAIMER_PURITY_ESTIMATED.to_string());
    }
    out
}

/// Overall confidence in the assigned primary tier.
pub fn confidence_score(
    amp: &AmpScoring,
    has_evidence: bool,
    annotation_completeness: f64,
    cancer_type_known: bool,
    dsc: Option<&DynamicSomaticConfidence>,
    capped: bool,
) -> f64 {
    let base = match amp.primary_tier {
        AmpTier::TierIA => 0.95,
        AmpTier::TierIB => 0.9,
        AmpTier::TierIIC => 0.8,
        AmpTier::TierIID => 0.7,
        AmpTier::TierIII => 0.6,
        AmpTier::TierIV if has_evidence => 0.75,
        AmpTier::TierIV => 0.3,
    };
    let mut confidence = base;
    if amp.primary_tier.level() <= 2 {
        let score = amp.context(amp.primary_context).map_or(0.0, |c| c.evidence_score);
        confidence *= 0.5 + 0.5 * score;
    }
    confidence *= 0.7 + 0.3 * clamp_unit(annotation_completeness);
    if !cancer_type_known {
        confidence *= UNKNOWN_CANCER_PENALTY;
    }
    if let Some(dsc) = dsc {
        confidence *= 0.75 + 0.2 * dsc.dsc_score * dsc.dsc_confidence;
        if capped {
            confidence *= 0.9;
        }
    }
    clamp_unit(confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{
        BiomarkerEvidence, BiomarkerLevel, CancerMatch, GuidelineFamily, KnowledgeSource, MatchLevel,
        MatchProvenance, Response, ViccClassification,
    };

    use crate::dsc::{DscInputs, ModuleOutcome};

    fn fda_specific() -> Evidence {
        Evidence::new(
            "FDA_APPROVED",
            KnowledgeSource::Fda,
            GuidelineFamily::Amp2017,
            EvidencePayload::Biomarker(BiomarkerEvidence {
                context: ActionabilityContext::Therapeutic,
                level: BiomarkerLevel::A,
                therapies: vec!["Vemurafenib".into()],
                fda_approved: true,
                guideline: false,
                response: Response::Sensitivity,
            }),
            MatchProvenance { match_level: MatchLevel::Exact, cancer_match: CancerMatch::Specific },
        )
        .with_confidence(0.95)
    }

    fn vicc(classification: ViccClassification) -> ViccScoring {
        ViccScoring { criteria: Vec::new(), total_score: 0, classification, conflicting: false }
    }

    fn dsc(score: f64) -> DynamicSomaticConfidence {
        DynamicSomaticConfidence {
            dsc_score: score,
            dsc_confidence: 0.8,
            vaf_purity: ModuleOutcome::Available { score, confidence: 0.8 },
            prior_probability: ModuleOutcome::Available { score, confidence: 0.8 },
            inputs: DscInputs {
                tumor_purity: Some(0.7),
                purity_method: Some(PurityMethod::Metadata),
                variant_vaf: Some(0.35),
                depth: Some(200),
                hotspot_evidence: true,
                population_frequency: None,
                clinvar_germline: None,
            },
            modules_available: vec!["vaf_purity".into(), "prior_probability".into()],
        }
    }

    fn amp(evidence: &[Evidence], classification: ViccClassification, dsc: Option<&DynamicSomaticConfidence>) -> AmpScoring {
        let thresholds = ThresholdTable::default();
        let strategies = StrategyManager::new(&thresholds.tiers);
        compute_amp_scoring(evidence, &vicc(classification), &OncoKbScoring::default(), dsc, &thresholds, &strategies)
    }

    #[test]
    fn test_dsc_ceiling_bands() {
        let gates = DscThresholds::default();
        assert_eq!(dsc_ceiling(0.95, &gates), AmpTier::TierIA);
        assert_eq!(dsc_ceiling(0.9, &gates), AmpTier::TierIA);
        assert_eq!(dsc_ceiling(0.75, &gates), AmpTier::TierIIC);
        assert_eq!(dsc_ceiling(0.59, &gates), AmpTier::TierIII);
    }

    #[test]
    fn test_regulatory_specific_oncogenic_is_tier_ia() {
        let scoring = amp(&[fda_specific()], ViccClassification::Oncogenic, None);
        assert_eq!(scoring.primary_tier, AmpTier::TierIA);
        assert_eq!(scoring.primary_context, ActionabilityContext::Therapeutic);
        assert_eq!(scoring.context(ActionabilityContext::Prognostic).unwrap().tier, AmpTier::TierIII);
    }

    #[test]
    fn test_not_oncogenic_falls_to_tier_ii() {
        let scoring = amp(&[fda_specific()], ViccClassification::UncertainSignificance, None);
        assert_eq!(scoring.primary_tier, AmpTier::TierIIC);
    }

    #[test]
    fn test_benign_is_tier_iv() {
        let scoring = amp(&[fda_specific()], ViccClassification::Benign, None);
        assert_eq!(scoring.primary_tier, AmpTier::TierIV);
    }

    #[test]
    fn test_no_evidence_is_tier_iv_with_low_confidence() {
        let scoring = amp(&[], ViccClassification::UncertainSignificance, None);
        assert_eq!(scoring.primary_tier, AmpTier::TierIV);
        let confidence = confidence_score(&scoring, false, 0.3, true, None, false);
        assert!(confidence < 0.5);
    }

    #[test]
    fn test_dsc_gate_caps_every_context() {
        let low = dsc(0.4);
        let scoring = amp(&[fda_specific()], ViccClassification::Oncogenic, Some(&low));
        assert_eq!(scoring.primary_tier, AmpTier::TierIII);
        assert_eq!(proposed_primary_tier(&scoring), AmpTier::TierIA);

        let mid = dsc(0.7);
        let scoring = amp(&[fda_specific()], ViccClassification::Oncogenic, Some(&mid));
        assert_eq!(scoring.primary_tier, AmpTier::TierIIC);
    }

    #[test]
    fn test_disclaimers() {
        let d = dsc(0.4);
        let codes = tumor_only_disclaimers(&d, true, &DscThresholds::default());
        assert_eq!(
            codes,
            vec![DISCLAIMER_GERMLINE_UNCONFIRMED, DISCLAIMER_TIER_CAPPED, DISCLAIMER_POSSIBLE_GERMLINE]
        );
    }

    #[test]
    fn test_unknown_cancer_type_lowers_confidence() {
        let scoring = amp(&[fda_specific()], ViccClassification::Oncogenic, None);
        let known = confidence_score(&scoring, true, 1.0, true, None, false);
        let unknown = confidence_score(&scoring, true, 1.0, false, None, false);
        assert!(unknown < known);
    }
}
