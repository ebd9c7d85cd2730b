//! Evidence-strength scoring strategies.
//!
//! One scorer per strength category. [`StrategyManager`] hands each
//! actionability record to the first scorer (in priority order) that can
//! score it and folds the per-record scores into a context score where the
//! strongest record counts fully and weaker ones add diminishing increments.

use serde::{Deserialize, Serialize};

use oncotier_common::confidence::{clamp_unit, diminishing_confidence};
use oncotier_common::{
    ActionabilityContext, BiomarkerLevel, CancerMatch, Evidence, EvidencePayload, EvidenceStrength,
    OncoKbLevel,
};
use oncotier_config::TierThresholds;

pub trait EvidenceScorer: Send + Sync {
    fn strength(&self) -> EvidenceStrength;

    fn can_score(&self, evidence: &Evidence) -> bool;

    /// Score in [0, 1]; zero when the evidence speaks to another context.
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64;
}

/// Strength category of an actionability record, if it is one.
pub fn strength_of(evidence: &Evidence) -> Option<EvidenceStrength> {
    match &evidence.payload {
        EvidencePayload::Biomarker(b) => Some(if b.fda_approved {
            EvidenceStrength::Regulatory
        } else if b.guideline {
            EvidenceStrength::Guideline
        } else {
            match b.level {
                BiomarkerLevel::A => EvidenceStrength::ClinicalStudy,
                BiomarkerLevel::B => EvidenceStrength::ExpertConsensus,
                BiomarkerLevel::C => EvidenceStrength::CaseReport,
                BiomarkerLevel::D | BiomarkerLevel::E => EvidenceStrength::Preclinical,
            }
        }),
        EvidencePayload::OncoKbImplication(o) => Some(match o.level {
            OncoKbLevel::Level1 => EvidenceStrength::Regulatory,
            OncoKbLevel::Level2 => EvidenceStrength::Guideline,
            OncoKbLevel::Level3A => EvidenceStrength::ClinicalStudy,
            OncoKbLevel::Level3B => EvidenceStrength::ExpertConsensus,
            OncoKbLevel::Level4 => EvidenceStrength::Preclinical,
        }),
        _ => None,
    }
}

fn discounted(base: f64, evidence: &Evidence, context: ActionabilityContext, off_label_discount: f64) -> f64 {
    if evidence.context() != Some(context) {
        return 0.0;
    }
    let mut score = base * evidence.confidence;
    if evidence.is_off_label() {
        score *= off_label_discount;
    }
    clamp_unit(score)
}

// ── Scorers ──────────────────────────────────────────────────────────────────

/// FDA approval or OncoKB Level 1.
pub struct RegulatoryScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for RegulatoryScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::Regulatory
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::Regulatory)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(1.0, evidence, context, self.off_label_discount)
    }
}

/// Professional guideline (NCCN and similar) or OncoKB Level 2.
pub struct GuidelineScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for GuidelineScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::Guideline
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::Guideline)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(0.9, evidence, context, self.off_label_discount)
    }
}

/// Well-powered clinical studies: level A or OncoKB 3A.
pub struct ClinicalStudyScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for ClinicalStudyScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::ClinicalStudy
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::ClinicalStudy)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(0.7, evidence, context, self.off_label_discount)
    }
}

pub struct ExpertConsensusScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for ExpertConsensusScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::ExpertConsensus
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::ExpertConsensus)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(0.55, evidence, context, self.off_label_discount)
    }
}

pub struct CaseReportScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for CaseReportScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::CaseReport
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::CaseReport)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(0.35, evidence, context, self.off_label_discount)
    }
}

pub struct PreclinicalScorer {
    pub off_label_discount: f64,
}

impl EvidenceScorer for PreclinicalScorer {
    fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::Preclinical
    }
    fn can_score(&self, evidence: &Evidence) -> bool {
        strength_of(evidence) == Some(EvidenceStrength::Preclinical)
    }
    fn score(&self, evidence: &Evidence, context: ActionabilityContext) -> f64 {
        discounted(0.2, evidence, context, self.off_label_discount)
    }
}

// ── Manager ──────────────────────────────────────────────────────────────────

/// Outcome of scoring one actionability context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextScore {
    pub score: f64,
    pub strongest: Option<EvidenceStrength>,
    /// Strongest evidence curated for the query cancer type
    pub strongest_specific: Option<EvidenceStrength>,
    pub evidence_count: usize,
}

pub struct StrategyManager {
    scorers: Vec<Box<dyn EvidenceScorer>>,
    decay: f64,
}

impl StrategyManager {
    pub fn new(thresholds: &TierThresholds) -> Self {
        let d = thresholds.off_label_discount;
        Self {
            scorers: vec![
                Box::new(RegulatoryScorer { off_label_discount: d }),
                Box::new(GuidelineScorer { off_label_discount: d }),
                Box::new(ClinicalStudyScorer { off_label_discount: d }),
                Box::new(ExpertConsensusScorer { off_label_discount: d }),
                Box::new(CaseReportScorer { off_label_discount: d }),
                Box::new(PreclinicalScorer { off_label_discount: d }),
            ],
            decay: thresholds.evidence_decay,
        }
    }

    /// First scorer, in priority order, that accepts the evidence.
    pub fn select(&self, evidence: &Evidence) -> Option<&dyn EvidenceScorer> {
        self.scorers.iter().find(|s| s.can_score(evidence)).map(|s| s.as_ref())
    }

    pub fn context_score(&self, evidence: &[Evidence], context: ActionabilityContext) -> ContextScore {
        let mut scores = Vec::new();
        let mut strongest: Option<EvidenceStrength> = None;
        let mut strongest_specific: Option<EvidenceStrength> = None;

        for ev in evidence.iter().filter(|e| e.context() == Some(context)) {
            let Some(scorer) = self.select(ev) else { continue };
            let score = scorer.score(ev, context);
            if score <= 0.0 {
                continue;
            }
            scores.push(score);
            let strength = scorer.strength();
            strongest = Some(strongest.map_or(strength, |s| s.min(strength)));
            if ev.provenance.cancer_match == CancerMatch::Specific {
                strongest_specific = Some(strongest_specific.map_or(strength, |s| s.min(strength)));
            }
        }

        ContextScore {
            score: diminishing_confidence(&scores, self.decay),
            strongest,
            strongest_specific,
            evidence_count: scores.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{
        BiomarkerEvidence, GuidelineFamily, KnowledgeSource, MatchLevel, MatchProvenance, Response,
    };

    fn biomarker(level: BiomarkerLevel, fda: bool, cancer_match: CancerMatch) -> Evidence {
        Evidence::new(
            "TX",
            KnowledgeSource::Civic,
            GuidelineFamily::Amp2017,
            EvidencePayload::Biomarker(BiomarkerEvidence {
                context: ActionabilityContext::Therapeutic,
                level,
                therapies: vec!["Drug".into()],
                fda_approved: fda,
                guideline: false,
                response: Response::Sensitivity,
            }),
            MatchProvenance { match_level: MatchLevel::Exact, cancer_match },
        )
    }

    #[test]
    fn test_manager_picks_scorer_by_priority() {
        let manager = StrategyManager::new(&TierThresholds::default());
        let fda = biomarker(BiomarkerLevel::A, true, CancerMatch::Specific);
        assert_eq!(manager.select(&fda).map(|s| s.strength()), Some(EvidenceStrength::Regulatory));
        let case = biomarker(BiomarkerLevel::C, false, CancerMatch::Specific);
        assert_eq!(manager.select(&case).map(|s| s.strength()), Some(EvidenceStrength::CaseReport));
    }

    #[test]
    fn test_off_label_is_discounted() {
        let scorer = RegulatoryScorer { off_label_discount: 0.8 };
        let on = scorer.score(&biomarker(BiomarkerLevel::A, true, CancerMatch::Specific), ActionabilityContext::Therapeutic);
        let off = scorer.score(&biomarker(BiomarkerLevel::A, true, CancerMatch::PanCancer), ActionabilityContext::Therapeutic);
        assert!((on - 1.0).abs() < 1e-9);
        assert!((off - 0.8).abs() < 1e-9);
        assert_eq!(scorer.score(&biomarker(BiomarkerLevel::A, true, CancerMatch::Specific), ActionabilityContext::Prognostic), 0.0);
    }

    #[test]
    fn test_context_score_diminishing_increments() {
        let manager = StrategyManager::new(&TierThresholds::default());
        let evidence = vec![
            biomarker(BiomarkerLevel::A, false, CancerMatch::Specific),
            biomarker(BiomarkerLevel::C, false, CancerMatch::PanCancer),
        ];
        let ctx = manager.context_score(&evidence, ActionabilityContext::Therapeutic);
        assert_eq!(ctx.evidence_count, 2);
        assert_eq!(ctx.strongest, Some(EvidenceStrength::ClinicalStudy));
        assert_eq!(ctx.strongest_specific, Some(EvidenceStrength::ClinicalStudy));
        // Second item adds less than it would on its own
        let alone = 0.7;
        assert!(ctx.score > alone && ctx.score < alone + 0.35 * 0.8);
        let empty = manager.context_score(&evidence, ActionabilityContext::Diagnostic);
        assert_eq!(empty.score, 0.0);
        assert_eq!(empty.strongest, None);
    }
}
