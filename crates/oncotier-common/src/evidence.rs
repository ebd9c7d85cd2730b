//! Normalised evidence records.
//!
//! Every knowledge-base hit is converted into an [`Evidence`] whose payload is
//! a tagged variant per kind of fact, so downstream classifiers match on the
//! payload instead of probing open-ended metadata maps.

use serde::{Deserialize, Serialize};

use crate::sources::KnowledgeSource;
use crate::tiers::{
    ActionabilityContext, BiomarkerLevel, OncoKbLevel, OncoKbOncogenicity, ViccCriterion,
};
use crate::variant::ClinVarSignificance;

/// Guideline family an evidence record is interpreted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidelineFamily {
    /// AMP/ASCO/CAP 2017 actionability
    Amp2017,
    /// VICC/CGC 2022 oncogenicity
    Vicc2022,
    OncoKb,
    /// Informational input to somatic-origin scoring
    SomaticOrigin,
}

/// Which rung of the match cascade produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    /// Full HGVS protein change, e.g. p.Val600Glu
    Exact,
    /// One-letter short form, e.g. V600E
    ShortForm,
    /// Any curated alteration in the gene
    GeneLevel,
    /// Derived from annotations carried on the variant itself
    VariantRecord,
}

/// Whether a hit was matched on the query cancer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancerMatch {
    Specific,
    /// Pan-cancer record or off-label fallback
    PanCancer,
    /// Cancer type is irrelevant for this kind of fact
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchProvenance {
    pub match_level: MatchLevel,
    pub cancer_match: CancerMatch,
}

impl MatchProvenance {
    pub fn from_variant() -> Self {
        Self { match_level: MatchLevel::VariantRecord, cancer_match: CancerMatch::NotApplicable }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Sensitivity,
    Resistance,
    /// Diagnostic or prognostic association without drug response
    Association,
}

/// A curated variant-drug-cancer (or diagnostic/prognostic) association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerEvidence {
    pub context: ActionabilityContext,
    pub level: BiomarkerLevel,
    #[serde(default)]
    pub therapies: Vec<String>,
    #[serde(default)]
    pub fda_approved: bool,
    /// Included in a professional guideline (NCCN, ESMO, ...)
    #[serde(default)]
    pub guideline: bool,
    pub response: Response,
}

/// A resolved OncoKB level for one actionability context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OncoKbImplication {
    pub context: ActionabilityContext,
    pub level: OncoKbLevel,
    #[serde(default)]
    pub therapies: Vec<String>,
    #[serde(default)]
    pub fda_approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidencePayload {
    Biomarker(BiomarkerEvidence),
    OncoKbImplication(OncoKbImplication),
    OncoKbOncogenicity { oncogenicity: OncoKbOncogenicity },
    /// A VICC/CGC oncogenicity criterion that fired
    Criterion { criterion: ViccCriterion },
    Hotspot { position_samples: u32, alt_samples: u32 },
    PopulationFrequency { database: String, allele_frequency: f64 },
    Germline { significance: ClinVarSignificance },
}

/// A single fact supporting or opposing actionability or oncogenicity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Criterion identifier, e.g. "OS3", "ONCOKB_TX_LEVEL_1", "FDA_APPROVED"
    pub code: String,
    pub score: f64,
    pub guideline: GuidelineFamily,
    pub source: KnowledgeSource,
    pub description: String,
    /// 0.0–1.0
    pub confidence: f64,
    pub payload: EvidencePayload,
    pub provenance: MatchProvenance,
    /// Pathway weight applied by the aggregator; `None` before weighting.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Evidence {
    pub fn new(
        code: impl Into<String>,
        source: KnowledgeSource,
        guideline: GuidelineFamily,
        payload: EvidencePayload,
        provenance: MatchProvenance,
    ) -> Self {
        Self {
            code: code.into(),
            score: 1.0,
            guideline,
            source,
            description: String::new(),
            confidence: 1.0,
            payload,
            provenance,
            weight: None,
        }
    }

    /// Evidence for a fired VICC criterion.
    pub fn criterion(
        criterion: ViccCriterion,
        source: KnowledgeSource,
        provenance: MatchProvenance,
    ) -> Self {
        let mut ev = Self::new(
            criterion.code(),
            source,
            GuidelineFamily::Vicc2022,
            EvidencePayload::Criterion { criterion },
            provenance,
        );
        ev.score = criterion.points() as f64;
        ev
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn vicc_criterion(&self) -> Option<ViccCriterion> {
        match &self.payload {
            EvidencePayload::Criterion { criterion } => Some(*criterion),
            _ => None,
        }
    }

    /// Actionability context this evidence speaks to, if any.
    pub fn context(&self) -> Option<ActionabilityContext> {
        match &self.payload {
            EvidencePayload::Biomarker(b) => Some(b.context),
            EvidencePayload::OncoKbImplication(o) => Some(o.context),
            _ => None,
        }
    }

    /// True when the hit used the pan-cancer fallback.
    pub fn is_off_label(&self) -> bool {
        self.provenance.cancer_match == CancerMatch::PanCancer
    }

    /// Deduplication key: (source, code).
    pub fn dedup_key(&self) -> (KnowledgeSource, String) {
        (self.source, self.code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_evidence_scores_points() {
        let ev = Evidence::criterion(
            ViccCriterion::Os3,
            KnowledgeSource::CancerHotspots,
            MatchProvenance { match_level: MatchLevel::Exact, cancer_match: CancerMatch::Specific },
        );
        assert_eq!(ev.code, "OS3");
        assert_eq!(ev.score, 4.0);
        assert_eq!(ev.vicc_criterion(), Some(ViccCriterion::Os3));
        assert_eq!(ev.context(), None);
    }

    #[test]
    fn test_payload_serialises_with_kind_tag() {
        let ev = Evidence::new(
            "ONCOKB_TX_LEVEL_1",
            KnowledgeSource::OncoKb,
            GuidelineFamily::OncoKb,
            EvidencePayload::OncoKbImplication(OncoKbImplication {
                context: ActionabilityContext::Therapeutic,
                level: OncoKbLevel::Level1,
                therapies: vec!["Dabrafenib".into()],
                fda_approved: true,
            }),
            MatchProvenance { match_level: MatchLevel::Exact, cancer_match: CancerMatch::Specific },
        );
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["payload"]["kind"], "onco_kb_implication");
        assert_eq!(json["payload"]["level"], "LEVEL_1");
        let back: Evidence = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }
}
