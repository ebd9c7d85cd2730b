//! Guideline vocabularies: AMP/ASCO/CAP tiers, VICC/CGC oncogenicity criteria,
//! OncoKB levels and evidence-strength categories.

use serde::{Deserialize, Serialize};

// ── Analysis type ────────────────────────────────────────────────────────────

/// Whether a matched normal sample was sequenced alongside the tumor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    TumorOnly,
    TumorNormal,
}

impl AnalysisType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "tumor_only" | "tumour_only" | "to" => Some(AnalysisType::TumorOnly),
            "tumor_normal" | "tumour_normal" | "tn" | "matched_normal" => {
                Some(AnalysisType::TumorNormal)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::TumorOnly => "TUMOR_ONLY",
            AnalysisType::TumorNormal => "TUMOR_NORMAL",
        }
    }
}

// ── AMP/ASCO/CAP 2017 ────────────────────────────────────────────────────────

/// AMP/ASCO/CAP 2017 tier. Ordered strongest first, so `min` picks the
/// strongest tier and `max` the weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmpTier {
    #[serde(rename = "Tier IA")]
    TierIA,
    #[serde(rename = "Tier IB")]
    TierIB,
    #[serde(rename = "Tier IIC")]
    TierIIC,
    #[serde(rename = "Tier IID")]
    TierIID,
    #[serde(rename = "Tier III")]
    TierIII,
    #[serde(rename = "Tier IV")]
    TierIV,
}

impl AmpTier {
    pub fn label(&self) -> &'static str {
        match self {
            AmpTier::TierIA => "Tier IA",
            AmpTier::TierIB => "Tier IB",
            AmpTier::TierIIC => "Tier IIC",
            AmpTier::TierIID => "Tier IID",
            AmpTier::TierIII => "Tier III",
            AmpTier::TierIV => "Tier IV",
        }
    }

    /// Roman-numeral tier without the evidence-level letter (1..=4).
    pub fn level(&self) -> u8 {
        match self {
            AmpTier::TierIA | AmpTier::TierIB => 1,
            AmpTier::TierIIC | AmpTier::TierIID => 2,
            AmpTier::TierIII => 3,
            AmpTier::TierIV => 4,
        }
    }

    pub fn is_stronger_than(&self, other: &AmpTier) -> bool {
        self < other
    }

    /// Apply a ceiling: returns `self` unless the ceiling is weaker.
    pub fn capped_at(self, ceiling: AmpTier) -> AmpTier {
        self.max(ceiling)
    }
}

impl std::fmt::Display for AmpTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Clinical context a piece of actionability evidence speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionabilityContext {
    Therapeutic,
    Diagnostic,
    Prognostic,
}

impl ActionabilityContext {
    /// Evaluation order; Therapeutic first so it wins ties.
    pub const ALL: [ActionabilityContext; 3] = [
        ActionabilityContext::Therapeutic,
        ActionabilityContext::Diagnostic,
        ActionabilityContext::Prognostic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionabilityContext::Therapeutic => "therapeutic",
            ActionabilityContext::Diagnostic => "diagnostic",
            ActionabilityContext::Prognostic => "prognostic",
        }
    }
}

/// Strength of the study or approval behind an actionability claim.
/// Ordered strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    Regulatory,
    Guideline,
    ClinicalStudy,
    ExpertConsensus,
    CaseReport,
    Preclinical,
}

/// CIViC-style evidence level carried by curated biomarker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BiomarkerLevel {
    /// Validated association
    A,
    /// Clinical evidence
    B,
    /// Case study
    C,
    /// Preclinical
    D,
    /// Inferential
    E,
}

// ── VICC/CGC 2022 ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViccClassification {
    Oncogenic,
    #[serde(rename = "Likely Oncogenic")]
    LikelyOncogenic,
    #[serde(rename = "Uncertain Significance")]
    UncertainSignificance,
    #[serde(rename = "Likely Benign")]
    LikelyBenign,
    Benign,
}

impl ViccClassification {
    pub fn is_oncogenic(&self) -> bool {
        matches!(self, ViccClassification::Oncogenic | ViccClassification::LikelyOncogenic)
    }

    pub fn is_benign(&self) -> bool {
        matches!(self, ViccClassification::Benign | ViccClassification::LikelyBenign)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViccClassification::Oncogenic => "Oncogenic",
            ViccClassification::LikelyOncogenic => "Likely Oncogenic",
            ViccClassification::UncertainSignificance => "Uncertain Significance",
            ViccClassification::LikelyBenign => "Likely Benign",
            ViccClassification::Benign => "Benign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStrength {
    VeryStrong,
    Strong,
    Moderate,
    Supporting,
}

/// VICC/CGC 2022 oncogenicity criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViccCriterion {
    Ovs1,
    Os1,
    Os2,
    Os3,
    Om1,
    Om2,
    Om3,
    Om4,
    Op1,
    Op2,
    Op3,
    Op4,
    Sbvs1,
    Sbs1,
    Sbs2,
    Sbp1,
    Sbp2,
}

impl ViccCriterion {
    pub const ALL: [ViccCriterion; 17] = [
        ViccCriterion::Ovs1,
        ViccCriterion::Os1,
        ViccCriterion::Os2,
        ViccCriterion::Os3,
        ViccCriterion::Om1,
        ViccCriterion::Om2,
        ViccCriterion::Om3,
        ViccCriterion::Om4,
        ViccCriterion::Op1,
        ViccCriterion::Op2,
        ViccCriterion::Op3,
        ViccCriterion::Op4,
        ViccCriterion::Sbvs1,
        ViccCriterion::Sbs1,
        ViccCriterion::Sbs2,
        ViccCriterion::Sbp1,
        ViccCriterion::Sbp2,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ViccCriterion::Ovs1 => "OVS1",
            ViccCriterion::Os1 => "OS1",
            ViccCriterion::Os2 => "OS2",
            ViccCriterion::Os3 => "OS3",
            ViccCriterion::Om1 => "OM1",
            ViccCriterion::Om2 => "OM2",
            ViccCriterion::Om3 => "OM3",
            ViccCriterion::Om4 => "OM4",
            ViccCriterion::Op1 => "OP1",
            ViccCriterion::Op2 => "OP2",
            ViccCriterion::Op3 => "OP3",
            ViccCriterion::Op4 => "OP4",
            ViccCriterion::Sbvs1 => "SBVS1",
            ViccCriterion::Sbs1 => "SBS1",
            ViccCriterion::Sbs2 => "SBS2",
            ViccCriterion::Sbp1 => "SBP1",
            ViccCriterion::Sbp2 => "SBP2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_uppercase();
        ViccCriterion::ALL.into_iter().find(|c| c.code() == upper)
    }

    pub fn is_oncogenic(&self) -> bool {
        !self.is_benign()
    }

    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ViccCriterion::Sbvs1
                | ViccCriterion::Sbs1
                | ViccCriterion::Sbs2
                | ViccCriterion::Sbp1
                | ViccCriterion::Sbp2
        )
    }

    pub fn strength(&self) -> CriterionStrength {
        match self {
            ViccCriterion::Ovs1 | ViccCriterion::Sbvs1 => CriterionStrength::VeryStrong,
            ViccCriterion::Os1
            | ViccCriterion::Os2
            | ViccCriterion::Os3
            | ViccCriterion::Sbs1
            | ViccCriterion::Sbs2 => CriterionStrength::Strong,
            ViccCriterion::Om1 | ViccCriterion::Om2 | ViccCriterion::Om3 | ViccCriterion::Om4 => {
                CriterionStrength::Moderate
            }
            ViccCriterion::Op1
            | ViccCriterion::Op2
            | ViccCriterion::Op3
            | ViccCriterion::Op4
            | ViccCriterion::Sbp1
            | ViccCriterion::Sbp2 => CriterionStrength::Supporting,
        }
    }

    /// Signed point value (Horak et al. 2022, Table 2).
    pub fn points(&self) -> i32 {
        let magnitude = match self.strength() {
            CriterionStrength::VeryStrong => 8,
            CriterionStrength::Strong => 4,
            CriterionStrength::Moderate => 2,
            CriterionStrength::Supporting => 1,
        };
        if self.is_benign() { -magnitude } else { magnitude }
    }
}

// ── OncoKB ───────────────────────────────────────────────────────────────────

/// OncoKB level of evidence. Ordered strongest first. Diagnostic (Dx) and
/// prognostic (Px) levels are folded onto the same scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OncoKbLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3A")]
    Level3A,
    #[serde(rename = "LEVEL_3B")]
    Level3B,
    #[serde(rename = "LEVEL_4")]
    Level4,
}

impl OncoKbLevel {
    /// Parse "LEVEL_1", "1", "3A", "LEVEL_Dx1", "Px2", ...
    /// Resistance levels (R1/R2) are not mapped here.
    pub fn from_str(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        let stripped = upper.strip_prefix("LEVEL_").unwrap_or(&upper);
        let stripped = stripped
            .strip_prefix("DX")
            .or_else(|| stripped.strip_prefix("PX"))
            .unwrap_or(stripped);
        match stripped {
            "1" => Some(OncoKbLevel::Level1),
            "2" => Some(OncoKbLevel::Level2),
            "3" | "3A" => Some(OncoKbLevel::Level3A),
            "3B" => Some(OncoKbLevel::Level3B),
            "4" => Some(OncoKbLevel::Level4),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OncoKbLevel::Level1 => "Level 1",
            OncoKbLevel::Level2 => "Level 2",
            OncoKbLevel::Level3A => "Level 3A",
            OncoKbLevel::Level3B => "Level 3B",
            OncoKbLevel::Level4 => "Level 4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OncoKbOncogenicity {
    Oncogenic,
    #[serde(rename = "Likely Oncogenic")]
    LikelyOncogenic,
    Resistance,
    Inconclusive,
    #[serde(rename = "Likely Neutral")]
    LikelyNeutral,
    Unknown,
}

impl OncoKbOncogenicity {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "oncogenic" => OncoKbOncogenicity::Oncogenic,
            "likely oncogenic" | "likely_oncogenic" => OncoKbOncogenicity::LikelyOncogenic,
            "resistance" => OncoKbOncogenicity::Resistance,
            "inconclusive" => OncoKbOncogenicity::Inconclusive,
            "likely neutral" | "likely_neutral" => OncoKbOncogenicity::LikelyNeutral,
            _ => OncoKbOncogenicity::Unknown,
        }
    }

    pub fn is_oncogenic(&self) -> bool {
        matches!(self, OncoKbOncogenicity::Oncogenic | OncoKbOncogenicity::LikelyOncogenic)
    }

    /// False for the labels OncoKB returns when a variant has not been curated.
    pub fn is_curated(&self) -> bool {
        !matches!(self, OncoKbOncogenicity::Unknown | OncoKbOncogenicity::Inconclusive)
    }
}
