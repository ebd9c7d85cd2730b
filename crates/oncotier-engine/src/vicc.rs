//! VICC/CGC 2022 oncogenicity classification (Horak et al. 2022).
//!
//! Each criterion counts once no matter how many sources support it. The
//! total is mapped onto the five classes with the bands from the threshold
//! table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use oncotier_common::{CriterionStrength, Evidence, KnowledgeSource, ViccClassification, ViccCriterion};
use oncotier_config::{ThresholdTable, ViccBands};

/// One criterion that contributed to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionContribution {
    pub criterion: ViccCriterion,
    pub points: i32,
    /// Best-supported source for the criterion
    pub source: KnowledgeSource,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViccScoring {
    pub criteria: Vec<CriterionContribution>,
    pub total_score: i32,
    pub classification: ViccClassification,
    /// Strong oncogenic and strong benign criteria both fired
    pub conflicting: bool,
}

impl ViccScoring {
    pub fn has(&self, criterion: ViccCriterion) -> bool {
        self.criteria.iter().any(|c| c.criterion == criterion)
    }
}

fn is_strong(strength: CriterionStrength) -> bool {
    matches!(strength, CriterionStrength::VeryStrong | CriterionStrength::Strong)
}

pub fn classify(total: i32, bands: &ViccBands) -> ViccClassification {
    if total >= bands.oncogenic_min {
        ViccClassification::Oncogenic
    } else if total >= bands.likely_oncogenic_min {
        ViccClassification::LikelyOncogenic
    } else if total <= bands.benign_max {
        ViccClassification::Benign
    } else if total <= bands.likely_benign_max {
        ViccClassification::LikelyBenign
    } else {
        ViccClassification::UncertainSignificance
    }
}

/// Score the criteria present in `evidence`.
pub fn calculate_vicc_score(evidence: &[Evidence], thresholds: &ThresholdTable) -> ViccScoring {
    let mut best: BTreeMap<ViccCriterion, CriterionContribution> = BTreeMap::new();
    for ev in evidence {
        let Some(criterion) = ev.vicc_criterion() else { continue };
        if ev.confidence < thresholds.min_evidence_confidence {
            continue;
        }
        let candidate = CriterionContribution {
            criterion,
            points: criterion.points(),
            source: ev.source,
            confidence: ev.confidence,
        };
        match best.get(&criterion) {
            Some(existing) if existing.confidence >= candidate.confidence => {}
            _ => {
                best.insert(criterion, candidate);
            }
        }
    }

    let criteria: Vec<CriterionContribution> = best.into_values().collect();
    let total_score: i32 = criteria.iter().map(|c| c.points).sum();
    let strong_oncogenic = criteria
        .iter()
        .any(|c| c.criterion.is_oncogenic() && is_strong(c.criterion.strength()));
    let strong_benign = criteria
        .iter()
        .any(|c| c.criterion.is_benign() && is_strong(c.criterion.strength()));
    let conflicting = strong_oncogenic && strong_benign;

    let classification = if conflicting {
        ViccClassification::UncertainSignificance
    } else {
        classify(total_score, &thresholds.vicc)
    };

    ViccScoring { criteria, total_score, classification, conflicting }
}
