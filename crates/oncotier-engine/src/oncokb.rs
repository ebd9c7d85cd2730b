//! OncoKB level matching.
//!
//! Picks the best (lowest-numbered) OncoKB level per actionability context
//! and the reported oncogenicity from OncoKB-sourced evidence.

use serde::{Deserialize, Serialize};

use oncotier_common::{
    ActionabilityContext, CancerMatch, Evidence, EvidencePayload, KnowledgeSource, OncoKbLevel,
    OncoKbOncogenicity,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OncoKbScoring {
    pub oncogenicity: Option<OncoKbOncogenicity>,
    pub therapeutic_level: Option<OncoKbLevel>,
    pub diagnostic_level: Option<OncoKbLevel>,
    pub prognostic_level: Option<OncoKbLevel>,
    /// Sorted, deduplicated
    pub fda_approved_therapies: Vec<String>,
    /// A winning level or the oncogenicity call was curated for the query tumor
    pub cancer_type_specific: bool,
}

impl OncoKbScoring {
    pub fn level_for(&self, context: ActionabilityContext) -> Option<OncoKbLevel> {
        match context {
            ActionabilityContext::Therapeutic => self.therapeutic_level,
            ActionabilityContext::Diagnostic => self.diagnostic_level,
            ActionabilityContext::Prognostic => self.prognostic_level,
        }
    }

    pub fn is_oncogenic(&self) -> bool {
        self.oncogenicity.is_some_and(|o| o.is_oncogenic())
    }
}

pub fn calculate_oncokb_score(evidence: &[Evidence]) -> OncoKbScoring {
    let mut scoring = OncoKbScoring::default();
    let mut winners: [Option<(OncoKbLevel, bool)>; 3] = [None; 3];

    for ev in evidence.iter().filter(|e| e.source == KnowledgeSource::OncoKb) {
        let specific = ev.provenance.cancer_match == CancerMatch::Specific;
        match &ev.payload {
            EvidencePayload::OncoKbImplication(imp) => {
                let slot = &mut winners[context_index(imp.context)];
                *slot = match *slot {
                    Some((best, s)) if best < imp.level => Some((best, s)),
                    Some((best, s)) if best == imp.level => Some((best, s || specific)),
                    _ => Some((imp.level, specific)),
                };
                if imp.fda_approved {
                    for therapy in &imp.therapies {
                        if !scoring.fda_approved_therapies.contains(therapy) {
                            scoring.fda_approved_therapies.push(therapy.clone());
                        }
                    }
                }
            }
            EvidencePayload::OncoKbOncogenicity { oncogenicity } => {
                // Ord on oncogenicity puts the most oncogenic call first
                if scoring.oncogenicity.map_or(true, |o| *oncogenicity < o) {
                    scoring.oncogenicity = Some(*oncogenicity);
                }
                scoring.cancer_type_specific |= specific;
            }
            _ => {}
        }
    }

    scoring.therapeutic_level = winners[0].map(|(l, _)| l);
    scoring.diagnostic_level = winners[1].map(|(l, _)| l);
    scoring.prognostic_level = winners[2].map(|(l, _)| l);
    scoring.cancer_type_specific |= winners.iter().flatten().any(|(_, s)| *s);
    scoring.fda_approved_therapies.sort();
    scoring
}

fn context_index(context: ActionabilityContext) -> usize {
    match context {
        ActionabilityContext::Therapeutic => 0,
        ActionabilityContext::Diagnostic => 1,
        ActionabilityContext::Prognostic => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{GuidelineFamily, MatchLevel, MatchProvenance, OncoKbImplication};

    fn level(context: ActionabilityContext, level: OncoKbLevel, therapies: &[&str], cancer: CancerMatch) -> Evidence {
        Evidence::new(
            "ONCOKB",
            KnowledgeSource::OncoKb,
            GuidelineFamily::OncoKb,
            EvidencePayload::OncoKbImplication(OncoKbImplication {
                context,
                level,
                therapies: therapies.iter().map(|t| t.to_string()).collect(),
                fda_approved: level == OncoKbLevel::Level1,
            }),
            MatchProvenance { match_level: MatchLevel::ShortForm, cancer_match: cancer },
        )
    }

    #[test]
    fn test_best_level_per_context() {
        let evidence = vec![
            level(ActionabilityContext::Therapeutic, OncoKbLevel::Level3A, &["Cobimetinib"], CancerMatch::PanCancer),
            level(ActionabilityContext::Therapeutic, OncoKbLevel::Level1, &["Vemurafenib", "Dabrafenib"], CancerMatch::Specific),
            level(ActionabilityContext::Prognostic, OncoKbLevel::Level2, &[], CancerMatch::PanCancer),
        ];
        let scoring = calculate_oncokb_score(&evidence);
        assert_eq!(scoring.therapeutic_level, Some(OncoKbLevel::Level1));
        assert_eq!(scoring.diagnostic_level, None);
        assert_eq!(scoring.prognostic_level, Some(OncoKbLevel::Level2));
        assert_eq!(scoring.fda_approved_therapies, vec!["Dabrafenib", "Vemurafenib"]);
        assert!(scoring.cancer_type_specific);
    }

    #[test]
    fn test_ignores_other_sources_and_reports_oncogenicity() {
        let mut civic = level(ActionabilityContext::Therapeutic, OncoKbLevel::Level1, &["X"], CancerMatch::Specific);
        civic.source = KnowledgeSource::Civic;
        let onc = Evidence::new(
            "ONCOKB_ONCOGENICITY",
            KnowledgeSource::OncoKb,
            GuidelineFamily::OncoKb,
            EvidencePayload::OncoKbOncogenicity { oncogenicity: OncoKbOncogenicity::LikelyOncogenic },
            MatchProvenance { match_level: MatchLevel::Exact, cancer_match: CancerMatch::NotApplicable },
        );
        let scoring = calculate_oncokb_score(&[civic, onc]);
        assert_eq!(scoring.therapeutic_level, None);
        assert!(scoring.is_oncogenic());
        assert!(!scoring.cancer_type_specific);
    }
}
