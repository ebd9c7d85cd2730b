//! Dynamic Somatic Confidence: how likely a tumor-only call is somatic.
//!
//! Two modules contribute when their inputs exist:
//! - VAF/purity consistency against the heterozygous somatic expectation
//!   (purity / 2), tolerating LOH and subclonal patterns
//! - a somatic prior from hotspot recurrence, population frequency and
//!   ClinVar germline assertions, combined as summed log-odds
//!
//! The DSC score is the confidence-weighted mean of the available modules.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use oncotier_common::confidence::{clamp_unit, sigmoid, weighted_mean};
use oncotier_common::{AnalysisType, ClinVarSignificance, Evidence, EvidencePayload, VariantAnnotation};
use oncotier_config::{PurityThresholds, VafThresholds};

use crate::purity::{PurityEstimate, PurityEstimator, PurityMethod};

pub const MODULE_VAF_PURITY: &str = "vaf_purity";
pub const MODULE_PRIOR: &str = "prior_probability";

/// Number of DSC modules; `dsc_confidence` is the mean module confidence
/// over all of them, so a missing module lowers it.
const MODULE_COUNT: f64 = 2.0;

// Log-odds contributions to the somatic prior
const HOTSPOT_LOG_ODDS: f64 = 3.0;
const ABSENT_POPULATION_LOG_ODDS: f64 = 1.0;
const POPULATION_SLOPE: f64 = 0.8;
const CLINVAR_PATHOGENIC_LOG_ODDS: f64 = -3.0;
const CLINVAR_BENIGN_LOG_ODDS: f64 = -2.0;

/// Result of one DSC module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModuleOutcome {
    Available { score: f64, confidence: f64 },
    Unavailable { reason: String },
}

impl ModuleOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            ModuleOutcome::Available { score, .. } => Some(*score),
            ModuleOutcome::Unavailable { .. } => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            ModuleOutcome::Available { confidence, .. } => *confidence,
            ModuleOutcome::Unavailable { .. } => 0.0,
        }
    }

    fn unavailable(reason: &str) -> Self {
        ModuleOutcome::Unavailable { reason: reason.to_string() }
    }
}

/// Inputs the score was computed from, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscInputs {
    pub tumor_purity: Option<f64>,
    pub purity_method: Option<PurityMethod>,
    pub variant_vaf: Option<f64>,
    pub depth: Option<u32>,
    pub hotspot_evidence: bool,
    pub population_frequency: Option<f64>,
    pub clinvar_germline: Option<ClinVarSignificance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicSomaticConfidence {
    pub dsc_score: f64,
    pub dsc_confidence: f64,
    pub vaf_purity: ModuleOutcome,
    pub prior_probability: ModuleOutcome,
    pub inputs: DscInputs,
    pub modules_available: Vec<String>,
}

impl DynamicSomaticConfidence {
    pub fn vaf_purity_score(&self) -> Option<f64> {
        self.vaf_purity.score()
    }

    pub fn prior_probability_score(&self) -> Option<f64> {
        self.prior_probability.score()
    }
}

pub struct DscCalculator<'a> {
    vaf: &'a VafThresholds,
    purity: &'a PurityThresholds,
}

impl<'a> DscCalculator<'a> {
    pub fn new(vaf: &'a VafThresholds, purity: &'a PurityThresholds) -> Self {
        Self { vaf, purity }
    }

    /// Score a variant. Purity comes from the argument, then the variant,
    /// then an estimate over `cohort`; without any of them the VAF module
    /// is unavailable.
    pub fn calculate_dsc_score(
        &self,
        variant: &VariantAnnotation,
        evidence: &[Evidence],
        tumor_purity: Option<f64>,
        cohort: Option<&[VariantAnnotation]>,
        analysis_type: AnalysisType,
    ) -> DynamicSomaticConfidence {
        let estimate = self.resolve_purity(variant, tumor_purity, cohort, analysis_type);
        self.score_with_purity(variant, evidence, estimate.as_ref())
    }

    pub fn resolve_purity(
        &self,
        variant: &VariantAnnotation,
        tumor_purity: Option<f64>,
        cohort: Option<&[VariantAnnotation]>,
        analysis_type: AnalysisType,
    ) -> Option<PurityEstimate> {
        let supplied = tumor_purity.or(variant.tumor_purity).filter(|p| {
            let in_range = (0.0..=1.0).contains(p);
            if !in_range {
                warn!(purity = *p, "Supplied tumor purity outside [0, 1], ignoring it");
            }
            in_range
        });
        if let Some(purity) = supplied {
            return Some(PurityEstimate {
                purity,
                confidence: self.purity.metadata_confidence,
                method: PurityMethod::Metadata,
                supporting_variants: 0,
            });
        }
        cohort.map(|c| PurityEstimator::new(self.vaf, self.purity).estimate_purity(c, analysis_type, None))
    }

    /// Score with an already resolved purity.
    pub fn score_with_purity(
        &self,
        variant: &VariantAnnotation,
        evidence: &[Evidence],
        purity: Option<&PurityEstimate>,
    ) -> DynamicSomaticConfidence {
        let inputs = collect_inputs(variant, evidence, purity);
        let vaf_purity = self.vaf_purity_module(&inputs, purity);
        let prior_probability = prior_module(&inputs);

        let mut modules_available = Vec::new();
        let mut pairs = Vec::new();
        for (name, outcome) in [(MODULE_VAF_PURITY, &vaf_purity), (MODULE_PRIOR, &prior_probability)] {
            if let ModuleOutcome::Available { score, confidence } = outcome {
                modules_available.push(name.to_string());
                pairs.push((*score, *confidence));
            }
        }
        let dsc_score = clamp_unit(weighted_mean(&pairs).unwrap_or(0.5));
        let dsc_confidence = clamp_unit(
            (vaf_purity.confidence() + prior_probability.confidence()) / MODULE_COUNT,
        );

        debug!(
            variant = %variant.variant_key(),
            dsc_score,
            dsc_confidence,
            modules = modules_available.len(),
            "DSC computed"
        );

        DynamicSomaticConfidence {
            dsc_score,
            dsc_confidence,
            vaf_purity,
            prior_probability,
            inputs,
            modules_available,
        }
    }

    fn vaf_purity_module(&self, inputs: &DscInputs, purity: Option<&PurityEstimate>) -> ModuleOutcome {
        let Some(estimate) = purity else {
            return ModuleOutcome::unavailable("no tumor purity or cohort");
        };
        let Some(vaf) = inputs.variant_vaf else {
            return ModuleOutcome::unavailable("variant has no VAF");
        };
        let score = vaf_consistency(vaf, estimate.purity, self.vaf);
        let depth_factor = inputs
            .depth
            .map(|d| (d as f64 / self.vaf.saturating_depth as f64).clamp(0.3, 1.0))
            .unwrap_or(0.5);
        ModuleOutcome::Available { score, confidence: clamp_unit(depth_factor * estimate.confidence) }
    }
}

/// How well a VAF fits a heterozygous somatic event at this purity.
pub fn vaf_consistency(vaf: f64, purity: f64, t: &VafThresholds) -> f64 {
    let expected = purity / 2.0;
    let window = t.vaf_tolerance.max(t.relative_tolerance * expected);
    let deviation = (vaf - expected).abs();

    if vaf < t.min_vaf {
        0.3
    } else if deviation <= window {
        1.0 - 0.1 * deviation / window
    } else if (vaf - 0.5).abs() <= t.germline_window && purity >= t.high_purity {
        // Heterozygous germline look in a sample that should show ~purity/2
        0.2
    } else if vaf > purity + window {
        // More alt reads than tumor cells can explain
        0.15
    } else if vaf > expected {
        // Loss of heterozygosity
        0.7
    } else {
        let floor = (expected - window).max(f64::EPSILON);
        // Subclonal
        clamp_unit(0.4 + 0.4 * vaf / floor)
    }
}

fn collect_inputs(variant: &VariantAnnotation, evidence: &[Evidence], purity: Option<&PurityEstimate>) -> DscInputs {
    let mut hotspot_evidence = variant.has_hotspot();
    let mut population_frequency = variant.max_population_af();
    let mut clinvar_germline = variant.clinvar;

    for ev in evidence {
        match &ev.payload {
            EvidencePayload::Hotspot { .. } => hotspot_evidence = true,
            EvidencePayload::PopulationFrequency { allele_frequency, .. } => {
                population_frequency = Some(population_frequency.map_or(*allele_frequency, |af| af.max(*allele_frequency)));
            }
            EvidencePayload::Germline { significance } => {
                // A pathogenic assertion outranks any other
                if clinvar_germline.map_or(true, |c| !c.is_germline_pathogenic()) {
                    clinvar_germline = Some(*significance);
                }
            }
            _ => {}
        }
    }

    DscInputs {
        tumor_purity: purity.map(|p| p.purity),
        purity_method: purity.map(|p| p.method),
        variant_vaf: variant.vaf,
        depth: variant.depth,
        hotspot_evidence,
        population_frequency,
        clinvar_germline,
    }
}

/// Log-odds contribution of a population allele frequency: positive for
/// absent or ultra-rare variants, falling as the frequency grows.
pub fn population_log_odds(af: Option<f64>) -> f64 {
    match af {
        None => ABSENT_POPULATION_LOG_ODDS,
        Some(af) if af <= 0.0 => ABSENT_POPULATION_LOG_ODDS,
        Some(af) => (-POPULATION_SLOPE * (af.log10() + 4.0)).clamp(-4.0, ABSENT_POPULATION_LOG_ODDS),
    }
}

fn prior_module(inputs: &DscInputs) -> ModuleOutcome {
    let mut log_odds = population_log_odds(inputs.population_frequency);
    if inputs.hotspot_evidence {
        log_odds += HOTSPOT_LOG_ODDS;
    }
    let clinvar_known = match inputs.clinvar_germline {
        Some(c) if c.is_germline_pathogenic() => {
            log_odds += CLINVAR_PATHOGENIC_LOG_ODDS;
            true
        }
        Some(c) if c.is_germline_benign() => {
            log_odds += CLINVAR_BENIGN_LOG_ODDS;
            true
        }
        Some(_) => true,
        None => false,
    };
    let confidence = 0.6
        + if inputs.population_frequency.is_some() { 0.2 } else { 0.0 }
        + if clinvar_known { 0.2 } else { 0.0 };
    ModuleOutcome::Available { score: sigmoid(log_odds), confidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{HotspotEvidence, PopulationFrequency};

    fn calc_inputs() -> (VafThresholds, PurityThresholds) {
        (VafThresholds::default(), PurityThresholds::default())
    }

    fn hotspot_variant(vaf: f64, depth: u32) -> VariantAnnotation {
        let mut v = VariantAnnotation::new("BRAF", "7", 140453136, "A", "T");
        v.vaf = Some(vaf);
        v.depth = Some(depth);
        v.hotspots.push(HotspotEvidence {
            source: "cancerhotspots".into(),
            position_samples: 900,
            alt_samples: 850,
            cancer_types: vec![],
        });
        v.population_frequencies.push(PopulationFrequency {
            database: "gnomAD".into(),
            population: None,
            allele_frequency: 0.0,
        });
        v
    }

    #[test]
    fn test_vaf_consistency_patterns() {
        let t = VafThresholds::default();
        // On the heterozygous expectation
        assert!(vaf_consistency(0.40, 0.8, &t) > 0.95);
        // Germline-like in a pure sample
        assert_eq!(vaf_consistency(0.49, 0.75, &t), 0.2);
        // LOH: above purity/2 but below purity
        assert_eq!(vaf_consistency(0.6, 0.7, &t), 0.7);
        // Subclonal
        let sub = vaf_consistency(0.1, 0.8, &t);
        assert!(sub > 0.4 && sub < 0.7);
        assert_eq!(vaf_consistency(0.01, 0.8, &t), 0.3);
    }

    #[test]
    fn test_hotspot_with_matching_vaf_scores_high() {
        let (vaf, purity) = calc_inputs();
        let dsc = DscCalculator::new(&vaf, &purity).calculate_dsc_score(
            &hotspot_variant(0.45, 250),
            &[],
            Some(0.8),
            None,
            AnalysisType::TumorOnly,
        );
        assert!(dsc.dsc_score > 0.9, "dsc {}", dsc.dsc_score);
        assert_eq!(dsc.modules_available, vec![MODULE_VAF_PURITY, MODULE_PRIOR]);
        assert_eq!(dsc.inputs.purity_method, Some(PurityMethod::Metadata));
    }

    #[test]
    fn test_germline_like_variant_scores_low() {
        let (vaf, purity) = calc_inputs();
        let mut v = VariantAnnotation::new("CHEK2", "22", 29121087, "A", "G");
        v.vaf = Some(0.48);
        v.depth = Some(300);
        v.population_frequencies.push(PopulationFrequency {
            database: "gnomAD".into(),
            population: None,
            allele_frequency: 0.02,
        });
        v.clinvar = Some(ClinVarSignificance::Pathogenic);
        let dsc = DscCalculator::new(&vaf, &purity).calculate_dsc_score(&v, &[], Some(0.8), None, AnalysisType::TumorOnly);
        assert!(dsc.dsc_score < 0.5, "dsc {}", dsc.dsc_score);
        assert!(dsc.inputs.clinvar_germline.is_some());
    }

    #[test]
    fn test_missing_purity_drops_vaf_module_and_confidence() {
        let (vaf, purity) = calc_inputs();
        let calc = DscCalculator::new(&vaf, &purity);
        let v = hotspot_variant(0.45, 250);
        let with = calc.calculate_dsc_score(&v, &[], Some(0.8), None, AnalysisType::TumorOnly);
        let without = calc.calculate_dsc_score(&v, &[], None, None, AnalysisType::TumorOnly);
        assert!(matches!(without.vaf_purity, ModuleOutcome::Unavailable { .. }));
        assert_eq!(without.modules_available, vec![MODULE_PRIOR]);
        assert!(without.dsc_confidence < with.dsc_confidence);
        // Score falls back to the prior alone rather than to zero
        assert!(without.dsc_score > 0.9);
    }

    #[test]
    fn test_out_of_range_purity_falls_back_to_cohort() {
        let (vaf, purity) = calc_inputs();
        let calc = DscCalculator::new(&vaf, &purity);
        let cohort: Vec<VariantAnnotation> = (0..20).map(|i| hotspot_variant(0.29 + 0.002 * i as f64, 250)).collect();
        let resolved = calc
            .resolve_purity(&cohort[0], Some(1.5), Some(&cohort), AnalysisType::TumorOnly)
            .unwrap();
        assert_eq!(resolved.method, PurityMethod::VafPeak);
        assert!((resolved.purity - 0.6).abs() < 0.1, "purity {}", resolved.purity);
        assert!(calc.resolve_purity(&cohort[0], Some(-0.2), None, AnalysisType::TumorOnly).is_none());
    }

    #[test]
    fn test_population_log_odds_monotonic() {
        let rare = population_log_odds(Some(1e-5));
        let uncommon = population_log_odds(Some(1e-3));
        let common = population_log_odds(Some(0.05));
        assert!(population_log_odds(None) >= rare);
        assert!(rare > uncommon && uncommon > common);
        assert!(population_log_odds(Some(1.0)) >= -4.0);
    }
}
