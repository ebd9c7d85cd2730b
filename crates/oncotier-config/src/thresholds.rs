//! Versioned threshold table.
//!
//! The VICC band cutoffs and DSC gates are clinically significant constants.
//! They live here rather than as literals in the engine so a lab can pin,
//! review and version them. Every `TierResult` records the table version.

use serde::{Deserialize, Serialize};

/// Complete threshold table consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    /// Recorded in every TierResult for audit
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub vicc: ViccBands,

    #[serde(default)]
    pub dsc: DscThresholds,

    #[serde(default)]
    pub tiers: TierThresholds,

    #[serde(default)]
    pub purity: PurityThresholds,

    #[serde(default)]
    pub hotspot: HotspotThresholds,

    #[serde(default)]
    pub population: PopulationThresholds,

    /// Evidence below this (post-weighting) confidence is ignored by the
    /// oncogenicity classifier.
    #[serde(default = "default_min_evidence_confidence")]
    pub min_evidence_confidence: f64,
}

fn default_version() -> String { "vicc2022-amp2017-v1".to_string() }
fn default_min_evidence_confidence() -> f64 { 0.05 }

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            version: default_version(),
            vicc: ViccBands::default(),
            dsc: DscThresholds::default(),
            tiers: TierThresholds::default(),
            purity: PurityThresholds::default(),
            hotspot: HotspotThresholds::default(),
            population: PopulationThresholds::default(),
            min_evidence_confidence: default_min_evidence_confidence(),
        }
    }
}

// ── VICC/CGC 2022 point bands ─────────────────────────────────────────────────

/// Point cutoffs from Horak et al. 2022 (Genet Med 24:986), Table 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViccBands {
    /// total ≥ this → Oncogenic
    #[serde(default = "default_oncogenic_min")]
    pub oncogenic_min: i32,
    /// total ≥ this → Likely Oncogenic
    #[serde(default = "default_likely_oncogenic_min")]
    pub likely_oncogenic_min: i32,
    /// total ≤ this → Likely Benign
    #[serde(default = "default_likely_benign_max")]
    pub likely_benign_max: i32,
    /// total ≤ this → Benign
    #[serde(default = "default_benign_max")]
    pub benign_max: i32,
}

fn default_oncogenic_min() -> i32 { 10 }
fn default_likely_oncogenic_min() -> i32 { 6 }
fn default_likely_benign_max() -> i32 { -1 }
fn default_benign_max() -> i32 { -7 }

impl Default for ViccBands {
    fn default() -> Self {
        Self {
            oncogenic_min: default_oncogenic_min(),
            likely_oncogenic_min: default_likely_oncogenic_min(),
            likely_benign_max: default_likely_benign_max(),
            benign_max: default_benign_max(),
        }
    }
}

// ── Dynamic Somatic Confidence gates ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscThresholds {
    /// dsc_score ≥ this permits Tier I in tumor-only analysis
    #[serde(default = "default_dsc_tier1")]
    pub tier1_min: f64,
    /// dsc_score ≥ this permits at most Tier II; below it the ceiling is Tier III
    #[serde(default = "default_dsc_tier2")]
    pub tier2_min: f64,
}

fn default_dsc_tier1() -> f64 { 0.9 }
fn default_dsc_tier2() -> f64 { 0.6 }

impl Default for DscThresholds {
    fn default() -> Self {
        Self { tier1_min: default_dsc_tier1(), tier2_min: default_dsc_tier2() }
    }
}

// ── Tier mapping ──────────────────────────────────────────────────────────────

/// Minimum context evidence scores for each AMP tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_tier_ia_min")]
    pub tier_ia_min: f64,
    #[serde(default = "default_tier_ib_min")]
    pub tier_ib_min: f64,
    #[serde(default = "default_tier_iic_min")]
    pub tier_iic_min: f64,
    #[serde(default = "default_tier_iid_min")]
    pub tier_iid_min: f64,
    /// Population AF above which a variant is treated as common (Tier IV)
    #[serde(default = "default_population_common_af")]
    pub population_common_af: f64,
    /// Score multiplier for evidence matched via the pan-cancer fallback
    #[serde(default = "default_off_label_discount")]
    pub off_label_discount: f64,
    /// Geometric decay applied to lower-ranked evidence in a context score
    #[serde(default = "default_evidence_decay")]
    pub evidence_decay: f64,
}

fn default_tier_ia_min() -> f64 { 0.8 }
fn default_tier_ib_min() -> f64 { 0.6 }
fn default_tier_iic_min() -> f64 { 0.3 }
fn default_tier_iid_min() -> f64 { 0.1 }
fn default_population_common_af() -> f64 { 0.01 }
fn default_off_label_discount() -> f64 { 0.8 }
fn default_evidence_decay() -> f64 { 0.25 }

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            tier_ia_min: default_tier_ia_min(),
            tier_ib_min: default_tier_ib_min(),
            tier_iic_min: default_tier_iic_min(),
            tier_iid_min: default_tier_iid_min(),
            population_common_af: default_population_common_af(),
            off_label_discount: default_off_label_discount(),
            evidence_decay: default_evidence_decay(),
        }
    }
}

// ── Purity estimation ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurityThresholds {
    /// Qualifying variants required for VAF-based estimation
    #[serde(default = "default_min_supporting")]
    pub min_supporting_variants: usize,
    /// Purity reported when data is insufficient
    #[serde(default = "default_purity")]
    pub default_purity: f64,
    #[serde(default = "default_insufficient_confidence")]
    pub insufficient_confidence: f64,
    /// Confidence assigned to caller-supplied purity
    #[serde(default = "default_metadata_confidence")]
    pub metadata_confidence: f64,
    /// Population AF at or below which a variant counts as rare (tumor-only filter)
    #[serde(default = "default_rare_af")]
    pub rare_af: f64,
    /// Half-width of the window used to measure peak tightness
    #[serde(default = "default_peak_window")]
    pub peak_window: f64,
    /// Cohort size at which the count component of confidence saturates
    #[serde(default = "default_saturating_count")]
    pub saturating_count: usize,
}

fn default_min_supporting() -> usize { 10 }
fn default_purity() -> f64 { 0.5 }
fn default_insufficient_confidence() -> f64 { 0.1 }
fn default_metadata_confidence() -> f64 { 0.95 }
fn default_rare_af() -> f64 { 0.001 }
fn default_peak_window() -> f64 { 0.05 }
fn default_saturating_count() -> usize { 30 }

impl Default for PurityThresholds {
    fn default() -> Self {
        Self {
            min_supporting_variants: default_min_supporting(),
            default_purity: default_purity(),
            insufficient_confidence: default_insufficient_confidence(),
            metadata_confidence: default_metadata_confidence(),
            rare_af: default_rare_af(),
            peak_window: default_peak_window(),
            saturating_count: default_saturating_count(),
        }
    }
}

// ── Oncogenicity criteria cutoffs ─────────────────────────────────────────────

/// cancerhotspots.org sample-count cutoffs for OS3 / OM4 / OP3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotThresholds {
    /// OS3 requires at least this many samples at the residue
    #[serde(default = "default_strong_position_samples")]
    pub strong_position_samples: u32,
    /// OS3 / OM4 require at least this many samples with the same change
    #[serde(default = "default_min_alt_samples")]
    pub min_alt_samples: u32,
}

fn default_strong_position_samples() -> u32 { 50 }
fn default_min_alt_samples() -> u32 { 10 }

impl Default for HotspotThresholds {
    fn default() -> Self {
        Self {
            strong_position_samples: default_strong_position_samples(),
            min_alt_samples: default_min_alt_samples(),
        }
    }
}

/// Population allele-frequency cutoffs for SBVS1 / SBS1 / OP4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationThresholds {
    /// AF above this fires SBVS1
    #[serde(default = "default_very_strong_benign_af")]
    pub very_strong_benign_af: f64,
    /// AF above this fires SBS1
    #[serde(default = "default_strong_benign_af")]
    pub strong_benign_af: f64,
}

fn default_very_strong_benign_af() -> f64 { 0.05 }
fn default_strong_benign_af() -> f64 { 0.01 }

impl Default for PopulationThresholds {
    fn default() -> Self {
        Self {
            very_strong_benign_af: default_very_strong_benign_af(),
            strong_benign_af: default_strong_benign_af(),
        }
    }
}

impl ThresholdTable {
    /// Collect every problem with the table; empty means valid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let v = &self.vicc;
        if !(v.oncogenic_min > v.likely_oncogenic_min
            && v.likely_oncogenic_min > 0
            && v.likely_benign_max < 0
            && v.benign_max < v.likely_benign_max)
        {
            problems.push(format!(
                "VICC bands must satisfy benign_max < likely_benign_max < 0 < likely_oncogenic_min < oncogenic_min (got {}, {}, {}, {})",
                v.benign_max, v.likely_benign_max, v.likely_oncogenic_min, v.oncogenic_min
            ));
        }
        if !(self.dsc.tier1_min > self.dsc.tier2_min && self.dsc.tier2_min > 0.0 && self.dsc.tier1_min <= 1.0) {
            problems.push(format!(
                "DSC gates must satisfy 0 < tier2_min < tier1_min <= 1 (got {}, {})",
                self.dsc.tier2_min, self.dsc.tier1_min
            ));
        }
        let t = &self.tiers;
        if !(t.tier_ia_min >= t.tier_ib_min && t.tier_ib_min >= t.tier_iic_min && t.tier_iic_min >= t.tier_iid_min) {
            problems.push("Tier minima must be non-increasing from IA to IID".to_string());
        }
        let unit_fields = [
            ("tiers.tier_ia_min", t.tier_ia_min),
            ("tiers.tier_iid_min", t.tier_iid_min),
            ("tiers.population_common_af", t.population_common_af),
            ("tiers.off_label_discount", t.off_label_discount),
            ("tiers.evidence_decay", t.evidence_decay),
            ("purity.default_purity", self.purity.default_purity),
            ("purity.insufficient_confidence", self.purity.insufficient_confidence),
            ("purity.metadata_confidence", self.purity.metadata_confidence),
            ("purity.rare_af", self.purity.rare_af),
            ("purity.peak_window", self.purity.peak_window),
            ("population.strong_benign_af", self.population.strong_benign_af),
            ("population.very_strong_benign_af", self.population.very_strong_benign_af),
            ("min_evidence_confidence", self.min_evidence_confidence),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                problems.push(format!("{} must be in [0, 1] (got {})", name, value));
            }
        }
        if self.population.strong_benign_af >= self.population.very_strong_benign_af {
            problems.push("population.strong_benign_af must be below very_strong_benign_af".to_string());
        }
        if self.purity.min_supporting_variants == 0 {
            problems.push("purity.min_supporting_variants must be at least 1".to_string());
        }
        problems
    }
}
