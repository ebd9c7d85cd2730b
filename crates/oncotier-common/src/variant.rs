//! Annotated somatic variant: the immutable input to the tiering engine.
//!
//! Produced upstream by VEP-based annotation; never mutated by this core.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TieringError};
use crate::hgvs::{normalise_protein_change, ProteinChange};

/// Sequence Ontology consequence terms that abolish gene function.
const NULL_CONSEQUENCES: &[&str] = &[
    "transcript_ablation",
    "stop_gained",
    "frameshift_variant",
    "splice_acceptor_variant",
    "splice_donor_variant",
    "start_lost",
];

const LENGTH_CHANGING_CONSEQUENCES: &[&str] =
    &["inframe_insertion", "inframe_deletion", "stop_lost", "protein_altering_variant"];

const SPLICE_CONSEQUENCES: &[&str] = &[
    "splice_acceptor_variant",
    "splice_donor_variant",
    "splice_region_variant",
    "splice_donor_5th_base_variant",
    "splice_donor_region_variant",
    "splice_polypyrimidine_tract_variant",
];

// ---------------------------------------------------------------------------
// Nested annotation records
// ---------------------------------------------------------------------------

/// Allele frequency observed in a population database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationFrequency {
    /// e.g. "gnomAD_exomes"
    pub database: String,
    /// e.g. "nfe", "afr"; `None` for the global frequency
    #[serde(default)]
    pub population: Option<String>,
    pub allele_frequency: f64,
}

/// Recurrence of the variant across cancer cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotEvidence {
    /// e.g. "cancerhotspots", "COSMIC"
    pub source: String,
    /// Samples with any somatic variant at this residue
    pub position_samples: u32,
    /// Samples with this exact amino-acid change
    pub alt_samples: u32,
    /// Cancer types the hotspot was observed in; empty means pan-cancer
    #[serde(default)]
    pub cancer_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinVarSignificance {
    Pathogenic,
    LikelyPathogenic,
    UncertainSignificance,
    LikelyBenign,
    Benign,
    Conflicting,
    Other,
}

impl ClinVarSignificance {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "pathogenic" => ClinVarSignificance::Pathogenic,
            "likely pathogenic" => ClinVarSignificance::LikelyPathogenic,
            "pathogenic/likely pathogenic" => ClinVarSignificance::Pathogenic,
            "uncertain significance" | "vus" => ClinVarSignificance::UncertainSignificance,
            "likely benign" => ClinVarSignificance::LikelyBenign,
            "benign" | "benign/likely benign" => ClinVarSignificance::Benign,
            s if s.starts_with("conflicting") => ClinVarSignificance::Conflicting,
            _ => ClinVarSignificance::Other,
        }
    }

    /// Germline pathogenic / likely pathogenic assertion.
    pub fn is_germline_pathogenic(&self) -> bool {
        matches!(self, ClinVarSignificance::Pathogenic | ClinVarSignificance::LikelyPathogenic)
    }

    /// Germline benign assertion (a known polymorphism).
    pub fn is_germline_benign(&self) -> bool {
        matches!(self, ClinVarSignificance::Benign | ClinVarSignificance::LikelyBenign)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    Damaging,
    Benign,
    Uncertain,
}

/// A single computational predictor call (SIFT, PolyPhen-2, REVEL, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InSilicoPrediction {
    pub tool: String,
    pub prediction: Prediction,
    #[serde(default)]
    pub score: Option<f64>,
}

// ---------------------------------------------------------------------------
// VariantAnnotation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAnnotation {
    /// HGNC gene symbol (required)
    pub gene: String,
    pub chromosome: String,
    pub position: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    #[serde(default)]
    pub hgvs_c: Option<String>,
    #[serde(default)]
    pub hgvs_p: Option<String>,
    #[serde(default)]
    pub consequences: Vec<String>,
    /// Variant allele frequency in [0, 1]
    #[serde(default)]
    pub vaf: Option<f64>,
    #[serde(default)]
    pub depth: Option<u32>,
    /// Caller-supplied tumor purity in [0, 1]
    #[serde(default)]
    pub tumor_purity: Option<f64>,
    #[serde(default)]
    pub is_oncogene: bool,
    #[serde(default)]
    pub is_tumor_suppressor: bool,
    #[serde(default)]
    pub population_frequencies: Vec<PopulationFrequency>,
    #[serde(default)]
    pub hotspots: Vec<HotspotEvidence>,
    #[serde(default)]
    pub clinvar: Option<ClinVarSignificance>,
    #[serde(default)]
    pub predictions: Vec<InSilicoPrediction>,
}

impl VariantAnnotation {
    /// Minimal variant; the remaining fields default to empty.
    pub fn new(
        gene: impl Into<String>,
        chromosome: impl Into<String>,
        position: u64,
        ref_allele: impl Into<String>,
        alt_allele: impl Into<String>,
    ) -> Self {
        Self {
            gene: gene.into(),
            chromosome: chromosome.into(),
            position,
            ref_allele: ref_allele.into(),
            alt_allele: alt_allele.into(),
            hgvs_c: None,
            hgvs_p: None,
            consequences: Vec::new(),
            vaf: None,
            depth: None,
            tumor_purity: None,
            is_oncogene: false,
            is_tumor_suppressor: false,
            population_frequencies: Vec::new(),
            hotspots: Vec::new(),
            clinvar: None,
            predictions: Vec::new(),
        }
    }

    /// Check the input contract. Only structural problems are rejected;
    /// missing optional annotations are tolerated downstream.
    pub fn validate(&self) -> Result<()> {
        if self.gene.trim().is_empty() {
            return Err(TieringError::MissingField("gene"));
        }
        if self.chromosome.trim().is_empty() {
            return Err(TieringError::MissingField("chromosome"));
        }
        if self.ref_allele.is_empty() && self.alt_allele.is_empty() {
            return Err(TieringError::InvalidInput(format!(
                "{} at {}:{} has neither ref nor alt allele",
                self.gene, self.chromosome, self.position
            )));
        }
        if let Some(vaf) = self.vaf {
            if !(0.0..=1.0).contains(&vaf) {
                return Err(TieringError::OutOfRange { field: "vaf", value: vaf });
            }
        }
        if let Some(purity) = self.tumor_purity {
            if !(0.0..=1.0).contains(&purity) {
                return Err(TieringError::OutOfRange { field: "tumor_purity", value: purity });
            }
        }
        Ok(())
    }

    /// Stable identity used for memoisation and reporting.
    pub fn variant_key(&self) -> String {
        format!(
            "{}:{}:{}:{}>{}",
            self.gene, self.chromosome, self.position, self.ref_allele, self.alt_allele
        )
    }

    pub fn protein_change(&self) -> Option<ProteinChange> {
        self.hgvs_p.as_deref().and_then(normalise_protein_change)
    }

    fn has_consequence(&self, terms: &[&str]) -> bool {
        self.consequences
            .iter()
            .any(|c| c.split('&').any(|part| terms.contains(&part.trim())))
    }

    /// Loss-of-function consequence (nonsense, frameshift, canonical splice, start loss).
    pub fn is_null_variant(&self) -> bool {
        self.has_consequence(NULL_CONSEQUENCES)
            || self.protein_change().is_some_and(|pc| pc.is_nonsense())
    }

    pub fn is_length_changing(&self) -> bool {
        self.has_consequence(LENGTH_CHANGING_CONSEQUENCES)
    }

    pub fn is_missense(&self) -> bool {
        self.has_consequence(&["missense_variant"])
            || self
                .protein_change()
                .is_some_and(|pc| !pc.is_nonsense() && !pc.is_synonymous())
    }

    pub fn is_synonymous(&self) -> bool {
        self.has_consequence(&["synonymous_variant"])
            || self.protein_change().is_some_and(|pc| pc.is_synonymous())
    }

    pub fn has_splice_impact(&self) -> bool {
        self.has_consequence(SPLICE_CONSEQUENCES)
    }

    /// Highest allele frequency across all population records.
    pub fn max_population_af(&self) -> Option<f64> {
        self.population_frequencies
            .iter()
            .map(|p| p.allele_frequency)
            .fold(None, |acc, af| Some(acc.map_or(af, |m: f64| m.max(af))))
    }

    pub fn has_hotspot(&self) -> bool {
        !self.hotspots.is_empty()
    }

    pub fn is_clinvar_germline_pathogenic(&self) -> bool {
        self.clinvar.is_some_and(|c| c.is_germline_pathogenic())
    }
}
