//! Typed knowledge-base records and lookup queries.

use serde::{Deserialize, Serialize};

use oncotier_common::{
    ActionabilityContext, BiomarkerEvidence, CancerMatch, ClinVarSignificance, KnowledgeSource,
    MatchLevel, OncoKbLevel, OncoKbOncogenicity, Prediction,
};

/// One curated fact. Tagged by `type` in snapshot JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KbRecord {
    /// Variant-drug-cancer (or diagnostic/prognostic) association
    Biomarker(BiomarkerEvidence),
    OncoKb {
        #[serde(default)]
        level: Option<OncoKbLevel>,
        #[serde(default = "default_context")]
        context: ActionabilityContext,
        #[serde(default)]
        therapies: Vec<String>,
        #[serde(default)]
        oncogenicity: Option<OncoKbOncogenicity>,
        #[serde(default)]
        fda_approved: bool,
    },
    /// Established oncogenic (or neutral) classification of an alteration
    Oncogenic {
        oncogenic: bool,
        /// Supported by well-established functional studies
        #[serde(default)]
        functional_study: bool,
    },
    Hotspot {
        position_samples: u32,
        alt_samples: u32,
    },
    FunctionalDomain {
        name: String,
        start: u32,
        end: u32,
        /// Critical, well-established domain without benign variation
        #[serde(default)]
        critical: bool,
    },
    PopulationFrequency {
        database: String,
        allele_frequency: f64,
    },
    Computational {
        tool: String,
        prediction: Prediction,
        #[serde(default)]
        score: Option<f64>,
    },
    Germline {
        significance: ClinVarSignificance,
    },
    GeneRole {
        #[serde(default)]
        oncogene: bool,
        #[serde(default)]
        tumor_suppressor: bool,
    },
    /// Gene whose germline alteration causes a malignancy with a single
    /// genetic etiology; the entry's cancer types list those malignancies.
    SingleEtiology,
}

fn default_context() -> ActionabilityContext {
    ActionabilityContext::Therapeutic
}

/// A record as stored in a source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbEntry {
    pub gene: String,
    /// Protein change in any notation, a gene-wide label such as
    /// "Oncogenic Mutations", or `None` for gene-level facts
    #[serde(default)]
    pub alteration: Option<String>,
    /// Empty means the record applies to all tumor types
    #[serde(default)]
    pub cancer_types: Vec<String>,
    pub record: KbRecord,
}

impl KbEntry {
    pub fn new(gene: impl Into<String>, record: KbRecord) -> Self {
        Self { gene: gene.into(), alteration: None, cancer_types: Vec::new(), record }
    }

    pub fn alteration(mut self, alteration: impl Into<String>) -> Self {
        self.alteration = Some(alteration.into());
        self
    }

    pub fn cancer_types(mut self, cancer_types: &[&str]) -> Self {
        self.cancer_types = cancer_types.iter().map(|c| c.to_string()).collect();
        self
    }

    /// True for pan-cancer records ("All Tumors" or no tumor types).
    pub fn is_pan_cancer(&self) -> bool {
        self.cancer_types.is_empty()
            || self
                .cancer_types
                .iter()
                .any(|c| c.eq_ignore_ascii_case("all tumors") || c.eq_ignore_ascii_case("all"))
    }
}

/// Which notation of the alteration the query matches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Alteration {
    /// Full HGVS protein change, e.g. "p.Val600Glu"
    Exact(String),
    /// One-letter form, e.g. "V600E"
    ShortForm(String),
    /// Every curated record in the gene
    Gene,
}

impl Alteration {
    pub fn match_level(&self) -> MatchLevel {
        match self {
            Alteration::Exact(_) => MatchLevel::Exact,
            Alteration::ShortForm(_) => MatchLevel::ShortForm,
            Alteration::Gene => MatchLevel::GeneLevel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KbQuery {
    pub gene: String,
    pub alteration: Alteration,
    /// `None` requests the pan-cancer fallback: every record regardless of
    /// tumor type.
    pub cancer_type: Option<String>,
}

impl KbQuery {
    pub fn new(gene: impl Into<String>, alteration: Alteration, cancer_type: Option<&str>) -> Self {
        Self {
            gene: gene.into(),
            alteration,
            cancer_type: cancer_type.map(str::to_string),
        }
    }
}

/// A matched record with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct KbHit {
    pub source: KnowledgeSource,
    pub alteration: Option<String>,
    pub cancer_types: Vec<String>,
    pub match_level: MatchLevel,
    pub cancer_match: CancerMatch,
    pub record: KbRecord,
}
