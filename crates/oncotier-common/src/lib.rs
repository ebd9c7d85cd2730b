//! oncotier-common: Shared variant, evidence and tier types used across all oncotier crates.

pub mod error;
pub mod variant;
pub mod evidence;
pub mod sources;
pub mod tiers;
pub mod hgvs;
pub mod confidence;

// Re-export commonly used types
pub use error::{Result, TieringError};
pub use evidence::{
    BiomarkerEvidence, CancerMatch, Evidence, EvidencePayload, GuidelineFamily, MatchLevel,
    MatchProvenance, OncoKbImplication, Response,
};
pub use hgvs::{normalise_protein_change, ProteinChange};
pub use sources::{KnowledgeSource, SourceKind};
pub use tiers::{
    ActionabilityContext, AmpTier, AnalysisType, BiomarkerLevel, CriterionStrength,
    EvidenceStrength, OncoKbLevel, OncoKbOncogenicity, ViccClassification, ViccCriterion,
};
pub use variant::{
    ClinVarSignificance, HotspotEvidence, InSilicoPrediction, PopulationFrequency, Prediction,
    VariantAnnotation,
};
