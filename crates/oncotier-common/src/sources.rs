//! Knowledge source identifiers.
//!
//! Every Evidence record carries the source it was derived from so that
//! deduplication, pathway weighting and audit trails can key on it.

use serde::{Deserialize, Serialize};

/// A configured knowledge base or annotation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    /// FDA companion-diagnostic / drug-label approvals
    Fda,
    /// NCCN and other professional guidelines
    Nccn,
    OncoKb,
    Civic,
    /// Cancer Genome Interpreter biomarker catalogue
    Cgi,
    /// cancerhotspots.org recurrence statistics
    CancerHotspots,
    Cosmic,
    Gnomad,
    ClinVar,
    /// dbNSFP computational predictors (SIFT, PolyPhen, REVEL, ...)
    DbNsfp,
    /// UniProt / Pfam functional domains
    UniProt,
    /// Cancer Gene Census gene roles
    CancerGeneCensus,
    /// Annotations carried on the variant record itself (VEP output)
    Vep,
}

/// Broad category of a source, used for weighting defaults and scorer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    RegulatoryApproval,
    Guideline,
    CuratedBiomarker,
    Hotspot,
    PopulationFrequency,
    Computational,
    GermlinePathogenicity,
    GeneAnnotation,
}

impl KnowledgeSource {
    pub const ALL: [KnowledgeSource; 13] = [
        KnowledgeSource::Fda,
        KnowledgeSource::Nccn,
        KnowledgeSource::OncoKb,
        KnowledgeSource::Civic,
        KnowledgeSource::Cgi,
        KnowledgeSource::CancerHotspots,
        KnowledgeSource::Cosmic,
        KnowledgeSource::Gnomad,
        KnowledgeSource::ClinVar,
        KnowledgeSource::DbNsfp,
        KnowledgeSource::UniProt,
        KnowledgeSource::CancerGeneCensus,
        KnowledgeSource::Vep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeSource::Fda => "fda",
            KnowledgeSource::Nccn => "nccn",
            KnowledgeSource::OncoKb => "onco_kb",
            KnowledgeSource::Civic => "civic",
            KnowledgeSource::Cgi => "cgi",
            KnowledgeSource::CancerHotspots => "cancer_hotspots",
            KnowledgeSource::Cosmic => "cosmic",
            KnowledgeSource::Gnomad => "gnomad",
            KnowledgeSource::ClinVar => "clin_var",
            KnowledgeSource::DbNsfp => "db_nsfp",
            KnowledgeSource::UniProt => "uni_prot",
            KnowledgeSource::CancerGeneCensus => "cancer_gene_census",
            KnowledgeSource::Vep => "vep",
        }
    }

    /// Parse a source name. Accepts the canonical snake_case form plus the
    /// common spellings used in KB exports ("oncokb", "clinvar", "dbnsfp").
    pub fn from_name(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase().replace(['-', ' '], "_");
        let source = match lower.as_str() {
            "fda" => KnowledgeSource::Fda,
            "nccn" | "guideline" | "guidelines" => KnowledgeSource::Nccn,
            "onco_kb" | "oncokb" => KnowledgeSource::OncoKb,
            "civic" => KnowledgeSource::Civic,
            "cgi" => KnowledgeSource::Cgi,
            "cancer_hotspots" | "cancerhotspots" | "hotspots" => KnowledgeSource::CancerHotspots,
            "cosmic" => KnowledgeSource::Cosmic,
            "gnomad" => KnowledgeSource::Gnomad,
            "clin_var" | "clinvar" => KnowledgeSource::ClinVar,
            "db_nsfp" | "dbnsfp" => KnowledgeSource::DbNsfp,
            "uni_prot" | "uniprot" | "pfam" => KnowledgeSource::UniProt,
            "cancer_gene_census" | "cgc" => KnowledgeSource::CancerGeneCensus,
            "vep" => KnowledgeSource::Vep,
            _ => return None,
        };
        Some(source)
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            KnowledgeSource::Fda => SourceKind::RegulatoryApproval,
            KnowledgeSource::Nccn => SourceKind::Guideline,
            KnowledgeSource::OncoKb | KnowledgeSource::Civic | KnowledgeSource::Cgi => {
                SourceKind::CuratedBiomarker
            }
            KnowledgeSource::CancerHotspots | KnowledgeSource::Cosmic => SourceKind::Hotspot,
            KnowledgeSource::Gnomad => SourceKind::PopulationFrequency,
            KnowledgeSource::DbNsfp => SourceKind::Computational,
            KnowledgeSource::ClinVar => SourceKind::GermlinePathogenicity,
            KnowledgeSource::UniProt | KnowledgeSource::CancerGeneCensus | KnowledgeSource::Vep => {
                SourceKind::GeneAnnotation
            }
        }
    }
}

impl std::fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for source in KnowledgeSource::ALL {
            assert_eq!(KnowledgeSource::from_name(source.as_str()), Some(source));
        }
    }

    #[test]
    fn test_export_spellings() {
        assert_eq!(KnowledgeSource::from_name("OncoKB"), Some(KnowledgeSource::OncoKb));
        assert_eq!(KnowledgeSource::from_name("ClinVar"), Some(KnowledgeSource::ClinVar));
        assert_eq!(KnowledgeSource::from_name("gnomAD"), Some(KnowledgeSource::Gnomad));
        assert!(KnowledgeSource::from_name("myvariant").is_none());
    }

    #[test]
    fn test_population_kind() {
        assert_eq!(KnowledgeSource::Gnomad.kind(), SourceKind::PopulationFrequency);
    }
}
