//! Pathway-specific evidence weights.
//!
//! Tumor-only analysis has no matched normal to remove germline calls, so
//! population-frequency and germline-pathogenicity sources carry far more
//! weight there than in tumor-normal analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use oncotier_common::{AnalysisType, KnowledgeSource};

/// One weight table per analysis pathway, keyed by source name
/// (see `KnowledgeSource::as_str`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayWeights {
    #[serde(default = "default_tumor_only")]
    pub tumor_only: BTreeMap<String, f64>,
    #[serde(default = "default_tumor_normal")]
    pub tumor_normal: BTreeMap<String, f64>,
    /// Weight for sources missing from the table
    #[serde(default = "default_weight")]
    pub default_weight: f64,
}

fn default_weight() -> f64 { 1.0 }

fn table(entries: &[(KnowledgeSource, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(s, w)| (s.as_str().to_string(), *w)).collect()
}

fn default_tumor_only() -> BTreeMap<String, f64> {
    table(&[
        (KnowledgeSource::Fda, 1.0),
        (KnowledgeSource::Nccn, 1.0),
        (KnowledgeSource::OncoKb, 1.0),
        (KnowledgeSource::Civic, 0.9),
        (KnowledgeSource::Cgi, 0.9),
        (KnowledgeSource::CancerHotspots, 1.0),
        (KnowledgeSource::Cosmic, 0.9),
        (KnowledgeSource::Gnomad, 1.0),
        (KnowledgeSource::ClinVar, 0.9),
        (KnowledgeSource::DbNsfp, 0.7),
        (KnowledgeSource::UniProt, 0.8),
        (KnowledgeSource::CancerGeneCensus, 0.9),
        (KnowledgeSource::Vep, 1.0),
    ])
}

fn default_tumor_normal() -> BTreeMap<String, f64> {
    table(&[
        (KnowledgeSource::Fda, 1.0),
        (KnowledgeSource::Nccn, 1.0),
        (KnowledgeSource::OncoKb, 1.0),
        (KnowledgeSource::Civic, 0.9),
        (KnowledgeSource::Cgi, 0.9),
        (KnowledgeSource::CancerHotspots, 1.0),
        (KnowledgeSource::Cosmic, 0.9),
        (KnowledgeSource::Gnomad, 0.25),
        (KnowledgeSource::ClinVar, 0.3),
        (KnowledgeSource::DbNsfp, 0.7),
        (KnowledgeSource::UniProt, 0.8),
        (KnowledgeSource::CancerGeneCensus, 0.9),
        (KnowledgeSource::Vep, 1.0),
    ])
}

impl Default for PathwayWeights {
    fn default() -> Self {
        Self {
            tumor_only: default_tumor_only(),
            tumor_normal: default_tumor_normal(),
            default_weight: default_weight(),
        }
    }
}

impl PathwayWeights {
    pub fn table(&self, analysis: AnalysisType) -> &BTreeMap<String, f64> {
        match analysis {
            AnalysisType::TumorOnly => &self.tumor_only,
            AnalysisType::TumorNormal => &self.tumor_normal,
        }
    }

    /// Resolved weight for a source in a pathway.
    pub fn weight_for(&self, analysis: AnalysisType, source: KnowledgeSource) -> f64 {
        self.table(analysis)
            .get(source.as_str())
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Validate that every key names a known source and every weight is
    /// a finite non-negative number.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (pathway, table) in [("tumor_only", &self.tumor_only), ("tumor_normal", &self.tumor_normal)] {
            for (name, weight) in table {
                if KnowledgeSource::from_name(name).is_none() {
                    problems.push(format!("weights.{}: unknown source `{}`", pathway, name));
                }
                if !weight.is_finite() || *weight < 0.0 {
                    problems.push(format!("weights.{}.{} must be non-negative (got {})", pathway, name, weight));
                }
            }
        }
        if !self.default_weight.is_finite() || self.default_weight < 0.0 {
            problems.push(format!("weights.default_weight must be non-negative (got {})", self.default_weight));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_weighted_heavier_in_tumor_only() {
        let w = PathwayWeights::default();
        let to = w.weight_for(AnalysisType::TumorOnly, KnowledgeSource::Gnomad);
        let tn = w.weight_for(AnalysisType::TumorNormal, KnowledgeSource::Gnomad);
        assert!(to > 2.0 * tn, "tumor-only gnomAD weight {} should dominate {}", to, tn);
    }

    #[test]
    fn test_missing_source_uses_default_weight() {
        let mut w = PathwayWeights::default();
        w.tumor_only.remove("cosmic");
        w.default_weight = 0.5;
        assert_eq!(w.weight_for(AnalysisType::TumorOnly, KnowledgeSource::Cosmic), 0.5);
    }

    #[test]
    fn test_unknown_source_key_is_a_problem() {
        let mut w = PathwayWeights::default();
        w.tumor_normal.insert("myvariant".to_string(), 1.0);
        w.tumor_only.insert("gnomad".to_string(), -1.0);
        let problems = w.problems();
        assert_eq!(problems.len(), 2, "{:?}", problems);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(PathwayWeights::default().problems().is_empty());
    }
}
