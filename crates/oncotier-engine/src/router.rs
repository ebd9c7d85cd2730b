//! Workflow routing: pathway-specific evidence weights and VAF filters.

use oncotier_common::{AnalysisType, KnowledgeSource};
use oncotier_config::{EngineConfig, PathwayWeights, VafThresholds};

/// Exposes the pathway adjustments the aggregator and DSC calculator need.
pub trait WorkflowRouter: Send + Sync {
    fn analysis_type(&self) -> AnalysisType;

    /// Multiplier applied to the score and confidence of evidence from `source`.
    fn get_evidence_weight(&self, source: KnowledgeSource) -> f64;

    fn vaf_thresholds(&self) -> &VafThresholds;
}

/// Router backed by the configured weight tables.
#[derive(Debug, Clone)]
pub struct PathwayRouter {
    analysis_type: AnalysisType,
    weights: PathwayWeights,
    vaf: VafThresholds,
}

impl PathwayRouter {
    pub fn new(analysis_type: AnalysisType, weights: PathwayWeights, vaf: VafThresholds) -> Self {
        Self { analysis_type, weights, vaf }
    }

    pub fn from_config(config: &EngineConfig, analysis_type: AnalysisType) -> Self {
        Self::new(analysis_type, config.weights.clone(), config.vaf.clone())
    }
}

impl WorkflowRouter for PathwayRouter {
    fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    fn get_evidence_weight(&self, source: KnowledgeSource) -> f64 {
        self.weights.weight_for(self.analysis_type, source)
    }

    fn vaf_thresholds(&self) -> &VafThresholds {
        &self.vaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_resolves_pathway_weight() {
        let config = EngineConfig::default();
        let to = PathwayRouter::from_config(&config, AnalysisType::TumorOnly);
        let tn = PathwayRouter::from_config(&config, AnalysisType::TumorNormal);
        assert_eq!(to.analysis_type(), AnalysisType::TumorOnly);
        assert!(to.get_evidence_weight(KnowledgeSource::ClinVar) > tn.get_evidence_weight(KnowledgeSource::ClinVar));
        assert_eq!(to.get_evidence_weight(KnowledgeSource::Fda), tn.get_evidence_weight(KnowledgeSource::Fda));
        assert_eq!(to.vaf_thresholds().min_depth, 20);
    }
}
