//! oncotier-engine: Somatic variant tiering.
//!
//! Evidence for a variant is aggregated from the knowledge base, scored
//! under three frameworks (AMP/ASCO/CAP 2017 actionability, VICC/CGC 2022
//! oncogenicity, OncoKB levels) and, for tumor-only samples, weighed by a
//! Dynamic Somatic Confidence score that can cap the final tier.

pub mod aggregator;
pub mod cache;
pub mod conflict;
pub mod criteria;
pub mod dsc;
pub mod engine;
pub mod oncokb;
pub mod purity;
pub mod router;
pub mod strategies;
pub mod tiering;
pub mod vicc;

pub use aggregator::{AggregatedEvidence, EvidenceAggregator};
pub use cache::EvidenceCache;
pub use conflict::{ConflictResolution, ConflictType, EvidenceConflict};
pub use dsc::{DscCalculator, DynamicSomaticConfidence, ModuleOutcome};
pub use engine::{TierEngine, TierOptions};
pub use oncokb::OncoKbScoring;
pub use purity::{PurityEstimate, PurityEstimator, PurityMetadata, PurityMethod, PurpleOutput};
pub use router::{PathwayRouter, WorkflowRouter};
pub use strategies::StrategyManager;
pub use tiering::{AmpScoring, ContextTier, TierCap, TierResult};
pub use vicc::ViccScoring;
