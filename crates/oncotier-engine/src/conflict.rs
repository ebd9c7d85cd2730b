//! Detection and resolution of contradictory evidence.
//!
//! Two kinds of conflict matter for tiering:
//! - oncogenicity: strong oncogenic and strong benign VICC criteria together
//! - response: sensitivity and resistance claims for the same therapy in the
//!   same actionability context
//!
//! A response conflict resolves to the dominant side when the net
//! confidence clears the inclusion floor; anything else stays uncertain and
//! the context is tiered as Tier III.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use oncotier_common::confidence::contradictory_confidence;
use oncotier_common::{ActionabilityContext, Evidence, EvidencePayload, Response};

use crate::vicc::ViccScoring;

/// Net confidence below which a conflicted claim is not used for scoring.
pub const INCLUSION_FLOOR: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Oncogenicity,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Neither side dominates; the context cannot be tiered above Tier III
    Uncertain,
    /// One side dominates and scoring proceeds with it
    Dominant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConflict {
    pub conflict_type: ConflictType,
    /// `None` for oncogenicity conflicts
    pub context: Option<ActionabilityContext>,
    /// Therapies named on both sides
    pub therapies: Vec<String>,
    pub net_confidence: f64,
    pub resolution: ConflictResolution,
    /// Side that won a dominant resolution
    pub dominant: Option<Response>,
}

/// Determine whether a conflicted claim should be included in scoring.
pub fn should_include_in_scoring(net_confidence: f64) -> bool {
    net_confidence >= INCLUSION_FLOOR
}

/// Evaluate one pair of opposing confidences.
pub fn evaluate_conflict(supporting: f64, contradicting: f64) -> (f64, ConflictResolution) {
    let net = contradictory_confidence(&[supporting, -contradicting]);
    let resolution = if should_include_in_scoring(net) {
        ConflictResolution::Dominant
    } else {
        ConflictResolution::Uncertain
    };
    (net, resolution)
}

pub fn oncogenicity_conflict(vicc: &ViccScoring) -> Option<EvidenceConflict> {
    if !vicc.conflicting {
        return None;
    }
    Some(EvidenceConflict {
        conflict_type: ConflictType::Oncogenicity,
        context: None,
        therapies: Vec::new(),
        net_confidence: 0.0,
        resolution: ConflictResolution::Uncertain,
        dominant: None,
    })
}

/// Therapies (lowercased) and confidence of one response claim.
fn response_claim(ev: &Evidence) -> Option<(ActionabilityContext, Response, BTreeSet<String>)> {
    let (context, response, therapies) = match &ev.payload {
        EvidencePayload::Biomarker(b) => (b.context, b.response, &b.therapies),
        // OncoKB sensitivity levels; resistance levels are never emitted
        EvidencePayload::OncoKbImplication(o) => (o.context, Response::Sensitivity, &o.therapies),
        _ => return None,
    };
    if response == Response::Association || therapies.is_empty() {
        return None;
    }
    Some((context, response, therapies.iter().map(|t| t.to_lowercase()).collect()))
}

/// Find sensitivity/resistance conflicts per context.
pub fn response_conflicts(evidence: &[Evidence]) -> Vec<EvidenceConflict> {
    let claims: Vec<_> = evidence
        .iter()
        .filter_map(|ev| response_claim(ev).map(|c| (c, ev.confidence)))
        .collect();

    let mut conflicts = Vec::new();
    for context in ActionabilityContext::ALL {
        let mut shared: BTreeSet<String> = BTreeSet::new();
        let (mut sensitivity, mut resistance) = (0.0_f64, 0.0_f64);
        for ((ctx_s, resp_s, th_s), conf_s) in &claims {
            if *ctx_s != context || *resp_s != Response::Sensitivity {
                continue;
            }
            for ((ctx_r, resp_r, th_r), conf_r) in &claims {
                if *ctx_r != context || *resp_r != Response::Resistance {
                    continue;
                }
                let overlap: Vec<&String> = th_s.intersection(th_r).collect();
                if overlap.is_empty() {
                    continue;
                }
                shared.extend(overlap.into_iter().cloned());
                sensitivity = sensitivity.max(*conf_s);
                resistance = resistance.max(*conf_r);
            }
        }
        if shared.is_empty() {
            continue;
        }
        let (net, resolution) = evaluate_conflict(sensitivity, resistance);
        let dominant = (resolution == ConflictResolution::Dominant).then(|| {
            if sensitivity >= resistance { Response::Sensitivity } else { Response::Resistance }
        });
        conflicts.push(EvidenceConflict {
            conflict_type: ConflictType::Response,
            context: Some(context),
            therapies: shared.into_iter().collect(),
            net_confidence: net,
            resolution,
            dominant,
        });
    }
    conflicts
}

/// All conflicts, oncogenicity first.
pub fn detect_conflicts(evidence: &[Evidence], vicc: &ViccScoring) -> Vec<EvidenceConflict> {
    let mut conflicts: Vec<EvidenceConflict> = oncogenicity_conflict(vicc).into_iter().collect();
    conflicts.extend(response_conflicts(evidence));
    conflicts
}

/// True when a context has an unresolved conflict.
pub fn is_context_uncertain(conflicts: &[EvidenceConflict], context: ActionabilityContext) -> bool {
    conflicts.iter().any(|c| {
        c.resolution == ConflictResolution::Uncertain
            && (c.conflict_type == ConflictType::Oncogenicity || c.context == Some(context))
    })
}
