//! Conversion of knowledge-base hits and variant annotations into evidence,
//! including derivation of the VICC/CGC 2022 oncogenicity criteria.
//!
//! Three passes feed the aggregator:
//! 1. per-hit evidence (biomarkers, OncoKB levels, OS1/OS2/SBS2/OM1/OM3/OP2),
//! 2. evidence carried on the variant itself (hotspots, population, ClinVar),
//! 3. criteria that need facts from several sources (OVS1, OM2, OS3/OM4/OP3,
//!    OP1/SBP1, OP4, SBVS1/SBS1, SBP2).

use oncotier_common::hgvs::normalise_protein_change;
use oncotier_common::{
    ActionabilityContext, BiomarkerEvidence, CancerMatch, Evidence, EvidencePayload,
    GuidelineFamily, KnowledgeSource, MatchLevel, MatchProvenance, OncoKbImplication,
    OncoKbLevel, Prediction, Response, VariantAnnotation, ViccCriterion,
};
use oncotier_config::{HotspotThresholds, ThresholdTable};
use oncotier_kb::{cancer_type_matches, KbHit, KbRecord};

/// Everything criteria derivation depends on besides the hits.
#[derive(Debug, Clone, Copy)]
pub struct CriteriaInput<'a> {
    pub variant: &'a VariantAnnotation,
    pub cancer_type: Option<&'a str>,
    pub thresholds: &'a ThresholdTable,
}

/// Gene-wide alteration labels that apply to a specific variant.
const ANY_MUTATION_LABELS: &[&str] = &["oncogenic mutations", "mutations", "all mutations"];

pub fn build_evidence(input: CriteriaInput<'_>, hits: &[KbHit]) -> Vec<Evidence> {
    let mut evidence: Vec<Evidence> = hits.iter().flat_map(|h| hit_evidence(input, h)).collect();
    evidence.extend(variant_evidence(input));
    evidence.extend(derived_criteria(input, hits));
    evidence
}

// ── Pass 1: per-hit evidence ─────────────────────────────────────────────────

fn is_variant_specific(level: MatchLevel) -> bool {
    matches!(level, MatchLevel::Exact | MatchLevel::ShortForm)
}

fn provenance(hit: &KbHit) -> MatchProvenance {
    MatchProvenance { match_level: hit.match_level, cancer_match: hit.cancer_match }
}

fn provenance_not_applicable(hit: &KbHit) -> MatchProvenance {
    MatchProvenance { match_level: hit.match_level, cancer_match: CancerMatch::NotApplicable }
}

/// Whether a gene-level record ("Oncogenic Mutations", "Truncating Mutations",
/// ...) covers this variant.
fn gene_wide_applies(label: Option<&str>, variant: &VariantAnnotation) -> bool {
    let Some(label) = label else { return true };
    let label = label.trim().to_lowercase();
    if ANY_MUTATION_LABELS.contains(&label.as_str()) {
        return true;
    }
    match label.as_str() {
        "truncating mutations" => variant.is_null_variant(),
        "missense mutations" => variant.is_missense(),
        _ => false,
    }
}

fn context_code(context: ActionabilityContext) -> &'static str {
    match context {
        ActionabilityContext::Therapeutic => "TX",
        ActionabilityContext::Diagnostic => "DX",
        ActionabilityContext::Prognostic => "PX",
    }
}

fn biomarker_code(b: &BiomarkerEvidence) -> String {
    let base = if b.fda_approved && b.context == ActionabilityContext::Therapeutic {
        "FDA_APPROVED".to_string()
    } else if b.guideline {
        format!("GUIDELINE_{}", context_code(b.context))
    } else {
        format!("{}_LEVEL_{:?}", context_code(b.context), b.level)
    };
    match b.response {
        Response::Resistance => format!("{}_RESISTANCE", base),
        _ => base,
    }
}

fn biomarker_confidence(b: &BiomarkerEvidence) -> f64 {
    use oncotier_common::BiomarkerLevel::*;
    if b.fda_approved || b.guideline {
        return 0.95;
    }
    match b.level {
        A => 0.95,
        B => 0.85,
        C => 0.7,
        D => 0.5,
        E => 0.4,
    }
}

fn oncokb_level_confidence(level: OncoKbLevel) -> f64 {
    match level {
        OncoKbLevel::Level1 => 0.95,
        OncoKbLevel::Level2 => 0.9,
        OncoKbLevel::Level3A => 0.8,
        OncoKbLevel::Level3B => 0.7,
        OncoKbLevel::Level4 => 0.5,
    }
}

fn oncokb_level_code(context: ActionabilityContext, level: OncoKbLevel) -> String {
    format!(
        "ONCOKB_{}_{}",
        context_code(context),
        level.label().to_uppercase().replace(' ', "_")
    )
}

fn criterion(
    c: ViccCriterion,
    source: KnowledgeSource,
    provenance: MatchProvenance,
    confidence: f64,
    description: String,
) -> Evidence {
    Evidence::criterion(c, source, provenance)
        .with_confidence(confidence)
        .with_description(description)
}

fn hit_evidence(input: CriteriaInput<'_>, hit: &KbHit) -> Vec<Evidence> {
    let variant = input.variant;
    let specific = is_variant_specific(hit.match_level);
    let mut out = Vec::new();

    match &hit.record {
        KbRecord::Biomarker(b) => {
            if specific || gene_wide_applies(hit.alteration.as_deref(), variant) {
                out.push(
                    Evidence::new(
                        biomarker_code(b),
                        hit.source,
                        GuidelineFamily::Amp2017,
                        EvidencePayload::Biomarker(b.clone()),
                        provenance(hit),
                    )
                    .with_confidence(biomarker_confidence(b))
                    .with_description(format!(
                        "{} {} level {:?} ({})",
                        variant.gene,
                        b.context.as_str(),
                        b.level,
                        if b.therapies.is_empty() { "-".to_string() } else { b.therapies.join(", ") }
                    )),
                );
            }
        }
        KbRecord::OncoKb { level, context, therapies, oncogenicity, fda_approved } => {
            if !specific && !gene_wide_applies(hit.alteration.as_deref(), variant) {
                return out;
            }
            if let Some(level) = level {
                out.push(
                    Evidence::new(
                        oncokb_level_code(*context, *level),
                        hit.source,
                        GuidelineFamily::OncoKb,
                        EvidencePayload::OncoKbImplication(OncoKbImplication {
                            context: *context,
                            level: *level,
                            therapies: therapies.clone(),
                            fda_approved: *fda_approved,
                        }),
                        provenance(hit),
                    )
                    .with_confidence(oncokb_level_confidence(*level))
                    .with_description(format!("OncoKB {} {}", context.as_str(), level.label())),
                );
            }
            if let (Some(o), true) = (oncogenicity.as_ref().filter(|o| o.is_curated()), specific) {
                out.push(
                    Evidence::new(
                        "ONCOKB_ONCOGENICITY",
                        hit.source,
                        GuidelineFamily::OncoKb,
                        EvidencePayload::OncoKbOncogenicity { oncogenicity: *o },
                        provenance_not_applicable(hit),
                    )
                    .with_confidence(0.9)
                    .with_description(format!("OncoKB oncogenicity: {:?}", o)),
                );
                if o.is_oncogenic() {
                    out.push(criterion(
                        ViccCriterion::Os1,
                        hit.source,
                        provenance_not_applicable(hit),
                        0.9,
                        "Same amino-acid change curated as oncogenic in OncoKB".to_string(),
                    ));
                }
            }
        }
        KbRecord::Oncogenic { oncogenic, functional_study } => {
            if specific {
                if *oncogenic {
                    out.push(criterion(
                        ViccCriterion::Os1,
                        hit.source,
                        provenance_not_applicable(hit),
                        0.9,
                        "Same amino-acid change as an established oncogenic variant".to_string(),
                    ));
                }
                if *functional_study {
                    let (c, text) = if *oncogenic {
                        (ViccCriterion::Os2, "Functional studies support an oncogenic effect")
                    } else {
                        (ViccCriterion::Sbs2, "Functional studies show no oncogenic effect")
                    };
                    out.push(criterion(c, hit.source, provenance_not_applicable(hit), 0.85, text.to_string()));
                }
            } else if *oncogenic && variant.is_missense() {
                if let Some(om3) = same_residue_oncogenic(variant, hit) {
                    out.push(om3);
                }
            }
        }
        KbRecord::FunctionalDomain { name, start, end, critical } => {
            let in_domain = variant
                .hgvs_p
                .as_deref()
                .and_then(oncotier_common::hgvs::protein_position)
                .is_some_and(|pos| (*start..=*end).contains(&pos));
            if *critical && in_domain && (variant.is_missense() || variant.is_length_changing()) {
                out.push(criterion(
                    ViccCriterion::Om1,
                    hit.source,
                    provenance_not_applicable(hit),
                    0.8,
                    format!("Located in critical functional domain {} ({}-{})", name, start, end),
                ));
            }
        }
        KbRecord::Hotspot { position_samples, alt_samples } if specific => {
            out.push(
                Evidence::new(
                    "HOTSPOT",
                    hit.source,
                    GuidelineFamily::SomaticOrigin,
                    EvidencePayload::Hotspot {
                        position_samples: *position_samples,
                        alt_samples: *alt_samples,
                    },
                    provenance(hit),
                )
                .with_confidence(0.9)
                .with_description(format!(
                    "Recurrent hotspot: {} samples at residue, {} with this change",
                    position_samples, alt_samples
                )),
            );
        }
        KbRecord::PopulationFrequency { database, allele_frequency } if specific => {
            out.push(population_evidence(hit.source, database, *allele_frequency, provenance_not_applicable(hit)));
        }
        KbRecord::Germline { significance } if specific => {
            out.push(
                Evidence::new(
                    "CLINVAR_GERMLINE",
                    hit.source,
                    GuidelineFamily::SomaticOrigin,
                    EvidencePayload::Germline { significance: *significance },
                    provenance_not_applicable(hit),
                )
                .with_confidence(0.9)
                .with_description(format!("ClinVar germline classification: {:?}", significance)),
            );
        }
        KbRecord::SingleEtiology => {
            let matches_query = input
                .cancer_type
                .is_some_and(|ct| hit.cancer_types.iter().any(|c| cancer_type_matches(c, ct)));
            if matches_query {
                out.push(criterion(
                    ViccCriterion::Op2,
                    hit.source,
                    provenance(hit),
                    0.7,
                    format!("{} has a single genetic etiology for this malignancy", variant.gene),
                ));
            }
        }
        // Variant-specific facts matched only at gene level, plus facts folded
        // into the derived pass
        KbRecord::Hotspot { .. }
        | KbRecord::PopulationFrequency { .. }
        | KbRecord::Germline { .. }
        | KbRecord::Computational { .. }
        | KbRecord::GeneRole { .. } => {}
    }
    out
}

/// OM3: a different missense change at a residue with an established
/// oncogenic missense variant.
fn same_residue_oncogenic(variant: &VariantAnnotation, hit: &KbHit) -> Option<Evidence> {
    let own = variant.protein_change()?;
    let known = normalise_protein_change(hit.alteration.as_deref()?)?;
    if known.position != own.position || known == own || known.is_nonsense() || known.is_synonymous() {
        return None;
    }
    Some(criterion(
        ViccCriterion::Om3,
        hit.source,
        provenance_not_applicable(hit),
        0.8,
        format!("Different missense at residue of established oncogenic {}", known.short_form),
    ))
}

fn population_evidence(
    source: KnowledgeSource,
    database: &str,
    allele_frequency: f64,
    provenance: MatchProvenance,
) -> Evidence {
    Evidence::new(
        format!("POPULATION_AF_{}", database.to_uppercase()),
        source,
        GuidelineFamily::SomaticOrigin,
        EvidencePayload::PopulationFrequency {
            database: database.to_string(),
            allele_frequency,
        },
        provenance,
    )
    .with_confidence(0.95)
    .with_description(format!("{} allele frequency {}", database, allele_frequency))
}

// ── Pass 2: annotations carried on the variant ───────────────────────────────

fn variant_evidence(input: CriteriaInput<'_>) -> Vec<Evidence> {
    let variant = input.variant;
    let mut out = Vec::new();
    for h in &variant.hotspots {
        let source = KnowledgeSource::from_name(&h.source).unwrap_or(KnowledgeSource::CancerHotspots);
        out.push(
            Evidence::new(
                "HOTSPOT",
                source,
                GuidelineFamily::SomaticOrigin,
                EvidencePayload::Hotspot {
                    position_samples: h.position_samples,
                    alt_samples: h.alt_samples,
                },
                MatchProvenance::from_variant(),
            )
            .with_confidence(0.9)
            .with_description(format!("Annotated hotspot ({})", h.source)),
        );
    }
    for p in &variant.population_frequencies {
        out.push(population_evidence(
            KnowledgeSource::Gnomad,
            &p.database,
            p.allele_frequency,
            MatchProvenance::from_variant(),
        ));
    }
    if let Some(significance) = variant.clinvar {
        out.push(
            Evidence::new(
                "CLINVAR_GERMLINE",
                KnowledgeSource::ClinVar,
                GuidelineFamily::SomaticOrigin,
                EvidencePayload::Germline { significance },
                MatchProvenance::from_variant(),
            )
            .with_confidence(0.9)
            .with_description(format!("Annotated ClinVar classification: {:?}", significance)),
        );
    }
    out
}

// ── Pass 3: criteria combining several sources ───────────────────────────────

/// Hotspot criterion for one observation: OS3, OM4 or OP3.
pub fn hotspot_criterion(position_samples: u32, alt_samples: u32, t: &HotspotThresholds) -> ViccCriterion {
    if position_samples >= t.strong_position_samples && alt_samples >= t.min_alt_samples {
        ViccCriterion::Os3
    } else if alt_samples >= t.min_alt_samples {
        ViccCriterion::Om4
    } else {
        ViccCriterion::Op3
    }
}

/// A hotspot counts only when its tumor types overlap the query tumor type.
fn hotspot_overlaps(cancer_types: &[String], cancer_type: Option<&str>) -> bool {
    let Some(ct) = cancer_type else { return true };
    cancer_types.is_empty()
        || cancer_types
            .iter()
            .any(|c| c.eq_ignore_ascii_case("all tumors") || cancer_type_matches(c, ct))
}

fn derived_criteria(input: CriteriaInput<'_>, hits: &[KbHit]) -> Vec<Evidence> {
    let variant = input.variant;
    let t = input.thresholds;
    let specific_hits = || hits.iter().filter(|h| is_variant_specific(h.match_level));
    let mut out = Vec::new();

    // Gene role
    let (mut is_oncogene, mut is_tsg) = (variant.is_oncogene, variant.is_tumor_suppressor);
    for hit in hits {
        if let KbRecord::GeneRole { oncogene, tumor_suppressor } = hit.record {
            is_oncogene |= oncogene;
            is_tsg |= tumor_suppressor;
        }
    }
    if variant.is_null_variant() && is_tsg {
        out.push(criterion(
            ViccCriterion::Ovs1,
            KnowledgeSource::Vep,
            MatchProvenance::from_variant(),
            0.95,
            format!("Null variant in tumor suppressor {}", variant.gene),
        ));
    } else if variant.is_length_changing() && (is_oncogene || is_tsg) {
        out.push(criterion(
            ViccCriterion::Om2,
            KnowledgeSource::Vep,
            MatchProvenance::from_variant(),
            0.8,
            format!("Protein length change in {} {}", if is_tsg { "tumor suppressor" } else { "oncogene" }, variant.gene),
        ));
    }

    // Hotspots: strongest qualifying observation only
    let mut hotspot: Option<(ViccCriterion, KnowledgeSource, MatchProvenance)> = None;
    let observations = specific_hits()
        .filter_map(|h| match h.record {
            KbRecord::Hotspot { position_samples, alt_samples }
                if hotspot_overlaps(&h.cancer_types, input.cancer_type) =>
            {
                Some((position_samples, alt_samples, h.source, provenance(h)))
            }
            _ => None,
        })
        .chain(variant.hotspots.iter().filter_map(|h| {
            hotspot_overlaps(&h.cancer_types, input.cancer_type).then(|| {
                (
                    h.position_samples,
                    h.alt_samples,
                    KnowledgeSource::from_name(&h.source).unwrap_or(KnowledgeSource::CancerHotspots),
                    MatchProvenance::from_variant(),
                )
            })
        }));
    for (position_samples, alt_samples, source, prov) in observations {
        let c = hotspot_criterion(position_samples, alt_samples, &t.hotspot);
        if hotspot.as_ref().map_or(true, |(best, _, _)| c.points() > best.points()) {
            hotspot = Some((c, source, prov));
        }
    }
    if let Some((c, source, prov)) = hotspot {
        out.push(criterion(c, source, prov, 0.9, format!("Cancer hotspot ({})", c.code())));
    }

    // Computational predictors: all must agree
    let predictions: Vec<Prediction> = variant
        .predictions
        .iter()
        .map(|p| p.prediction)
        .chain(specific_hits().filter_map(|h| match h.record {
            KbRecord::Computational { prediction, .. } => Some(prediction),
            _ => None,
        }))
        .collect();
    if !predictions.is_empty() {
        if predictions.iter().all(|p| *p == Prediction::Damaging) {
            out.push(criterion(
                ViccCriterion::Op1,
                KnowledgeSource::DbNsfp,
                MatchProvenance::from_variant(),
                0.6,
                format!("All {} computational predictors damaging", predictions.len()),
            ));
        } else if predictions.iter().all(|p| *p == Prediction::Benign) {
            out.push(criterion(
                ViccCriterion::Sbp1,
                KnowledgeSource::DbNsfp,
                MatchProvenance::from_variant(),
                0.6,
                format!("All {} computational predictors benign", predictions.len()),
            ));
        }
    }

    // Population frequency
    let frequencies: Vec<f64> = variant
        .population_frequencies
        .iter()
        .map(|p| p.allele_frequency)
        .chain(specific_hits().filter_map(|h| match h.record {
            KbRecord::PopulationFrequency { allele_frequency, .. } => Some(allele_frequency),
            _ => None,
        }))
        .collect();
    if !frequencies.is_empty() {
        let max_af = frequencies.iter().copied().fold(0.0_f64, f64::max);
        let popt = &t.population;
        let benign = if max_af > popt.very_strong_benign_af {
            Some(ViccCriterion::Sbvs1)
        } else if max_af > popt.strong_benign_af {
            Some(ViccCriterion::Sbs1)
        } else {
            None
        };
        if let Some(c) = benign {
            out.push(criterion(
                c,
                KnowledgeSource::Gnomad,
                MatchProvenance::from_variant(),
                0.95,
                format!("Population allele frequency {}", max_af),
            ));
        } else if max_af <= 0.0 {
            out.push(criterion(
                ViccCriterion::Op4,
                KnowledgeSource::Gnomad,
                MatchProvenance::from_variant(),
                0.9,
                "Absent from population databases".to_string(),
            ));
        }
    }

    if variant.is_synonymous() && !variant.has_splice_impact() {
        out.push(criterion(
            ViccCriterion::Sbp2,
            KnowledgeSource::Vep,
            MatchProvenance::from_variant(),
            0.8,
            "Synonymous variant without predicted splice impact".to_string(),
        ));
    }
    out
}
