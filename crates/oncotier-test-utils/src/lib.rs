//! Shared fixtures for oncotier tests: annotated variants, a small reference
//! knowledge base and seeded synthetic cohorts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use oncotier_common::{
    ActionabilityContext, BiomarkerEvidence, BiomarkerLevel, ClinVarSignificance, HotspotEvidence,
    InSilicoPrediction, KnowledgeSource, OncoKbLevel, OncoKbOncogenicity, PopulationFrequency,
    Prediction, Response, VariantAnnotation,
};
use oncotier_kb::{KbEntry, KbRecord, KbSnapshot, KnowledgeBase};

pub const REFERENCE_KB_VERSION: &str = "reference-2024.1";

// ── Variants ─────────────────────────────────────────────────────────────────

fn missense(gene: &str, chromosome: &str, position: u64, r: &str, a: &str, hgvs_p: &str) -> VariantAnnotation {
    let mut v = VariantAnnotation::new(gene, chromosome, position, r, a);
    v.hgvs_p = Some(hgvs_p.to_string());
    v.consequences = vec!["missense_variant".to_string()];
    v
}

/// BRAF p.Val600Glu with tumor-level VAF and depth.
pub fn braf_v600e(vaf: f64) -> VariantAnnotation {
    let mut v = missense("BRAF", "7", 140453136, "A", "T", "p.Val600Glu");
    v.hgvs_c = Some("c.1799T>A".to_string());
    v.vaf = Some(vaf);
    v.depth = Some(250);
    v
}

pub fn egfr_l858r(vaf: f64) -> VariantAnnotation {
    let mut v = missense("EGFR", "7", 55259515, "T", "G", "p.Leu858Arg");
    v.hgvs_c = Some("c.2573T>G".to_string());
    v.vaf = Some(vaf);
    v.depth = Some(150);
    v
}

pub fn kras_g12d(vaf: f64) -> VariantAnnotation {
    let mut v = missense("KRAS", "12", 25398284, "C", "T", "p.Gly12Asp");
    v.vaf = Some(vaf);
    v.depth = Some(180);
    v
}

pub fn tp53_r273c(vaf: f64) -> VariantAnnotation {
    let mut v = missense("TP53", "17", 7577121, "G", "A", "p.Arg273Cys");
    v.vaf = Some(vaf);
    v.depth = Some(140);
    v
}

/// Heterozygous germline look: VAF near 0.5, common in gnomAD and
/// pathogenic in ClinVar, yet predicted damaging.
pub fn germline_like(vaf: f64) -> VariantAnnotation {
    let mut v = missense("CHEK2", "22", 29121087, "A", "G", "p.Ile157Thr");
    v.vaf = Some(vaf);
    v.depth = Some(200);
    v.population_frequencies.push(PopulationFrequency {
        database: "gnomAD".to_string(),
        population: None,
        allele_frequency: 0.02,
    });
    v.clinvar = Some(ClinVarSignificance::Pathogenic);
    v.predictions.push(InSilicoPrediction {
        tool: "REVEL".to_string(),
        prediction: Prediction::Damaging,
        score: Some(0.81),
    });
    v
}

/// A missense change in a gene no source has curated.
pub fn obscure(vaf: f64) -> VariantAnnotation {
    let mut v = missense("ZNF717", "3", 75786052, "C", "T", "p.Gln400Arg");
    v.vaf = Some(vaf);
    v.depth = Some(90);
    v
}

// ── Reference knowledge base ─────────────────────────────────────────────────

fn biomarker(
    context: ActionabilityContext,
    level: BiomarkerLevel,
    therapies: &[&str],
    fda_approved: bool,
    guideline: bool,
    response: Response,
) -> KbRecord {
    KbRecord::Biomarker(BiomarkerEvidence {
        context,
        level,
        therapies: therapies.iter().map(|t| t.to_string()).collect(),
        fda_approved,
        guideline,
        response,
    })
}

fn oncokb(level: Option<OncoKbLevel>, therapies: &[&str], fda_approved: bool) -> KbRecord {
    KbRecord::OncoKb {
        level,
        context: ActionabilityContext::Therapeutic,
        therapies: therapies.iter().map(|t| t.to_string()).collect(),
        oncogenicity: Some(OncoKbOncogenicity::Oncogenic),
        fda_approved,
    }
}

fn domain(name: &str, start: u32, end: u32) -> KbRecord {
    KbRecord::FunctionalDomain { name: name.to_string(), start, end, critical: true }
}

fn absent_in_gnomad() -> KbRecord {
    KbRecord::PopulationFrequency { database: "gnomAD".to_string(), allele_frequency: 0.0 }
}

fn oncogene() -> KbRecord {
    KbRecord::GeneRole { oncogene: true, tumor_suppressor: false }
}

fn tumor_suppressor() -> KbRecord {
    KbRecord::GeneRole { oncogene: false, tumor_suppressor: true }
}

pub fn reference_entries() -> Vec<(KnowledgeSource, KbEntry)> {
    use ActionabilityContext::*;
    use KnowledgeSource::*;

    vec![
        // BRAF
        (
            Fda,
            KbEntry::new("BRAF", biomarker(Therapeutic, BiomarkerLevel::A, &["Dabrafenib", "Trametinib"], true, false, Response::Sensitivity))
                .alteration("V600E")
                .cancer_types(&["Melanoma"]),
        ),
        (
            Nccn,
            KbEntry::new("BRAF", biomarker(Therapeutic, BiomarkerLevel::A, &["Vemurafenib", "Cobimetinib"], false, true, Response::Sensitivity))
                .alteration("V600E")
                .cancer_types(&["Melanoma"]),
        ),
        (
            OncoKb,
            KbEntry::new("BRAF", oncokb(Some(OncoKbLevel::Level1), &["Dabrafenib", "Trametinib"], true))
                .alteration("V600E")
                .cancer_types(&["Melanoma"]),
        ),
        (
            Civic,
            KbEntry::new("BRAF", biomarker(Therapeutic, BiomarkerLevel::B, &["Encorafenib", "Cetuximab"], false, false, Response::Sensitivity))
                .alteration("V600E")
                .cancer_types(&["Colorectal Cancer"]),
        ),
        (
            Civic,
            KbEntry::new("BRAF", KbRecord::Oncogenic { oncogenic: true, functional_study: true }).alteration("V600E"),
        ),
        (
            CancerHotspots,
            KbEntry::new("BRAF", KbRecord::Hotspot { position_samples: 897, alt_samples: 833 }).alteration("V600E"),
        ),
        (UniProt, KbEntry::new("BRAF", domain("Protein kinase", 457, 717))),
        (Gnomad, KbEntry::new("BRAF", absent_in_gnomad()).alteration("V600E")),
        (
            DbNsfp,
            KbEntry::new("BRAF", KbRecord::Computational { tool: "REVEL".to_string(), prediction: Prediction::Damaging, score: Some(0.93) })
                .alteration("V600E"),
        ),
        (CancerGeneCensus, KbEntry::new("BRAF", oncogene())),
        // EGFR
        (
            Fda,
            KbEntry::new("EGFR", biomarker(Therapeutic, BiomarkerLevel::A, &["Osimertinib"], true, false, Response::Sensitivity))
                .alteration("L858R")
                .cancer_types(&["Non-Small Cell Lung Cancer"]),
        ),
        (
            OncoKb,
            KbEntry::new("EGFR", oncokb(Some(OncoKbLevel::Level1), &["Osimertinib", "Erlotinib"], true))
                .alteration("L858R")
                .cancer_types(&["Non-Small Cell Lung Cancer"]),
        ),
        (
            Civic,
            KbEntry::new("EGFR", KbRecord::Oncogenic { oncogenic: true, functional_study: true }).alteration("L858R"),
        ),
        (UniProt, KbEntry::new("EGFR", domain("Protein kinase", 712, 979))),
        (Gnomad, KbEntry::new("EGFR", absent_in_gnomad()).alteration("L858R")),
        (CancerGeneCensus, KbEntry::new("EGFR", oncogene())),
        // KRAS
        (
            OncoKb,
            KbEntry::new("KRAS", oncokb(Some(OncoKbLevel::Level1), &["Sotorasib", "Adagrasib"], true))
                .alteration("G12C")
                .cancer_types(&["Non-Small Cell Lung Cancer"]),
        ),
        (
            OncoKb,
            KbEntry::new("KRAS", oncokb(None, &[], false)).alteration("G12D"),
        ),
        (
            Civic,
            KbEntry::new("KRAS", biomarker(Therapeutic, BiomarkerLevel::A, &["Cetuximab", "Panitumumab"], false, true, Response::Resistance))
                .alteration("Mutations")
                .cancer_types(&["Colorectal Cancer"]),
        ),
        (
            CancerHotspots,
            KbEntry::new("KRAS", KbRecord::Hotspot { position_samples: 3547, alt_samples: 1290 }).alteration("G12D"),
        ),
        (CancerGeneCensus, KbEntry::new("KRAS", oncogene())),
        // TP53
        (
            Civic,
            KbEntry::new("TP53", biomarker(Prognostic, BiomarkerLevel::B, &[], false, false, Response::Association))
                .alteration("Mutations")
                .cancer_types(&["Chronic Lymphocytic Leukemia"]),
        ),
        (
            Civic,
            KbEntry::new("TP53", KbRecord::Oncogenic { oncogenic: true, functional_study: true }).alteration("R273H"),
        ),
        (UniProt, KbEntry::new("TP53", domain("DNA-binding", 102, 292))),
        (CancerGeneCensus, KbEntry::new("TP53", tumor_suppressor())),
        (
            ClinVar,
            KbEntry::new("TP53", KbRecord::SingleEtiology).cancer_types(&["Adrenocortical Carcinoma", "Choroid Plexus Carcinoma"]),
        ),
        // CHEK2
        (
            Cgi,
            KbEntry::new("CHEK2", KbRecord::Oncogenic { oncogenic: true, functional_study: false }).alteration("I157T"),
        ),
        (
            ClinVar,
            KbEntry::new("CHEK2", KbRecord::Germline { significance: ClinVarSignificance::Pathogenic }).alteration("I157T"),
        ),
        (CancerGeneCensus, KbEntry::new("CHEK2", tumor_suppressor())),
    ]
}

pub fn reference_snapshot() -> KbSnapshot {
    KbSnapshot::from_entries(REFERENCE_KB_VERSION, reference_entries())
}

pub fn reference_kb() -> KnowledgeBase {
    reference_snapshot().into_knowledge_base()
}

/// The reference snapshot in its on-disk JSON shape.
pub fn reference_snapshot_json() -> String {
    let mut sources = serde_json::Map::new();
    for (source, entry) in reference_entries() {
        let list = sources
            .entry(source.as_str().to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(items) = list {
            items.push(serde_json::to_value(&entry).expect("entry serialises"));
        }
    }
    serde_json::json!({ "version": REFERENCE_KB_VERSION, "sources": sources }).to_string()
}

// ── Synthetic cohorts ────────────────────────────────────────────────────────

/// `n` heterozygous clonal variants with VAFs clustered at `purity / 2`.
/// Each carries a hotspot annotation so it also qualifies in tumor-only mode.
pub fn synthetic_cohort(purity: f64, n: usize, seed: u64) -> Vec<VariantAnnotation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let mut v = VariantAnnotation::new(format!("GENE{}", i), "1", 1_000_000 + i as u64 * 1000, "C", "T");
            v.consequences = vec!["missense_variant".to_string()];
            let noise: f64 = rng.gen_range(-0.02..0.02);
            v.vaf = Some((purity / 2.0 + noise).clamp(0.0, 1.0));
            v.depth = Some(rng.gen_range(120..400));
            v.hotspots.push(HotspotEvidence {
                source: "cancerhotspots".to_string(),
                position_samples: 60,
                alt_samples: 20,
                cancer_types: Vec::new(),
            });
            v
        })
        .collect()
}

/// Common germline polymorphisms: VAF near 0.5, high population frequency.
pub fn germline_noise(n: usize, seed: u64) -> Vec<VariantAnnotation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let mut v = VariantAnnotation::new(format!("SNP{}", i), "2", 2_000_000 + i as u64 * 500, "G", "A");
            v.vaf = Some(0.5 + rng.gen_range(-0.03..0.03));
            v.depth = Some(rng.gen_range(80..200));
            v.population_frequencies.push(PopulationFrequency {
                database: "gnomAD".to_string(),
                population: None,
                allele_frequency: rng.gen_range(0.05..0.4),
            });
            v
        })
        .collect()
}
