//! HGVS protein-change normalisation.
//!
//! Maps the notations seen in VEP output and KB exports ("p.Val600Glu",
//! "ENSP00000288602.6:p.Val600Glu", "p.(V600E)", "V600E", "R213*") onto a
//! single structured form carrying both the three-letter and the one-letter
//! short form used by the match cascade.
//!
//! # Example
//! ```
//! use oncotier_common::hgvs::normalise_protein_change;
//! let pc = normalise_protein_change("p.Val600Glu").unwrap();
//! assert_eq!(pc.short_form, "V600E");
//! assert_eq!(pc.position, 600);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Single-letter → three-letter amino acid map.
fn aa1_to_aa3(aa: &str) -> Option<&'static str> {
    match aa.to_uppercase().as_str() {
        "A" => Some("Ala"), "C" => Some("Cys"), "D" => Some("Asp"),
        "E" => Some("Glu"), "F" => Some("Phe"), "G" => Some("Gly"),
        "H" => Some("His"), "I" => Some("Ile"), "K" => Some("Lys"),
        "L" => Some("Leu"), "M" => Some("Met"), "N" => Some("Asn"),
        "P" => Some("Pro"), "Q" => Some("Gln"), "R" => Some("Arg"),
        "S" => Some("Ser"), "T" => Some("Thr"), "V" => Some("Val"),
        "W" => Some("Trp"), "Y" => Some("Tyr"), "*" | "X" => Some("Ter"),
        _ => None,
    }
}

/// Three-letter (any case) → canonical (three-letter, one-letter) pair.
fn aa3_canonical(aa: &str) -> Option<(&'static str, &'static str)> {
    match aa.to_lowercase().as_str() {
        "ala" => Some(("Ala", "A")), "cys" => Some(("Cys", "C")), "asp" => Some(("Asp", "D")),
        "glu" => Some(("Glu", "E")), "phe" => Some(("Phe", "F")), "gly" => Some(("Gly", "G")),
        "his" => Some(("His", "H")), "ile" => Some(("Ile", "I")), "lys" => Some(("Lys", "K")),
        "leu" => Some(("Leu", "L")), "met" => Some(("Met", "M")), "asn" => Some(("Asn", "N")),
        "pro" => Some(("Pro", "P")), "gln" => Some(("Gln", "Q")), "arg" => Some(("Arg", "R")),
        "ser" => Some(("Ser", "S")), "thr" => Some(("Thr", "T")), "val" => Some(("Val", "V")),
        "trp" => Some(("Trp", "W")), "tyr" => Some(("Tyr", "Y")),
        "ter" | "stop" | "*" => Some(("Ter", "*")),
        _ => None,
    }
}

fn resolve_aa(raw: &str) -> Option<(&'static str, &'static str)> {
    if raw.len() == 1 {
        let aa3 = aa1_to_aa3(raw)?;
        aa3_canonical(aa3)
    } else {
        aa3_canonical(raw)
    }
}

/// Normalised protein change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProteinChange {
    /// Canonical HGVS protein notation, e.g. "p.Val600Glu"
    pub hgvs_p: String,
    /// One-letter short form, e.g. "V600E"
    pub short_form: String,
    pub position: u32,
    /// Reference amino acid (3-letter)
    pub ref_aa: String,
    /// Alternate amino acid (3-letter); "Ter" for nonsense
    pub alt_aa: String,
}

impl ProteinChange {
    pub fn is_nonsense(&self) -> bool {
        self.alt_aa == "Ter"
    }

    pub fn is_synonymous(&self) -> bool {
        self.ref_aa == self.alt_aa
    }

    /// True when `other` names this change in either notation.
    pub fn matches(&self, other: &str) -> bool {
        normalise_protein_change(other).is_some_and(|o| o == *self)
    }
}

fn protein_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // p.Gly12Asp, p.G12D, Gly12Asp, G12D, R213*, p.Arg213Ter, p.V600=
        Regex::new(r"^(?:p\.)?([A-Z][a-z]{2}|[A-Z\*])(\d+)([A-Z][a-z]{2}|[A-Z\*=])$")
            .expect("protein change regex is valid")
    })
}

/// Normalise a protein change to canonical form.
///
/// Returns `None` for anything that is not a single-residue substitution
/// (frameshifts, in-frame indels, splice notation, free text).
pub fn normalise_protein_change(raw: &str) -> Option<ProteinChange> {
    let mut s = raw.trim();
    // Drop transcript/protein accession prefix "ENSP...:"
    if let Some((_, rest)) = s.rsplit_once(':') {
        s = rest;
    }
    let cleaned: String = s.chars().filter(|c| *c != '(' && *c != ')').collect();

    let caps = protein_regex().captures(&cleaned)?;
    let ref_raw = caps.get(1)?.as_str();
    let position: u32 = caps.get(2)?.as_str().parse().ok()?;
    let alt_raw = caps.get(3)?.as_str();

    let (ref3, ref1) = resolve_aa(ref_raw)?;
    let (alt3, alt1) = if alt_raw == "=" { (ref3, ref1) } else { resolve_aa(alt_raw)? };

    Some(ProteinChange {
        hgvs_p: format!("p.{}{}{}", ref3, position, alt3),
        short_form: format!("{}{}{}", ref1, position, alt1),
        position,
        ref_aa: ref3.to_string(),
        alt_aa: alt3.to_string(),
    })
}

/// Residue position of any protein notation, including indels and
/// frameshifts ("p.Glu746_Ala750del" → 746). Used for gene-level matching.
pub fn protein_position(raw: &str) -> Option<u32> {
    if let Some(pc) = normalise_protein_change(raw) {
        return Some(pc.position);
    }
    let s = raw.rsplit_once(':').map(|(_, r)| r).unwrap_or(raw);
    let s = s.trim().trim_start_matches("p.").trim_start_matches('(');
    let digits: String = s
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic() || *c == '*')
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
