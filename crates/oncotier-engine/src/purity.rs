//! Tumor purity estimation.
//!
//! Resolution order: caller-supplied purity, then a PURPLE purity file, then
//! a VAF-distribution estimate from the cohort. The VAF estimate locates the
//! heterozygous somatic peak with a Gaussian kernel density and reports
//! twice the peak VAF.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use oncotier_common::confidence::clamp_unit;
use oncotier_common::{AnalysisType, VariantAnnotation};
use oncotier_config::{PurityThresholds, VafThresholds};

/// Density grid resolution over VAF in [0, 1].
const GRID_STEP: f64 = 0.005;
const MIN_BANDWIDTH: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurityMethod {
    Metadata,
    PurpleHmf,
    VafPeak,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurityEstimate {
    pub purity: f64,
    pub confidence: f64,
    pub method: PurityMethod,
    pub supporting_variants: usize,
}

// ── PURPLE ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PurpleError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PURPLE purity file has no data row")]
    Empty,

    #[error("PURPLE purity file is missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("Invalid value for `{column}`: {value}")]
    InvalidValue { column: &'static str, value: String },
}

/// The fields we use from `<sample>.purple.purity.tsv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurpleOutput {
    pub purity: f64,
    pub min_purity: f64,
    pub max_purity: f64,
    pub status: Option<String>,
}

impl PurpleOutput {
    pub fn parse(tsv: &str) -> Result<Self, PurpleError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(tsv.as_bytes());
        let headers = reader.headers()?.clone();
        let record = reader.records().next().ok_or(PurpleError::Empty)??;

        let field = |column: &'static str| -> Result<&str, PurpleError> {
            let idx = headers
                .iter()
                .position(|h| h.trim().trim_start_matches('#') == column)
                .ok_or(PurpleError::MissingColumn(column))?;
            record.get(idx).map(str::trim).ok_or(PurpleError::MissingColumn(column))
        };
        let number = |column: &'static str| -> Result<f64, PurpleError> {
            let raw = field(column)?;
            raw.parse::<f64>()
                .map_err(|_| PurpleError::InvalidValue { column, value: raw.to_string() })
        };

        let purity = number("purity")?;
        Ok(Self {
            purity,
            min_purity: number("minPurity").unwrap_or(purity),
            max_purity: number("maxPurity").unwrap_or(purity),
            status: field("status").ok().map(str::to_string),
        })
    }

    /// Narrower purity interval, higher confidence.
    pub fn confidence(&self) -> f64 {
        let width = (self.max_purity - self.min_purity).abs();
        (1.0 - width).clamp(0.3, 0.95)
    }

    /// FAIL_* and NO_TUMOR fits are not trusted.
    pub fn is_usable(&self) -> bool {
        let failed = self
            .status
            .as_deref()
            .is_some_and(|s| s.starts_with("FAIL") || s == "NO_TUMOR");
        !failed && (0.0..=1.0).contains(&self.purity)
    }
}

/// Purity information supplied alongside the cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurityMetadata {
    pub purity: Option<f64>,
    pub purple: Option<PurpleOutput>,
}

// ── Estimator ────────────────────────────────────────────────────────────────

pub struct PurityEstimator<'a> {
    vaf: &'a VafThresholds,
    thresholds: &'a PurityThresholds,
}

impl<'a> PurityEstimator<'a> {
    pub fn new(vaf: &'a VafThresholds, thresholds: &'a PurityThresholds) -> Self {
        Self { vaf, thresholds }
    }

    #[instrument(skip(self, cohort, metadata), fields(cohort = cohort.len(), analysis = analysis_type.as_str()))]
    pub fn estimate_purity(
        &self,
        cohort: &[VariantAnnotation],
        analysis_type: AnalysisType,
        metadata: Option<&PurityMetadata>,
    ) -> PurityEstimate {
        if let Some(purity) = metadata.and_then(|m| m.purity).filter(|p| (0.0..=1.0).contains(p)) {
            return PurityEstimate {
                purity,
                confidence: self.thresholds.metadata_confidence,
                method: PurityMethod::Metadata,
                supporting_variants: 0,
            };
        }
        if let Some(purple) = metadata.and_then(|m| m.purple.as_ref()) {
            if purple.is_usable() {
                return PurityEstimate {
                    purity: purple.purity,
                    confidence: purple.confidence(),
                    method: PurityMethod::PurpleHmf,
                    supporting_variants: 0,
                };
            }
            warn!(status = ?purple.status, "PURPLE purity fit not usable, estimating from VAFs");
        }
        self.estimate_from_vafs(cohort, analysis_type)
    }

    /// Somatic-quality filter applied before the VAF estimate.
    pub fn qualifies(&self, variant: &VariantAnnotation, analysis_type: AnalysisType) -> bool {
        let Some(vaf) = variant.vaf else { return false };
        if vaf.is_nan() || vaf <= self.vaf.min_vaf || vaf > 1.0 {
            return false;
        }
        if variant.depth.is_some_and(|d| d < self.vaf.min_depth) {
            return false;
        }
        match analysis_type {
            AnalysisType::TumorNormal => true,
            AnalysisType::TumorOnly => {
                let rare = variant.max_population_af().map_or(true, |af| af <= self.thresholds.rare_af);
                (variant.has_hotspot() || rare) && !variant.is_clinvar_germline_pathogenic()
            }
        }
    }

    fn estimate_from_vafs(&self, cohort: &[VariantAnnotation], analysis_type: AnalysisType) -> PurityEstimate {
        let vafs: Vec<f64> = cohort
            .iter()
            .filter(|v| self.qualifies(v, analysis_type))
            .filter_map(|v| v.vaf)
            .collect();
        let n = vafs.len();

        if n < self.thresholds.min_supporting_variants {
            warn!(
                supporting = n,
                required = self.thresholds.min_supporting_variants,
                "Too few qualifying variants for purity estimation, using default"
            );
            return PurityEstimate {
                purity: self.thresholds.default_purity,
                confidence: self.thresholds.insufficient_confidence,
                method: PurityMethod::InsufficientData,
                supporting_variants: n,
            };
        }

        let peak = density_peak(&vafs);
        let purity = clamp_unit(2.0 * peak);
        let in_window = vafs
            .iter()
            .filter(|v| (*v - peak).abs() <= self.thresholds.peak_window)
            .count() as f64
            / n as f64;
        let count_factor = (n as f64 / self.thresholds.saturating_count as f64).min(1.0);
        let confidence = (0.3 + 0.4 * count_factor + 0.3 * in_window).min(0.95);

        debug!(supporting = n, peak, purity, confidence, "Purity estimated from VAF peak");
        PurityEstimate { purity, confidence, method: PurityMethod::VafPeak, supporting_variants: n }
    }
}

/// Silverman's rule of thumb, floored so tight clusters still smooth.
fn bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return MIN_BANDWIDTH;
    }
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (1.06 * var.sqrt() * n.powf(-0.2)).max(MIN_BANDWIDTH)
}

/// Mode of a Gaussian kernel density over [0, 1]; the lowest VAF wins ties.
pub fn density_peak(values: &[f64]) -> f64 {
    let h = bandwidth(values);
    let steps = (1.0 / GRID_STEP).round() as usize;
    let mut best = (0.0_f64, f64::NEG_INFINITY);
    for i in 0..=steps {
        let x = i as f64 * GRID_STEP;
        let density: f64 = values.iter().map(|v| (-0.5 * ((x - v) / h).powi(2)).exp()).sum();
        if density > best.1 {
            best = (x, density);
        }
    }
    best.0
}
