//! Configuration loading for oncotier.
//! Reads oncotier.toml (or .yaml) from the current directory or the path in
//! the ONCOTIER_CONFIG env var. Every field has a default, so an empty file
//! (or no file at all) yields the published guideline thresholds.

pub mod thresholds;
pub mod weights;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use thresholds::{
    DscThresholds, HotspotThresholds, PopulationThresholds, PurityThresholds, ThresholdTable,
    TierThresholds, ViccBands,
};
pub use weights::PathwayWeights;

pub const CONFIG_ENV_VAR: &str = "ONCOTIER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "oncotier.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub thresholds: ThresholdTable,
    #[serde(default)]
    pub weights: PathwayWeights,
    #[serde(default)]
    pub vaf: VafThresholds,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Live OncoKB API; disabled when absent
    #[serde(default)]
    pub oncokb_api: Option<OncoKbApiConfig>,
}

/// VAF and depth filters exposed to the engine through the workflow router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VafThresholds {
    /// Variants below this VAF are treated as noise
    #[serde(default = "default_min_vaf")]
    pub min_vaf: f64,
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,
    /// Absolute tolerance around the expected heterozygous somatic VAF
    #[serde(default = "default_vaf_tolerance")]
    pub vaf_tolerance: f64,
    /// Relative tolerance (fraction of expected VAF); the larger of the two applies
    #[serde(default = "default_relative_tolerance")]
    pub relative_tolerance: f64,
    /// Half-width of the germline-heterozygous band around 0.5
    #[serde(default = "default_germline_window")]
    pub germline_window: f64,
    /// Purity at or above which a VAF near 0.5 looks germline
    #[serde(default = "default_high_purity")]
    pub high_purity: f64,
    /// Depth at which VAF precision saturates
    #[serde(default = "default_saturating_depth")]
    pub saturating_depth: u32,
}

fn default_min_vaf() -> f64 { 0.02 }
fn default_min_depth() -> u32 { 20 }
fn default_vaf_tolerance() -> f64 { 0.05 }
fn default_relative_tolerance() -> f64 { 0.15 }
fn default_germline_window() -> f64 { 0.05 }
fn default_high_purity() -> f64 { 0.7 }
fn default_saturating_depth() -> u32 { 100 }

impl Default for VafThresholds {
    fn default() -> Self {
        Self {
            min_vaf: default_min_vaf(),
            min_depth: default_min_depth(),
            vaf_tolerance: default_vaf_tolerance(),
            relative_tolerance: default_relative_tolerance(),
            germline_window: default_germline_window(),
            high_purity: default_high_purity(),
            saturating_depth: default_saturating_depth(),
        }
    }
}

/// Memoisation of evidence aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_max_entries() -> u64 { 10_000 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: false, max_entries: default_max_entries() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OncoKbApiConfig {
    #[serde(default = "default_oncokb_url")]
    pub base_url: String,
    /// Falls back to the ONCOKB_API_TOKEN env var
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_oncokb_url() -> String { "https://www.oncokb.org/api/v1".to_string() }
fn default_timeout_ms() -> u64 { 2_000 }

impl Default for OncoKbApiConfig {
    fn default() -> Self {
        Self { base_url: default_oncokb_url(), token: None, timeout_ms: default_timeout_ms() }
    }
}

impl OncoKbApiConfig {
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("ONCOKB_API_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

impl EngineConfig {
    /// Load configuration.
    /// Checks ONCOTIER_CONFIG first, then ./oncotier.toml; without either,
    /// returns the defaults.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_path(Path::new(&path)),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_path(Path::new(DEFAULT_CONFIG_PATH))
            }
            Err(_) => {
                info!("No {} found, using default thresholds", DEFAULT_CONFIG_PATH);
                Ok(Self::default())
            }
        }
    }

    /// Load from a TOML or YAML file, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        info!(
            path = %path.display(),
            threshold_version = %config.thresholds.version,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = self.thresholds.problems();
        problems.extend(self.weights.problems());
        let v = &self.vaf;
        for (name, value) in [
            ("vaf.min_vaf", v.min_vaf),
            ("vaf.vaf_tolerance", v.vaf_tolerance),
            ("vaf.relative_tolerance", v.relative_tolerance),
            ("vaf.germline_window", v.germline_window),
            ("vaf.high_purity", v.high_purity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                problems.push(format!("{} must be in [0, 1] (got {})", name, value));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }
}

mod tests;
