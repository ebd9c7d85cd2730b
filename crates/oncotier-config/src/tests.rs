#[cfg(test)]
mod tests {
    use super::super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_yields_guideline_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.thresholds.vicc.oncogenic_min, 10);
        assert_eq!(config.thresholds.vicc.likely_oncogenic_min, 6);
        assert_eq!(config.thresholds.vicc.benign_max, -7);
        assert_eq!(config.thresholds.dsc.tier1_min, 0.9);
        assert_eq!(config.thresholds.dsc.tier2_min, 0.6);
        assert!(config.oncokb_api.is_none());
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            [thresholds]
            version = "lab-2026-01"

            [thresholds.dsc]
            tier1_min = 0.95

            [weights.tumor_normal]
            gnomad = 0.1

            [oncokb_api]
            timeout_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.version, "lab-2026-01");
        assert_eq!(config.thresholds.dsc.tier1_min, 0.95);
        assert_eq!(config.thresholds.dsc.tier2_min, 0.6);
        assert_eq!(config.weights.tumor_normal.get("gnomad"), Some(&0.1));
        // A partially specified table replaces the whole map
        assert_eq!(config.weights.tumor_normal.len(), 1);
        let api = config.oncokb_api.unwrap();
        assert_eq!(api.timeout_ms, 500);
        assert_eq!(api.base_url, "https://www.oncokb.org/api/v1");
    }

    #[test]
    fn test_inverted_dsc_gates_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [thresholds.dsc]
            tier1_min = 0.5
            tier2_min = 0.7
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("DSC")));
    }

    #[test]
    fn test_non_monotonic_vicc_bands_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [thresholds.vicc]
            oncogenic_min = 5
            likely_oncogenic_min = 6
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_yaml_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "thresholds:\n  version: yaml-v2\ncache:\n  enabled: true").unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.thresholds.version, "yaml-v2");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = EngineConfig::from_path(std::path::Path::new("/nonexistent/oncotier.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }
}
