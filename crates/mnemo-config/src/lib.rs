// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mnemo memory pipeline.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment
//! variable overrides, and miette-backed diagnostic errors.
//!
//! # Usage
//!
//! ```no_run
//! use mnemo_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    DecayConfig, ExtractionConfig, ExtractorModelConfig, MnemoConfig, StorageConfig, VaultConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics
pub fn load_and_validate() -> Result<MnemoConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<MnemoConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = load_and_validate_str("").unwrap();
        assert_eq!(config.extraction.max_pending_jobs_per_user, 50);
        assert_eq!(config.extraction.max_extractions_per_hour, 20);
        assert_eq!(config.extraction.max_attempts, 3);
        assert_eq!(config.extraction.request_timeout_secs, 60);
        assert_eq!(config.decay.archive_threshold, 0.15);
        assert!(config.extraction.models.is_empty());
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
            [storage]
            database_path = "/var/lib/mnemo/mnemo.db"

            [vault]
            key_file = "/var/lib/mnemo/mnemo.key"

            [extraction]
            max_pending_jobs_per_user = 10
            max_extractions_per_hour = 5
            system_model_override = "fast-extractor"

            [[extraction.models]]
            id = "haiku"
            speed_ms = 800

            [[extraction.models]]
            id = "mini"
            speed_ms = 1200
        "#;
        let config = load_and_validate_str(toml).unwrap();
        assert_eq!(config.extraction.max_pending_jobs_per_user, 10);
        assert_eq!(
            config.extraction.system_model_override.as_deref(),
            Some("fast-extractor")
        );
        assert_eq!(config.extraction.models.len(), 2);
        assert_eq!(config.extraction.models[0].id, "haiku");
        assert_eq!(config.extraction.models[0].speed_ms, 800);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml = r#"
            [extraction]
            max_atempts = 5
        "#;
        let result = load_and_validate_str(toml);
        assert!(result.is_err(), "typo'd key must be rejected");
    }

    #[test]
    fn invalid_limits_are_collected() {
        let toml = r#"
            [extraction]
            max_pending_jobs_per_user = 0
            max_extractions_per_hour = 0
        "#;
        let errors = load_and_validate_str(toml).unwrap_err();
        assert_eq!(errors.len(), 2, "both violations reported: {errors:?}");
    }

    #[test]
    fn decay_weights_must_sum_to_one() {
        let toml = r#"
            [decay]
            recency_weight = 0.9
            frequency_weight = 0.3
            engagement_weight = 0.3
        "#;
        let errors = load_and_validate_str(toml).unwrap_err();
        assert!(
            errors.iter().any(|e| e.to_string().contains("sum to 1.0")),
            "weight sum violation reported: {errors:?}"
        );
    }

    #[test]
    fn archive_threshold_bounds() {
        let toml = r#"
            [decay]
            archive_threshold = 1.5
        "#;
        assert!(load_and_validate_str(toml).is_err());
    }
}
