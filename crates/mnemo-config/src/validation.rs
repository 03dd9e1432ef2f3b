// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive limits and well-formed decay weights.

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.vault.key_file.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.key_file must not be empty".to_string(),
        });
    }

    let ext = &config.extraction;

    if ext.max_pending_jobs_per_user < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "extraction.max_pending_jobs_per_user must be at least 1, got {}",
                ext.max_pending_jobs_per_user
            ),
        });
    }

    if ext.max_extractions_per_hour < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "extraction.max_extractions_per_hour must be at least 1, got {}",
                ext.max_extractions_per_hour
            ),
        });
    }

    if ext.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "extraction.max_attempts must be at least 1, got {}",
                ext.max_attempts
            ),
        });
    }

    if ext.request_timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "extraction.request_timeout_secs must be at least 1, got {}",
                ext.request_timeout_secs
            ),
        });
    }

    for (i, model) in ext.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("extraction.models[{i}].id must not be empty"),
            });
        }
    }

    let decay = &config.decay;
    let weight_sum = decay.recency_weight + decay.frequency_weight + decay.engagement_weight;
    if (weight_sum - 1.0).abs() > 0.001 {
        errors.push(ConfigError::Validation {
            message: format!(
                "decay weights must sum to 1.0, got {weight_sum} \
                 (recency {} + frequency {} + engagement {})",
                decay.recency_weight, decay.frequency_weight, decay.engagement_weight
            ),
        });
    }

    if decay.archive_threshold <= 0.0 || decay.archive_threshold >= 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "decay.archive_threshold must be in (0, 1), got {}",
                decay.archive_threshold
            ),
        });
    }

    if decay.frequency_max < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "decay.frequency_max must be at least 1, got {}",
                decay.frequency_max
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
