// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo memory pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Payload encryption settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Extraction pipeline settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Score decay and auto-archival settings.
    #[serde(default)]
    pub decay: DecayConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "mnemo.db".to_string()
}

/// Payload encryption configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Path to the 32-byte master key file. Generated on first run if absent.
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
        }
    }
}

fn default_key_file() -> String {
    "mnemo.key".to_string()
}

/// One candidate model for the extraction role.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorModelConfig {
    /// Model identifier as registered with the model resolver.
    pub id: String,

    /// Measured structured-output latency, used to order the pool
    /// fastest-first. Unmeasured models sort last.
    #[serde(default = "default_speed_ms")]
    pub speed_ms: u64,
}

fn default_speed_ms() -> u64 {
    999_999
}

/// Extraction pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Maximum jobs in status `pending` per user before enqueue is rejected.
    #[serde(default = "default_max_pending_jobs_per_user")]
    pub max_pending_jobs_per_user: i64,

    /// Maximum extractions per user in a sliding one-hour window.
    #[serde(default = "default_max_extractions_per_hour")]
    pub max_extractions_per_hour: i64,

    /// Total model attempts per job, win or lose.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt timeout for the extraction model call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Consecutive failures after which a pool candidate is skipped.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Administrator-configured system-wide extractor model override.
    #[serde(default)]
    pub system_model_override: Option<String>,

    /// Candidate models eligible for the extraction role.
    #[serde(default)]
    pub models: Vec<ExtractorModelConfig>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pending_jobs_per_user: default_max_pending_jobs_per_user(),
            max_extractions_per_hour: default_max_extractions_per_hour(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            failure_threshold: default_failure_threshold(),
            system_model_override: None,
            models: Vec::new(),
        }
    }
}

fn default_max_pending_jobs_per_user() -> i64 {
    50
}

fn default_max_extractions_per_hour() -> i64 {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    3
}

/// Score decay and auto-archival configuration.
///
/// The decay pass recomputes each active memory's score as a weighted
/// combination of recency, access frequency, and source engagement, and
/// archives memories falling below `archive_threshold`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DecayConfig {
    /// Weight of the recency component.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// Weight of the access-frequency component.
    #[serde(default = "default_frequency_weight")]
    pub frequency_weight: f64,

    /// Weight of the source-engagement component.
    #[serde(default = "default_engagement_weight")]
    pub engagement_weight: f64,

    /// Exponential decay rate per day since last access.
    #[serde(default = "default_recency_decay_rate")]
    pub recency_decay_rate: f64,

    /// Access count at which the frequency component saturates at 1.0.
    #[serde(default = "default_frequency_max")]
    pub frequency_max: i64,

    /// Memories scoring below this are archived (soft, reversible).
    #[serde(default = "default_archive_threshold")]
    pub archive_threshold: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            recency_weight: default_recency_weight(),
            frequency_weight: default_frequency_weight(),
            engagement_weight: default_engagement_weight(),
            recency_decay_rate: default_recency_decay_rate(),
            frequency_max: default_frequency_max(),
            archive_threshold: default_archive_threshold(),
        }
    }
}

fn default_recency_weight() -> f64 {
    0.4
}

fn default_frequency_weight() -> f64 {
    0.3
}

fn default_engagement_weight() -> f64 {
    0.3
}

fn default_recency_decay_rate() -> f64 {
    0.05
}

fn default_frequency_max() -> i64 {
    20
}

fn default_archive_threshold() -> f64 {
    0.15
}
