// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error diagnostics.
//!
//! Figment deserialization errors and post-deserialization validation
//! failures are converted into miette diagnostics for rendering.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error with diagnostic metadata for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Figment failed to deserialize the merged configuration.
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(mnemo::config::invalid),
        help("check mnemo.toml against the documented [storage], [vault], [extraction], and [decay] sections")
    )]
    Invalid {
        /// Figment's description of the failure (key path included).
        message: String,
    },

    /// A semantic validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(mnemo::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(mnemo::config::other))]
    Other(String),
}

/// Convert a figment error (which may aggregate several failures) into
/// one `ConfigError` per underlying failure.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
        .collect()
}

/// Render a list of config errors to a displayable report string.
pub fn render_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
