// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo memory pipeline.

use thiserror::Error;

/// The primary error type used across all Mnemo collaborator traits and
/// pipeline operations.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors (API failure, schema violation, model not found).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Encryption or decryption failure for a user-scoped payload.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Input rejected before any state was persisted (missing IDs, empty content).
    #[error("validation error: {0}")]
    Validation(String),

    /// Enqueue rejected by backpressure or the hourly rate window.
    /// The caller should retry later; nothing was persisted.
    #[error("{0}")]
    RateLimited(String),

    /// Record does not exist or is not owned by the caller. The two cases
    /// are deliberately indistinguishable to avoid leaking other users' IDs.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
