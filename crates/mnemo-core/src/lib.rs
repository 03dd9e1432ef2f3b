// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo memory pipeline.
//!
//! This crate provides the error type, domain model, and collaborator
//! trait definitions used throughout the Mnemo workspace. The pipeline
//! crates depend on these seams rather than on concrete collaborators.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use traits::{CompletionClient, CompletionRequest, Encryption, ModelResolver, SettingsLookup};
pub use types::{
    ChatMessage, ConversationEngagement, DecryptedMemory, ExtractedFact, ExtractedFacts,
    ExtractionJob, JobStatus, Memory, MemoryCategory, MemoryStats, ProviderEndpoint, now_iso,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemo_error_has_all_variants() {
        let _config = MnemoError::Config("test".into());
        let _storage = MnemoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = MnemoError::Provider {
            message: "test".into(),
            source: None,
        };
        let _crypto = MnemoError::Crypto("test".into());
        let _validation = MnemoError::Validation("test".into());
        let _rate = MnemoError::RateLimited("test".into());
        let _not_found = MnemoError::NotFound("test".into());
        let _timeout = MnemoError::Timeout {
            duration: std::time::Duration::from_secs(60),
        };
        let _internal = MnemoError::Internal("test".into());
    }

    #[test]
    fn rate_limited_message_is_human_readable() {
        let err = MnemoError::RateLimited(
            "extraction rate limit exceeded (20 extractions in last hour), please wait".into(),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("rate limit exceeded"));
        assert!(!rendered.starts_with("rate limited:"), "reason is surfaced verbatim");
    }

    #[test]
    fn all_trait_seams_are_object_safe() {
        fn _assert_encryption(_: &dyn Encryption) {}
        fn _assert_settings(_: &dyn SettingsLookup) {}
        fn _assert_resolver(_: &dyn ModelResolver) {}
        fn _assert_client(_: &dyn CompletionClient) {}
    }
}
