// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the memory pipeline.
//!
//! The encryption primitive, settings store, model registry, and LLM
//! transport all live outside this workspace's core concern; the pipeline
//! talks to them through these `#[async_trait]` seams so tests can swap
//! in lightweight fakes.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::{ChatMessage, ProviderEndpoint};

/// Per-user payload encryption.
///
/// Ciphertext is an opaque string; the memory pipeline never inspects it.
#[async_trait]
pub trait Encryption: Send + Sync {
    /// Encrypts plaintext under the given user's key.
    async fn encrypt(&self, user_id: &str, plaintext: &[u8]) -> Result<String, MnemoError>;

    /// Decrypts a ciphertext previously produced by [`encrypt`](Self::encrypt)
    /// for the same user.
    async fn decrypt(&self, user_id: &str, ciphertext: &str) -> Result<Vec<u8>, MnemoError>;
}

/// Live lookup of extractor-model preferences.
///
/// Both lookups are re-checked on every extraction call, never cached,
/// so admin and user preference changes take effect immediately.
#[async_trait]
pub trait SettingsLookup: Send + Sync {
    /// Administrator-configured system-wide override for the extraction role.
    async fn system_extractor_override(&self) -> Result<Option<String>, MnemoError>;

    /// The given user's preferred extractor model, if any.
    async fn user_extractor_preference(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, MnemoError>;
}

/// Resolves a model identifier to provider connection details and the
/// provider's actual model name.
#[async_trait]
pub trait ModelResolver: Send + Sync {
    /// Returns `None` when the model ID is not registered with any provider.
    async fn resolve_model(
        &self,
        model_id: &str,
    ) -> Result<Option<(ProviderEndpoint, String)>, MnemoError>;
}

/// A chat-completion request with strict structured output.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Provider-side model name.
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    /// Name registered with the provider for the JSON schema.
    pub schema_name: String,
    /// JSON schema the response content must validate against.
    pub schema: serde_json::Value,
}

/// LLM provider transport for schema-validated completions.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the request and returns the raw content of the first choice.
    ///
    /// The content is expected to be a JSON document matching
    /// `request.schema`; parsing is the caller's responsibility.
    async fn complete_structured(
        &self,
        endpoint: &ProviderEndpoint,
        request: CompletionRequest,
    ) -> Result<String, MnemoError>;
}
