// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`Encryption`] collaborator implementation.
//!
//! Wire format: `base64(nonce[12] || ciphertext+tag)`. The nonce is
//! carried inline so a ciphertext string is self-contained.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use mnemo_core::{Encryption, MnemoError};
use zeroize::Zeroizing;

use crate::{crypto, keys};

/// Per-user envelope encryption backed by a single master key.
///
/// Debug output intentionally omits the master key.
pub struct UserVault {
    /// The master key -- only in memory, never logged.
    master_key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for UserVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserVault")
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

impl UserVault {
    /// Open the vault from a key file, generating the key on first run.
    pub fn open(key_file: &Path) -> Result<Self, MnemoError> {
        let master_key = keys::load_or_generate_master_key(key_file)?;
        Ok(Self { master_key })
    }

    /// Construct a vault directly from key material (tests, embedders).
    pub fn from_key(master_key: [u8; 32]) -> Self {
        Self {
            master_key: Zeroizing::new(master_key),
        }
    }
}

#[async_trait]
impl Encryption for UserVault {
    async fn encrypt(&self, user_id: &str, plaintext: &[u8]) -> Result<String, MnemoError> {
        if user_id.is_empty() {
            return Err(MnemoError::Validation("user ID is required".to_string()));
        }
        let key = keys::derive_user_key(&self.master_key, user_id)?;
        let (ciphertext, nonce) = crypto::seal(&key, plaintext)?;

        let mut framed = Vec::with_capacity(nonce.len() + ciphertext.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&ciphertext);
        Ok(B64.encode(framed))
    }

    async fn decrypt(&self, user_id: &str, ciphertext: &str) -> Result<Vec<u8>, MnemoError> {
        if user_id.is_empty() {
            return Err(MnemoError::Validation("user ID is required".to_string()));
        }
        let framed = B64
            .decode(ciphertext)
            .map_err(|e| MnemoError::Crypto(format!("ciphertext is not valid base64: {e}")))?;
        if framed.len() < 12 {
            return Err(MnemoError::Crypto("ciphertext too short".to_string()));
        }

        let (nonce_bytes, sealed) = framed.split_at(12);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(nonce_bytes);

        let key = keys::derive_user_key(&self.master_key, user_id)?;
        crypto::open(&key, &nonce, sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encrypt_decrypt_roundtrip() {
        let vault = UserVault::from_key([42u8; 32]);

        let ciphertext = vault.encrypt("user-1", b"prefers dark mode").await.unwrap();
        let plaintext = vault.decrypt("user-1", &ciphertext).await.unwrap();

        assert_eq!(plaintext, b"prefers dark mode");
    }

    #[tokio::test]
    async fn ciphertext_is_opaque_base64() {
        let vault = UserVault::from_key([42u8; 32]);
        let ciphertext = vault.encrypt("user-1", b"secret").await.unwrap();

        assert!(!ciphertext.contains("secret"));
        assert!(B64.decode(&ciphertext).is_ok());
    }

    #[tokio::test]
    async fn wrong_user_cannot_decrypt() {
        let vault = UserVault::from_key([42u8; 32]);

        let ciphertext = vault.encrypt("user-1", b"private fact").await.unwrap();
        let result = vault.decrypt("user-2", &ciphertext).await;

        assert!(matches!(result, Err(MnemoError::Crypto(_))));
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let vault = UserVault::from_key([42u8; 32]);
        assert!(vault.encrypt("", b"x").await.is_err());
        assert!(vault.decrypt("", "AAAA").await.is_err());
    }

    #[tokio::test]
    async fn garbage_ciphertext_is_rejected() {
        let vault = UserVault::from_key([42u8; 32]);
        assert!(vault.decrypt("user-1", "not base64!!!").await.is_err());
        assert!(vault.decrypt("user-1", "AAAA").await.is_err());
    }

    #[tokio::test]
    async fn open_from_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("mnemo.key");

        let vault = UserVault::open(&key_file).unwrap();
        let ciphertext = vault.encrypt("user-1", b"persisted").await.unwrap();

        // Re-opening with the same key file decrypts old ciphertexts.
        let reopened = UserVault::open(&key_file).unwrap();
        let plaintext = reopened.decrypt("user-1", &ciphertext).await.unwrap();
        assert_eq!(plaintext, b"persisted");
    }
}
