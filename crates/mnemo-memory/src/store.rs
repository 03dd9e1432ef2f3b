// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted, deduplicated memory storage.
//!
//! The store owns normalization, hashing, and encryption; the queries
//! layer below it never sees plaintext. Reads decrypt on the way out.

use std::sync::Arc;

use mnemo_core::types::{DecryptedMemory, Memory, MemoryCategory, MemoryStats};
use mnemo_core::{Encryption, MnemoError};
use mnemo_storage::models::{MemoryDraft, MemoryFilter};
use mnemo_storage::{queries, Database};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::normalize::{hash_content, normalize_content};
use crate::recording;

/// Encrypted memory store with hash-based deduplication.
pub struct MemoryStore {
    db: Arc<Database>,
    vault: Arc<dyn Encryption>,
}

impl MemoryStore {
    pub fn new(db: Arc<Database>, vault: Arc<dyn Encryption>) -> Self {
        Self { db, vault }
    }

    /// Store a fact, or reinforce the existing memory with the same
    /// normalized-content hash.
    ///
    /// The initial score of a new memory is its source engagement.
    /// Returns the stored memory and whether it was a reinforcement.
    pub async fn remember(
        &self,
        user_id: &str,
        conversation_id: &str,
        content: &str,
        category: MemoryCategory,
        tags: Vec<String>,
        source_engagement: f64,
    ) -> Result<(Memory, bool), MnemoError> {
        if user_id.is_empty() {
            return Err(MnemoError::Validation("user ID is required".to_string()));
        }
        if content.is_empty() {
            return Err(MnemoError::Validation(
                "memory content is required".to_string(),
            ));
        }

        let normalized = normalize_content(content);
        if normalized.is_empty() {
            return Err(MnemoError::Validation(
                "memory content is empty after normalization".to_string(),
            ));
        }
        let content_hash = hash_content(&normalized);

        let encrypted_content = self.vault.encrypt(user_id, content.as_bytes()).await?;

        let draft = MemoryDraft {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            encrypted_content,
            content_hash,
            category,
            tags,
            score: source_engagement,
            source_engagement,
        };

        let (memory, reinforced) = queries::memories::create_or_reinforce(&self.db, draft).await?;
        recording::record_memory_stored(reinforced);
        debug!(
            memory_id = %memory.id,
            category = %memory.category.as_str(),
            reinforced,
            score = memory.score,
            "memory stored"
        );
        Ok((memory, reinforced))
    }

    /// Fetch and decrypt one memory.
    pub async fn get(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<DecryptedMemory>, MnemoError> {
        let Some(memory) = queries::memories::get(&self.db, user_id, id).await? else {
            return Ok(None);
        };
        let content = self.decrypt_content(user_id, &memory).await?;
        Ok(Some(DecryptedMemory { memory, content }))
    }

    /// List and decrypt memories matching the filter.
    ///
    /// A memory whose ciphertext fails to decrypt is skipped with a
    /// warning rather than failing the whole listing.
    pub async fn list(
        &self,
        filter: MemoryFilter,
    ) -> Result<(Vec<DecryptedMemory>, i64), MnemoError> {
        let user_id = filter.user_id.clone();
        let (memories, total) = queries::memories::list(&self.db, filter).await?;

        let mut decrypted = Vec::with_capacity(memories.len());
        for memory in memories {
            match self.decrypt_content(&user_id, &memory).await {
                Ok(content) => decrypted.push(DecryptedMemory { memory, content }),
                Err(e) => {
                    warn!(memory_id = %memory.id, error = %e, "skipping undecryptable memory");
                }
            }
        }
        Ok((decrypted, total))
    }

    /// Replace a memory's content, re-encrypting and re-hashing.
    ///
    /// A missing ID and one owned by another user both come back as
    /// [`MnemoError::NotFound`].
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        content: &str,
        category: MemoryCategory,
        tags: Vec<String>,
    ) -> Result<Memory, MnemoError> {
        if user_id.is_empty() {
            return Err(MnemoError::Validation("user ID is required".to_string()));
        }
        if content.is_empty() {
            return Err(MnemoError::Validation(
                "memory content is required".to_string(),
            ));
        }

        let normalized = normalize_content(content);
        if normalized.is_empty() {
            return Err(MnemoError::Validation(
                "memory content is empty after normalization".to_string(),
            ));
        }
        let content_hash = hash_content(&normalized);
        let encrypted_content = self.vault.encrypt(user_id, content.as_bytes()).await?;

        queries::memories::update_content(
            &self.db,
            user_id,
            id,
            &encrypted_content,
            &content_hash,
            category,
            tags,
        )
        .await?
        .ok_or_else(|| MnemoError::NotFound(format!("memory {id}")))
    }

    /// Bump access counts for memories selected at retrieval time.
    pub async fn record_access(&self, user_id: &str, ids: Vec<String>) -> Result<(), MnemoError> {
        queries::memories::record_access(&self.db, user_id, ids).await
    }

    /// Archive a memory (soft, reversible).
    pub async fn archive(&self, user_id: &str, id: &str) -> Result<bool, MnemoError> {
        queries::memories::set_archived(&self.db, user_id, id, true).await
    }

    /// Bring an archived memory back into default listings.
    pub async fn unarchive(&self, user_id: &str, id: &str) -> Result<bool, MnemoError> {
        queries::memories::set_archived(&self.db, user_id, id, false).await
    }

    /// Permanently delete a memory.
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool, MnemoError> {
        queries::memories::delete(&self.db, user_id, id).await
    }

    /// Aggregate statistics for one user.
    pub async fn stats(&self, user_id: &str) -> Result<MemoryStats, MnemoError> {
        queries::memories::stats(&self.db, user_id).await
    }

    async fn decrypt_content(&self, user_id: &str, memory: &Memory) -> Result<String, MnemoError> {
        let plaintext = self
            .vault
            .decrypt(user_id, &memory.encrypted_content)
            .await?;
        String::from_utf8(plaintext)
            .map_err(|e| MnemoError::Crypto(format!("decrypted content is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_vault::UserVault;
    use tempfile::tempdir;

    async fn setup_store() -> (MemoryStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let vault = UserVault::from_key([7u8; 32]);
        let store = MemoryStore::new(Arc::new(db), Arc::new(vault));
        (store, dir)
    }

    #[tokio::test]
    async fn remember_encrypts_at_rest_and_decrypts_on_read() {
        let (store, _dir) = setup_store().await;

        let (memory, reinforced) = store
            .remember(
                "user-1",
                "conv-1",
                "User lives in Paris",
                MemoryCategory::PersonalInfo,
                vec!["location".to_string()],
                0.6,
            )
            .await
            .unwrap();
        assert!(!reinforced);
        assert_eq!(memory.score, 0.6);
        // Ciphertext at rest, not the plaintext.
        assert!(!memory.encrypted_content.contains("Paris"));

        let fetched = store.get("user-1", &memory.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "User lives in Paris");
        assert_eq!(fetched.memory.category, MemoryCategory::PersonalInfo);
    }

    #[tokio::test]
    async fn phrasing_variants_reinforce_the_same_memory() {
        let (store, _dir) = setup_store().await;

        let (first, _) = store
            .remember(
                "user-1",
                "conv-1",
                "User prefers dark-mode!",
                MemoryCategory::Preferences,
                vec!["ui".to_string()],
                0.4,
            )
            .await
            .unwrap();

        let (second, reinforced) = store
            .remember(
                "user-1",
                "conv-2",
                "user prefers dark mode",
                MemoryCategory::Preferences,
                vec!["style".to_string()],
                0.8,
            )
            .await
            .unwrap();

        assert!(reinforced);
        assert_eq!(second.id, first.id);
        assert_eq!(second.version, 2);
        assert!((second.score - 0.5).abs() < 1e-9);
        assert_eq!(second.source_engagement, 0.8);
        assert_eq!(second.tags, vec!["ui", "style"]);

        // First write's plaintext is what decrypts; reinforcement does
        // not replace content.
        let fetched = store.get("user-1", &first.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "User prefers dark-mode!");
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected() {
        let (store, _dir) = setup_store().await;

        let err = store
            .remember("", "conv-1", "x", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Validation(_)));

        let err = store
            .remember("user-1", "conv-1", "", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Validation(_)));

        // Pure punctuation normalizes to nothing.
        let err = store
            .remember("user-1", "conv-1", "?!...", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Validation(_)));
    }

    #[tokio::test]
    async fn list_decrypts_and_paginates() {
        let (store, _dir) = setup_store().await;

        for (content, engagement) in [("fact one", 0.9), ("fact two", 0.5)] {
            store
                .remember(
                    "user-1",
                    "conv-1",
                    content,
                    MemoryCategory::Fact,
                    vec![],
                    engagement,
                )
                .await
                .unwrap();
        }

        let (results, total) = store
            .list(MemoryFilter::for_user("user-1"))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(results[0].content, "fact one");
        assert_eq!(results[1].content, "fact two");
    }

    #[tokio::test]
    async fn update_rewrites_content_and_hash() {
        let (store, _dir) = setup_store().await;

        let (memory, _) = store
            .remember(
                "user-1",
                "conv-1",
                "works at Acme",
                MemoryCategory::PersonalInfo,
                vec![],
                0.5,
            )
            .await
            .unwrap();

        let updated = store
            .update(
                "user-1",
                &memory.id,
                "works at Initech",
                MemoryCategory::PersonalInfo,
                vec!["job".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_ne!(updated.content_hash, memory.content_hash);

        let fetched = store.get("user-1", &memory.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "works at Initech");

        // The new hash participates in dedup.
        let (again, reinforced) = store
            .remember(
                "user-1",
                "conv-2",
                "Works at Initech!",
                MemoryCategory::PersonalInfo,
                vec![],
                0.5,
            )
            .await
            .unwrap();
        assert!(reinforced);
        assert_eq!(again.id, memory.id);
    }

    #[tokio::test]
    async fn update_of_another_users_memory_is_not_found() {
        let (store, _dir) = setup_store().await;

        let (memory, _) = store
            .remember("user-1", "conv-1", "a fact", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap();

        // Wrong owner and missing ID are indistinguishable.
        let err = store
            .update("user-2", &memory.id, "rewritten", MemoryCategory::Fact, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::NotFound(_)));

        let err = store
            .update("user-1", "no-such-id", "rewritten", MemoryCategory::Fact, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::NotFound(_)));

        // Content untouched.
        let fetched = store.get("user-1", &memory.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "a fact");
    }

    #[tokio::test]
    async fn archive_delete_and_stats_lifecycle() {
        let (store, _dir) = setup_store().await;

        let (m1, _) = store
            .remember("user-1", "conv-1", "fact one", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap();
        let (m2, _) = store
            .remember("user-1", "conv-1", "fact two", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap();

        assert!(store.archive("user-1", &m1.id).await.unwrap());
        let stats = store.stats("user-1").await.unwrap();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.archived, 1);

        assert!(store.unarchive("user-1", &m1.id).await.unwrap());
        assert!(store.delete("user-1", &m2.id).await.unwrap());
        let stats = store.stats("user-1").await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.archived, 0);
    }

    #[tokio::test]
    async fn record_access_shows_up_in_listing() {
        let (store, _dir) = setup_store().await;

        let (memory, _) = store
            .remember("user-1", "conv-1", "a fact", MemoryCategory::Fact, vec![], 0.5)
            .await
            .unwrap();
        store
            .record_access("user-1", vec![memory.id.clone()])
            .await
            .unwrap();

        let fetched = store.get("user-1", &memory.id).await.unwrap().unwrap();
        assert_eq!(fetched.memory.access_count, 1);
    }
}
