// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-blocking enqueue with per-user backpressure.
//!
//! Two independent limits guard the queue: a cap on jobs sitting in
//! `pending`, and a sliding one-hour window over in-flight plus
//! recently completed jobs. Rejections happen before anything is
//! persisted, so a rejected enqueue leaves no trace.

use std::sync::Arc;

use mnemo_config::model::ExtractionConfig;
use mnemo_core::types::{now_iso, ChatMessage, ExtractionJob, JobStatus, TIMESTAMP_FORMAT};
use mnemo_core::{Encryption, MnemoError};
use mnemo_storage::{queries, Database};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::recording;

/// Accepts extraction work and applies rate limits.
pub struct JobQueue {
    db: Arc<Database>,
    vault: Arc<dyn Encryption>,
    config: ExtractionConfig,
}

impl JobQueue {
    pub fn new(db: Arc<Database>, vault: Arc<dyn Encryption>, config: ExtractionConfig) -> Self {
        Self { db, vault, config }
    }

    /// Enqueue a conversation slice for background extraction.
    ///
    /// Returns the job ID. Fails with [`MnemoError::RateLimited`] when
    /// either per-user limit is hit.
    pub async fn enqueue(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<String, MnemoError> {
        if user_id.is_empty() || conversation_id.is_empty() {
            return Err(MnemoError::Validation(
                "user ID and conversation ID are required".to_string(),
            ));
        }
        if messages.is_empty() {
            return Err(MnemoError::Validation(
                "at least one message is required".to_string(),
            ));
        }

        let pending = queries::jobs::count_pending(&self.db, user_id).await?;
        if pending >= self.config.max_pending_jobs_per_user {
            warn!(user_id, pending, "enqueue rejected: pending backlog full");
            recording::record_enqueue_rejected("pending_backlog");
            return Err(MnemoError::RateLimited(format!(
                "too many pending extraction jobs ({pending}), please wait"
            )));
        }

        let cutoff = (chrono::Utc::now() - chrono::Duration::hours(1))
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let recent = queries::jobs::count_recent_window(&self.db, user_id, &cutoff).await?;
        if recent >= self.config.max_extractions_per_hour {
            warn!(user_id, recent, "enqueue rejected: hourly window exhausted");
            recording::record_enqueue_rejected("hourly_window");
            return Err(MnemoError::RateLimited(format!(
                "extraction rate limit exceeded ({recent} extractions in last hour), please wait"
            )));
        }

        let payload = serde_json::to_string(messages).map_err(|e| {
            MnemoError::Internal(format!("failed to serialize messages: {e}"))
        })?;
        let encrypted_messages = self.vault.encrypt(user_id, payload.as_bytes()).await?;

        let job = ExtractionJob {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            message_count: messages.len() as i64,
            encrypted_messages,
            status: JobStatus::Pending,
            attempt_count: 0,
            error_message: None,
            created_at: now_iso(),
            processed_at: None,
        };
        queries::jobs::insert(&self.db, &job).await?;

        recording::record_job_enqueued();
        debug!(
            job_id = %job.id,
            conversation_id,
            message_count = job.message_count,
            "extraction job enqueued"
        );
        Ok(job.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_vault::UserVault;
    use tempfile::tempdir;

    async fn setup_queue(config: ExtractionConfig) -> (JobQueue, Arc<Database>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Arc::new(Database::open(db_path.to_str().unwrap()).await.unwrap());
        let vault = Arc::new(UserVault::from_key([7u8; 32]));
        let queue = JobQueue::new(db.clone(), vault, config);
        (queue, db, dir)
    }

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "user".to_string(),
                content: "I live in Paris".to_string(),
            },
            ChatMessage {
                role: "assistant".to_string(),
                content: "Nice!".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn enqueue_persists_an_encrypted_pending_job() {
        let (queue, db, _dir) = setup_queue(ExtractionConfig::default()).await;

        let job_id = queue
            .enqueue("user-1", "conv-1", &messages())
            .await
            .unwrap();

        let job = queries::jobs::get(&db, &job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.message_count, 2);
        assert!(!job.encrypted_messages.contains("Paris"));
    }

    #[tokio::test]
    async fn missing_ids_or_messages_are_rejected() {
        let (queue, _db, _dir) = setup_queue(ExtractionConfig::default()).await;

        assert!(matches!(
            queue.enqueue("", "conv-1", &messages()).await,
            Err(MnemoError::Validation(_))
        ));
        assert!(matches!(
            queue.enqueue("user-1", "", &messages()).await,
            Err(MnemoError::Validation(_))
        ));
        assert!(matches!(
            queue.enqueue("user-1", "conv-1", &[]).await,
            Err(MnemoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn pending_backlog_limit_rejects_without_persisting() {
        let config = ExtractionConfig {
            max_pending_jobs_per_user: 2,
            ..ExtractionConfig::default()
        };
        let (queue, db, _dir) = setup_queue(config).await;

        queue.enqueue("user-1", "conv-1", &messages()).await.unwrap();
        queue.enqueue("user-1", "conv-2", &messages()).await.unwrap();

        let err = queue
            .enqueue("user-1", "conv-3", &messages())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::RateLimited(_)));
        assert!(err.to_string().contains("pending"));

        // Nothing persisted for the rejected enqueue.
        assert_eq!(queries::jobs::count_pending(&db, "user-1").await.unwrap(), 2);

        // Another user is unaffected.
        queue.enqueue("user-2", "conv-1", &messages()).await.unwrap();
    }

    #[tokio::test]
    async fn hourly_window_limit_counts_completions() {
        let config = ExtractionConfig {
            max_extractions_per_hour: 2,
            ..ExtractionConfig::default()
        };
        let (queue, db, _dir) = setup_queue(config).await;

        let j1 = queue.enqueue("user-1", "conv-1", &messages()).await.unwrap();
        queries::jobs::mark_processing(&db, &j1).await.unwrap();
        queries::jobs::mark_completed(&db, &j1, 1).await.unwrap();

        let j2 = queue.enqueue("user-1", "conv-2", &messages()).await.unwrap();
        queries::jobs::mark_processing(&db, &j2).await.unwrap();
        queries::jobs::mark_completed(&db, &j2, 1).await.unwrap();

        // Both completions sit inside the window.
        let err = queue
            .enqueue("user-1", "conv-3", &messages())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::RateLimited(_)));
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn failed_jobs_do_not_consume_the_window() {
        let config = ExtractionConfig {
            max_extractions_per_hour: 2,
            ..ExtractionConfig::default()
        };
        let (queue, db, _dir) = setup_queue(config).await;

        for conv in ["conv-1", "conv-2"] {
            let id = queue.enqueue("user-1", conv, &messages()).await.unwrap();
            queries::jobs::mark_processing(&db, &id).await.unwrap();
            queries::jobs::mark_failed(&db, &id, "boom", 3).await.unwrap();
        }

        // Window is clear because failures never count.
        queue.enqueue("user-1", "conv-3", &messages()).await.unwrap();
    }
}
