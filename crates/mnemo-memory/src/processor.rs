// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background worker that drains the extraction queue.
//!
//! Each job moves `pending -> processing` and ends `completed` or
//! `failed` in this pass; failed jobs are terminal and are never
//! re-queued. Model choice is re-resolved on every job so admin and
//! user preference changes take effect immediately: system override,
//! then user preference, then the pool.

use std::sync::Arc;
use std::time::Instant;

use mnemo_config::model::ExtractionConfig;
use mnemo_core::traits::{CompletionClient, CompletionRequest, ModelResolver, SettingsLookup};
use mnemo_core::types::{
    now_iso, ChatMessage, ConversationEngagement, DecryptedMemory, ExtractedFacts, ExtractionJob,
};
use mnemo_core::{Encryption, MnemoError};
use mnemo_storage::models::MemoryFilter;
use mnemo_storage::{queries, Database};
use tracing::{debug, info, warn};

use crate::engagement::calculate_engagement;
use crate::pool::ExtractorPool;
use crate::store::MemoryStore;
use crate::{prompt, recording};

/// Jobs picked up per [`JobProcessor::process_pending`] pass.
const PROCESS_BATCH_LIMIT: i64 = 100;
/// Recent memories fed to the model as dedup context.
const EXISTING_CONTEXT_PAGE_SIZE: i64 = 100;
/// Low temperature for consistent structured output.
const EXTRACTION_TEMPERATURE: f64 = 0.3;

/// Outcome counts for one processing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Drains pending extraction jobs against the configured model pool.
pub struct JobProcessor {
    db: Arc<Database>,
    store: Arc<MemoryStore>,
    vault: Arc<dyn Encryption>,
    pool: Arc<ExtractorPool>,
    settings: Arc<dyn SettingsLookup>,
    resolver: Arc<dyn ModelResolver>,
    client: Arc<dyn CompletionClient>,
    config: ExtractionConfig,
}

impl JobProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<Database>,
        store: Arc<MemoryStore>,
        vault: Arc<dyn Encryption>,
        pool: Arc<ExtractorPool>,
        settings: Arc<dyn SettingsLookup>,
        resolver: Arc<dyn ModelResolver>,
        client: Arc<dyn CompletionClient>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            db,
            store,
            vault,
            pool,
            settings,
            resolver,
            client,
            config,
        }
    }

    /// Process all currently pending jobs, oldest first.
    ///
    /// A job that fails is marked `failed` with its final error; the
    /// pass carries on with the rest.
    pub async fn process_pending(&self) -> Result<ProcessReport, MnemoError> {
        let jobs = queries::jobs::list_pending(&self.db, PROCESS_BATCH_LIMIT).await?;
        if jobs.is_empty() {
            return Ok(ProcessReport::default());
        }
        info!(count = jobs.len(), "processing pending extraction jobs");

        let mut report = ProcessReport::default();
        for job in jobs {
            // Lost the claim: another worker got there first.
            if !queries::jobs::mark_processing(&self.db, &job.id).await? {
                continue;
            }
            report.processed += 1;

            let started = Instant::now();
            match self.process_job(&job).await {
                Ok(()) => {
                    queries::jobs::mark_completed(&self.db, &job.id, job.attempt_count).await?;
                    recording::record_job_processed("completed");
                    report.completed += 1;
                    debug!(job_id = %job.id, "extraction job completed");
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "extraction job failed");
                    queries::jobs::mark_failed(
                        &self.db,
                        &job.id,
                        &e.to_string(),
                        job.attempt_count + 1,
                    )
                    .await?;
                    recording::record_job_processed("failed");
                    report.failed += 1;
                }
            }
            recording::record_job_duration(started.elapsed().as_secs_f64());
        }
        Ok(report)
    }

    async fn process_job(&self, job: &ExtractionJob) -> Result<(), MnemoError> {
        let payload = self
            .vault
            .decrypt(&job.user_id, &job.encrypted_messages)
            .await?;
        let messages: Vec<ChatMessage> = serde_json::from_slice(&payload)
            .map_err(|e| MnemoError::Internal(format!("failed to parse job payload: {e}")))?;

        let engagement = calculate_engagement(&messages);
        let now = now_iso();
        let snapshot = ConversationEngagement {
            user_id: job.user_id.clone(),
            conversation_id: job.conversation_id.clone(),
            message_count: engagement.message_count,
            user_message_count: engagement.user_message_count,
            avg_response_length: engagement.avg_user_length,
            engagement_score: engagement.score,
            created_at: now.clone(),
            updated_at: now,
        };
        if let Err(e) = queries::engagement::upsert(&self.db, &snapshot).await {
            warn!(job_id = %job.id, error = %e, "failed to store engagement snapshot");
        }

        let mut filter = MemoryFilter::for_user(&job.user_id);
        filter.page_size = EXISTING_CONTEXT_PAGE_SIZE;
        let existing = match self.store.list(filter).await {
            Ok((memories, _)) => memories,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "failed to fetch existing memories, continuing without context");
                Vec::new()
            }
        };

        let facts = self
            .extract_with_failover(&job.user_id, &messages, &existing)
            .await?;
        debug!(job_id = %job.id, count = facts.memories.len(), "facts extracted");

        for fact in facts.memories {
            if let Err(e) = self
                .store
                .remember(
                    &job.user_id,
                    &job.conversation_id,
                    &fact.content,
                    fact.category,
                    fact.tags,
                    engagement.score,
                )
                .await
            {
                warn!(job_id = %job.id, error = %e, "failed to store extracted fact");
            }
        }
        Ok(())
    }

    /// Run up to `max_attempts` model calls, rotating to a different
    /// model after each failure.
    async fn extract_with_failover(
        &self,
        user_id: &str,
        messages: &[ChatMessage],
        existing: &[DecryptedMemory],
    ) -> Result<ExtractedFacts, MnemoError> {
        let mut model_id = match self.settings.system_extractor_override().await? {
            Some(model) => {
                debug!(model, "using system-assigned extractor");
                model
            }
            None => match self.settings.user_extractor_preference(user_id).await? {
                Some(model) => {
                    debug!(model, "using user-preferred extractor");
                    model
                }
                None => self.pool.next_extractor()?,
            },
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<MnemoError> = None;

        for attempt in 1..=max_attempts {
            match self.try_extraction(&model_id, messages, existing).await {
                Ok(facts) => {
                    self.pool.mark_success(&model_id);
                    recording::record_extraction_attempt(&model_id, "success");
                    recording::set_pool_healthy(self.pool.stats().healthy as f64);
                    return Ok(facts);
                }
                Err(e) => {
                    self.pool.mark_failure(&model_id);
                    recording::record_extraction_attempt(&model_id, "failure");
                    recording::set_pool_healthy(self.pool.stats().healthy as f64);
                    warn!(
                        attempt,
                        max_attempts,
                        model = %model_id,
                        error = %e,
                        "extraction attempt failed"
                    );
                    last_error = Some(e);

                    if attempt < max_attempts {
                        model_id = self.pool.next_extractor_excluding(&model_id)?;
                    }
                }
            }
        }

        let detail = last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        Err(MnemoError::Provider {
            message: format!("extraction failed after {max_attempts} attempts, last error: {detail}"),
            source: last_error.map(|e| Box::new(e) as _),
        })
    }

    async fn try_extraction(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        existing: &[DecryptedMemory],
    ) -> Result<ExtractedFacts, MnemoError> {
        let Some((endpoint, actual_model)) = self.resolver.resolve_model(model_id).await? else {
            return Err(MnemoError::Provider {
                message: format!("model {model_id} not found in providers"),
                source: None,
            });
        };
        debug!(model_id, actual_model, "attempting extraction");

        let transcript = prompt::build_transcript(messages);
        let existing_context = prompt::build_existing_context(existing);
        let request = CompletionRequest {
            model: actual_model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt::EXTRACTION_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt::build_user_prompt(&existing_context, &transcript),
                },
            ],
            temperature: EXTRACTION_TEMPERATURE,
            schema_name: prompt::EXTRACTION_SCHEMA_NAME.to_string(),
            schema: prompt::extraction_schema(),
        };

        let content = self.client.complete_structured(&endpoint, request).await?;

        serde_json::from_str::<ExtractedFacts>(&content).map_err(|e| {
            // Decrypted conversation content never gets logged.
            warn!(
                response_bytes = content.len(),
                error = %e,
                "failed to parse extraction response"
            );
            MnemoError::Provider {
                message: format!("failed to parse extraction: {e}"),
                source: Some(Box::new(e)),
            }
        })
    }
}
