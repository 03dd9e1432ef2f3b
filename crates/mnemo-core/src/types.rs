// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Mnemo workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single deduplicated fact about a user.
///
/// Content is stored encrypted; the SHA-256 hash of the normalized
/// plaintext is the dedup key, unique per `(user_id, content_hash)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier for this memory.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Conversation that produced (or last reinforced) this memory.
    pub conversation_id: String,
    /// AES-256-GCM encrypted content, base64 wire format. Never plaintext.
    #[serde(skip_serializing)]
    pub encrypted_content: String,
    /// SHA-256 hex of the normalized content, used purely as an equality key.
    pub content_hash: String,
    /// Fact category.
    pub category: MemoryCategory,
    /// Searchable tags. Order-irrelevant, deduplicated on write.
    pub tags: Vec<String>,
    /// Current relevance score. Soft range [0, 1]; reinforcement is capped at 1.0.
    pub score: f64,
    /// How many times this memory was selected at retrieval time.
    pub access_count: i64,
    /// ISO 8601 timestamp of the last retrieval-time access.
    pub last_accessed_at: Option<String>,
    /// Soft-delete flag. Archived memories are excluded from default listings.
    pub is_archived: bool,
    /// ISO 8601 timestamp of archival.
    pub archived_at: Option<String>,
    /// Engagement score of the conversation this memory came from (max seen).
    pub source_engagement: f64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
    /// Incremented on every write.
    pub version: i64,
}

/// A memory with decrypted content, for internal use only.
#[derive(Debug, Clone)]
pub struct DecryptedMemory {
    pub memory: Memory,
    pub content: String,
}

/// Category of an extracted fact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    /// Name, location, occupation, family, age.
    PersonalInfo,
    /// Likes, dislikes, style, communication preferences.
    Preferences,
    /// Ongoing projects, goals, responsibilities.
    Context,
    /// Skills, knowledge, experiences.
    Fact,
    /// Guidelines the user wants followed.
    Instruction,
}

impl MemoryCategory {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::PersonalInfo => "personal_info",
            MemoryCategory::Preferences => "preferences",
            MemoryCategory::Context => "context",
            MemoryCategory::Fact => "fact",
            MemoryCategory::Instruction => "instruction",
        }
    }

    /// Parse from SQLite string. Unrecognized values map to `Fact`.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "personal_info" => MemoryCategory::PersonalInfo,
            "preferences" => MemoryCategory::Preferences,
            "context" => MemoryCategory::Context,
            "instruction" => MemoryCategory::Instruction,
            _ => MemoryCategory::Fact,
        }
    }
}

/// Lifecycle status of an extraction job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be picked up by the processor.
    Pending,
    /// Currently being processed.
    Processing,
    /// Terminal success.
    Completed,
    /// Terminal failure. Jobs are never automatically re-queued.
    Failed,
}

impl JobStatus {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

/// One request to extract memories from a conversation slice.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub id: String,
    pub user_id: String,
    pub conversation_id: String,
    /// Number of messages in the encrypted payload.
    pub message_count: i64,
    /// Encrypted JSON-serialized message batch. Never plaintext at rest.
    pub encrypted_messages: String,
    pub status: JobStatus,
    pub attempt_count: i64,
    pub error_message: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

/// Engagement snapshot for one `(user, conversation)` pair, upserted per
/// processed job.
#[derive(Debug, Clone)]
pub struct ConversationEngagement {
    pub user_id: String,
    pub conversation_id: String,
    pub message_count: i64,
    pub user_message_count: i64,
    /// Average user message length in bytes.
    pub avg_response_length: i64,
    /// Computed engagement score in [0, 1].
    pub engagement_score: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate statistics over one user's memories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total: i64,
    pub active: i64,
    pub archived: i64,
    /// Average score over active (non-archived) memories only.
    pub avg_active_score: f64,
}

/// A single conversation message passed to the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A fact extracted from a conversation by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFact {
    /// The fact as a standalone statement.
    pub content: String,
    /// Fact category.
    pub category: MemoryCategory,
    /// Relevant searchability tags.
    pub tags: Vec<String>,
}

/// Structured output returned by the extraction model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub memories: Vec<ExtractedFact>,
}

/// Connection details for a resolved LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Bearer token for the provider.
    pub api_key: String,
}

/// ISO 8601 timestamp format used everywhere in storage.
///
/// Fixed-width so timestamps compare correctly as strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time in the canonical storage format.
pub fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
