// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-facing model types.
//!
//! The canonical entity types live in `mnemo-core::types` for use across
//! trait boundaries; this module re-exports them and adds the input and
//! filter shapes that only the query layer needs.

pub use mnemo_core::types::{
    ConversationEngagement, ExtractionJob, JobStatus, Memory, MemoryCategory, MemoryStats,
};

/// Input for inserting a new memory (or reinforcing an existing one with
/// the same content hash).
#[derive(Debug, Clone)]
pub struct MemoryDraft {
    /// Identifier to assign if this draft creates a new row. Ignored on
    /// reinforcement, where the existing row's ID wins.
    pub id: String,
    pub user_id: String,
    pub conversation_id: String,
    pub encrypted_content: String,
    pub content_hash: String,
    pub category: MemoryCategory,
    pub tags: Vec<String>,
    /// Initial relevance score.
    pub score: f64,
    pub source_engagement: f64,
}

/// Filter and pagination options for listing memories.
#[derive(Debug, Clone)]
pub struct MemoryFilter {
    pub user_id: String,
    /// Restrict to one category.
    pub category: Option<MemoryCategory>,
    /// Require every listed tag to be present.
    pub tags: Vec<String>,
    /// Include archived memories. Default listings exclude them.
    pub include_archived: bool,
    /// 1-based page number.
    pub page: i64,
    pub page_size: i64,
}

impl MemoryFilter {
    /// A filter matching all active memories for a user, first page.
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            category: None,
            tags: Vec::new(),
            include_archived: false,
            page: 1,
            page_size: 50,
        }
    }
}

/// The per-memory inputs the decay pass needs to recompute a score.
#[derive(Debug, Clone)]
pub struct ScoringRow {
    pub id: String,
    pub created_at: String,
    pub last_accessed_at: Option<String>,
    pub access_count: i64,
    pub source_engagement: f64,
    pub score: f64,
}

/// One score update produced by the decay pass.
#[derive(Debug, Clone)]
pub struct ScoreUpdate {
    pub id: String,
    pub score: f64,
    /// Archive the memory in the same transaction.
    pub archive: bool,
}
