// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD and dedup operations for the `memories` table.
//!
//! The create path is a read-then-write upsert keyed on
//! `(user_id, content_hash)`. Both steps run inside one transaction in a
//! single `call` closure, so two jobs extracting the same fact cannot
//! both insert; the unique index is a backstop, not the primary
//! mechanism.

use mnemo_core::MnemoError;
use mnemo_core::types::now_iso;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::Database;
use crate::models::{Memory, MemoryCategory, MemoryDraft, MemoryFilter, MemoryStats};
use crate::models::{ScoreUpdate, ScoringRow};

/// Score increment applied when a duplicate fact is re-extracted.
pub const REINFORCEMENT_BOOST: f64 = 0.1;

const MEMORY_COLUMNS: &str = "id, user_id, conversation_id, encrypted_content, content_hash, \
     category, tags, score, access_count, last_accessed_at, is_archived, archived_at, \
     source_engagement, created_at, updated_at, version";

fn row_to_memory(row: &rusqlite::Row<'_>) -> Result<Memory, rusqlite::Error> {
    let category: String = row.get(5)?;
    let tags_json: String = row.get(6)?;
    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        encrypted_content: row.get(3)?,
        content_hash: row.get(4)?,
        category: MemoryCategory::from_str_value(&category),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        score: row.get(7)?,
        access_count: row.get(8)?,
        last_accessed_at: row.get(9)?,
        is_archived: row.get(10)?,
        archived_at: row.get(11)?,
        source_engagement: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
        version: row.get(15)?,
    })
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Drop repeated tags, keeping first-seen order.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Insert a new memory, or reinforce the existing one with the same
/// content hash.
///
/// Reinforcement unions tags, bumps the score by [`REINFORCEMENT_BOOST`]
/// (capped at 1.0), keeps the higher source engagement, and increments
/// the version. Returns the stored memory and whether it was a
/// reinforcement.
pub async fn create_or_reinforce(
    db: &Database,
    draft: MemoryDraft,
) -> Result<(Memory, bool), MnemoError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories \
                     WHERE user_id = ?1 AND content_hash = ?2"
                ))?;
                stmt.query_row(params![draft.user_id, draft.content_hash], row_to_memory)
                    .optional()?
            };

            let now = now_iso();
            let (memory, reinforced) = match existing {
                Some(mut mem) => {
                    for tag in &draft.tags {
                        if !mem.tags.contains(tag) {
                            mem.tags.push(tag.clone());
                        }
                    }
                    mem.score = (mem.score + REINFORCEMENT_BOOST).min(1.0);
                    mem.source_engagement = mem.source_engagement.max(draft.source_engagement);
                    mem.updated_at = now;
                    mem.version += 1;

                    tx.execute(
                        "UPDATE memories SET tags = ?1, score = ?2, source_engagement = ?3, \
                         updated_at = ?4, version = ?5 WHERE id = ?6",
                        params![
                            tags_to_json(&mem.tags),
                            mem.score,
                            mem.source_engagement,
                            mem.updated_at,
                            mem.version,
                            mem.id,
                        ],
                    )?;
                    (mem, true)
                }
                None => {
                    let mem = Memory {
                        id: draft.id,
                        user_id: draft.user_id,
                        conversation_id: draft.conversation_id,
                        encrypted_content: draft.encrypted_content,
                        content_hash: draft.content_hash,
                        category: draft.category,
                        tags: dedup_tags(draft.tags),
                        score: draft.score,
                        access_count: 0,
                        last_accessed_at: None,
                        is_archived: false,
                        archived_at: None,
                        source_engagement: draft.source_engagement,
                        created_at: now.clone(),
                        updated_at: now,
                        version: 1,
                    };
                    tx.execute(
                        "INSERT INTO memories (id, user_id, conversation_id, encrypted_content, \
                         content_hash, category, tags, score, access_count, last_accessed_at, \
                         is_archived, archived_at, source_engagement, created_at, updated_at, \
                         version) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, 0, NULL, ?9, ?10, ?11, 1)",
                        params![
                            mem.id,
                            mem.user_id,
                            mem.conversation_id,
                            mem.encrypted_content,
                            mem.content_hash,
                            mem.category.as_str(),
                            tags_to_json(&mem.tags),
                            mem.score,
                            mem.source_engagement,
                            mem.created_at,
                            mem.updated_at,
                        ],
                    )?;
                    (mem, false)
                }
            };

            tx.commit()?;
            Ok((memory, reinforced))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one memory by ID, scoped to its owner.
pub async fn get(db: &Database, user_id: &str, id: &str) -> Result<Option<Memory>, MnemoError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMORY_COLUMNS} FROM memories WHERE user_id = ?1 AND id = ?2"
            ))?;
            let mem = stmt
                .query_row(params![user_id, id], row_to_memory)
                .optional()?;
            Ok(mem)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List memories matching the filter, newest and strongest first.
///
/// Returns the page of results plus the total match count for pagination.
pub async fn list(db: &Database, filter: MemoryFilter) -> Result<(Vec<Memory>, i64), MnemoError> {
    db.connection()
        .call(move |conn| {
            let mut clauses = vec!["user_id = ?".to_string()];
            let mut values = vec![filter.user_id.clone()];

            if !filter.include_archived {
                clauses.push("is_archived = 0".to_string());
            }
            if let Some(category) = filter.category {
                clauses.push("category = ?".to_string());
                values.push(category.as_str().to_string());
            }
            for tag in &filter.tags {
                clauses.push(
                    "EXISTS (SELECT 1 FROM json_each(memories.tags) WHERE json_each.value = ?)"
                        .to_string(),
                );
                values.push(tag.clone());
            }
            let where_sql = clauses.join(" AND ");

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM memories WHERE {where_sql}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;

            let page = filter.page.max(1);
            let page_size = filter.page_size.max(1);
            let offset = (page - 1) * page_size;

            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMORY_COLUMNS} FROM memories WHERE {where_sql} \
                 ORDER BY score DESC, updated_at DESC LIMIT {page_size} OFFSET {offset}"
            ))?;
            let memories = stmt
                .query_map(params_from_iter(values.iter()), row_to_memory)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((memories, total))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump access counts for memories selected at retrieval time.
pub async fn record_access(
    db: &Database,
    user_id: &str,
    ids: Vec<String>,
) -> Result<(), MnemoError> {
    if ids.is_empty() {
        return Ok(());
    }
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = now_iso();
            for id in &ids {
                tx.execute(
                    "UPDATE memories SET access_count = access_count + 1, last_accessed_at = ?1 \
                     WHERE user_id = ?2 AND id = ?3",
                    params![now, user_id, id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace a memory's content in place.
///
/// Used for manual edits: re-encrypted content and a fresh hash, with
/// the version bumped. Returns `None` if the memory does not exist.
pub async fn update_content(
    db: &Database,
    user_id: &str,
    id: &str,
    encrypted_content: &str,
    content_hash: &str,
    category: MemoryCategory,
    tags: Vec<String>,
) -> Result<Option<Memory>, MnemoError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    let encrypted_content = encrypted_content.to_string();
    let content_hash = content_hash.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE user_id = ?1 AND id = ?2"
                ))?;
                stmt.query_row(params![user_id, id], row_to_memory)
                    .optional()?
            };

            let Some(mut mem) = existing else {
                tx.commit()?;
                return Ok(None);
            };

            mem.encrypted_content = encrypted_content;
            mem.content_hash = content_hash;
            mem.category = category;
            mem.tags = dedup_tags(tags);
            mem.updated_at = now_iso();
            mem.version += 1;

            tx.execute(
                "UPDATE memories SET encrypted_content = ?1, content_hash = ?2, category = ?3, \
                 tags = ?4, updated_at = ?5, version = ?6 WHERE id = ?7",
                params![
                    mem.encrypted_content,
                    mem.content_hash,
                    mem.category.as_str(),
                    tags_to_json(&mem.tags),
                    mem.updated_at,
                    mem.version,
                    mem.id,
                ],
            )?;
            tx.commit()?;
            Ok(Some(mem))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Archive or unarchive a memory. Returns whether a row was changed.
pub async fn set_archived(
    db: &Database,
    user_id: &str,
    id: &str,
    archived: bool,
) -> Result<bool, MnemoError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let now = now_iso();
            let changed = if archived {
                conn.execute(
                    "UPDATE memories SET is_archived = 1, archived_at = ?1, updated_at = ?1 \
                     WHERE user_id = ?2 AND id = ?3",
                    params![now, user_id, id],
                )?
            } else {
                conn.execute(
                    "UPDATE memories SET is_archived = 0, archived_at = NULL, updated_at = ?1 \
                     WHERE user_id = ?2 AND id = ?3",
                    params![now, user_id, id],
                )?
            };
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Permanently delete a memory. Returns whether a row was deleted.
pub async fn delete(db: &Database, user_id: &str, id: &str) -> Result<bool, MnemoError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM memories WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Aggregate counts and average active score for one user.
pub async fn stats(db: &Database, user_id: &str) -> Result<MemoryStats, MnemoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let stats = conn.query_row(
                "SELECT COUNT(*), \
                 COALESCE(SUM(CASE WHEN is_archived = 0 THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN is_archived = 1 THEN 1 ELSE 0 END), 0), \
                 COALESCE(AVG(CASE WHEN is_archived = 0 THEN score END), 0.0) \
                 FROM memories WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(MemoryStats {
                        total: row.get(0)?,
                        active: row.get(1)?,
                        archived: row.get(2)?,
                        avg_active_score: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Users that currently have at least one active memory.
pub async fn active_user_ids(db: &Database) -> Result<Vec<String>, MnemoError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT user_id FROM memories WHERE is_archived = 0")?;
            let users = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(users)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The scoring inputs for every active memory of one user.
pub async fn active_scoring_rows(
    db: &Database,
    user_id: &str,
) -> Result<Vec<ScoringRow>, MnemoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, last_accessed_at, access_count, source_engagement, score \
                 FROM memories WHERE user_id = ?1 AND is_archived = 0",
            )?;
            let rows = stmt
                .query_map(params![user_id], |row| {
                    Ok(ScoringRow {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        last_accessed_at: row.get(2)?,
                        access_count: row.get(3)?,
                        source_engagement: row.get(4)?,
                        score: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a batch of recomputed scores in one transaction.
///
/// Returns `(rescored, archived)` counts.
pub async fn apply_score_updates(
    db: &Database,
    updates: Vec<ScoreUpdate>,
) -> Result<(usize, usize), MnemoError> {
    if updates.is_empty() {
        return Ok((0, 0));
    }
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now = now_iso();
            let mut archived = 0usize;
            for update in &updates {
                if update.archive {
                    tx.execute(
                        "UPDATE memories SET score = ?1, is_archived = 1, archived_at = ?2, \
                         updated_at = ?2 WHERE id = ?3",
                        params![update.score, now, update.id],
                    )?;
                    archived += 1;
                } else {
                    tx.execute(
                        "UPDATE memories SET score = ?1, updated_at = ?2 WHERE id = ?3",
                        params![update.score, now, update.id],
                    )?;
                }
            }
            tx.commit()?;
            Ok((updates.len(), archived))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
