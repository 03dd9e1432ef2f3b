// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engagement snapshots, one row per `(user, conversation)` pair.

use mnemo_core::MnemoError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::ConversationEngagement;

/// Insert or refresh the engagement snapshot for a conversation.
///
/// On conflict the counters and score are replaced and `updated_at` is
/// refreshed; `created_at` keeps its original value.
pub async fn upsert(db: &Database, snapshot: &ConversationEngagement) -> Result<(), MnemoError> {
    let snapshot = snapshot.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_engagement (user_id, conversation_id, message_count, \
                 user_message_count, avg_response_length, engagement_score, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT (user_id, conversation_id) DO UPDATE SET \
                 message_count = excluded.message_count, \
                 user_message_count = excluded.user_message_count, \
                 avg_response_length = excluded.avg_response_length, \
                 engagement_score = excluded.engagement_score, \
                 updated_at = excluded.updated_at",
                params![
                    snapshot.user_id,
                    snapshot.conversation_id,
                    snapshot.message_count,
                    snapshot.user_message_count,
                    snapshot.avg_response_length,
                    snapshot.engagement_score,
                    snapshot.created_at,
                    snapshot.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the engagement snapshot for one conversation.
pub async fn get(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
) -> Result<Option<ConversationEngagement>, MnemoError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, conversation_id, message_count, user_message_count, \
                 avg_response_length, engagement_score, created_at, updated_at \
                 FROM conversation_engagement WHERE user_id = ?1 AND conversation_id = ?2",
            )?;
            let snapshot = stmt
                .query_row(params![user_id, conversation_id], |row| {
                    Ok(ConversationEngagement {
                        user_id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        message_count: row.get(2)?,
                        user_message_count: row.get(3)?,
                        avg_response_length: row.get(4)?,
                        engagement_score: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                })
                .optional()?;
            Ok(snapshot)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
