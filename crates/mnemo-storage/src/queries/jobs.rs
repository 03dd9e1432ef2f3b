// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for extraction jobs.
//!
//! Jobs are append-only rows that move `pending -> processing` and then
//! to a terminal `completed` or `failed`. Failed jobs stay failed; the
//! caller decides whether to enqueue fresh work.

use mnemo_core::MnemoError;
use mnemo_core::types::now_iso;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ExtractionJob, JobStatus};

const JOB_COLUMNS: &str = "id, user_id, conversation_id, message_count, encrypted_messages, \
     status, attempt_count, error_message, created_at, processed_at";

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<ExtractionJob, rusqlite::Error> {
    let status: String = row.get(5)?;
    Ok(ExtractionJob {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        message_count: row.get(3)?,
        encrypted_messages: row.get(4)?,
        status: JobStatus::from_str_value(&status),
        attempt_count: row.get(6)?,
        error_message: row.get(7)?,
        created_at: row.get(8)?,
        processed_at: row.get(9)?,
    })
}

/// Insert a new job.
pub async fn insert(db: &Database, job: &ExtractionJob) -> Result<(), MnemoError> {
    let job = job.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO extraction_jobs (id, user_id, conversation_id, message_count, \
                 encrypted_messages, status, attempt_count, error_message, created_at, \
                 processed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    job.id,
                    job.user_id,
                    job.conversation_id,
                    job.message_count,
                    job.encrypted_messages,
                    job.status.as_str(),
                    job.attempt_count,
                    job.error_message,
                    job.created_at,
                    job.processed_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one job by ID.
pub async fn get(db: &Database, id: &str) -> Result<Option<ExtractionJob>, MnemoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            use rusqlite::OptionalExtension;
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM extraction_jobs WHERE id = ?1"
            ))?;
            let job = stmt.query_row(params![id], row_to_job).optional()?;
            Ok(job)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of pending jobs for one user.
pub async fn count_pending(db: &Database, user_id: &str) -> Result<i64, MnemoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM extraction_jobs WHERE user_id = ?1 AND status = 'pending'",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Jobs counting against a user's sliding rate window.
///
/// In-flight jobs always count; completed jobs count while their
/// `processed_at` is after the cutoff. Failed jobs never count, so a
/// run of failures cannot starve a user.
pub async fn count_recent_window(
    db: &Database,
    user_id: &str,
    cutoff_iso: &str,
) -> Result<i64, MnemoError> {
    let user_id = user_id.to_string();
    let cutoff = cutoff_iso.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM extraction_jobs WHERE user_id = ?1 AND \
                 (status IN ('pending', 'processing') \
                  OR (status = 'completed' AND processed_at >= ?2))",
                params![user_id, cutoff],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The oldest pending jobs, up to `limit`.
pub async fn list_pending(db: &Database, limit: i64) -> Result<Vec<ExtractionJob>, MnemoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM extraction_jobs WHERE status = 'pending' \
                 ORDER BY created_at ASC LIMIT ?1"
            ))?;
            let jobs = stmt
                .query_map(params![limit], row_to_job)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(jobs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim a pending job for processing.
///
/// Returns `false` if the job was not in `pending` state, so two
/// processors cannot both claim it.
pub async fn mark_processing(db: &Database, id: &str) -> Result<bool, MnemoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE extraction_jobs SET status = 'processing' \
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a job completed and stamp `processed_at`.
pub async fn mark_completed(db: &Database, id: &str, attempt_count: i64) -> Result<(), MnemoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE extraction_jobs SET status = 'completed', attempt_count = ?1, \
                 error_message = NULL, processed_at = ?2 WHERE id = ?3",
                params![attempt_count, now_iso(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a job failed with its final error. Terminal state.
pub async fn mark_failed(
    db: &Database,
    id: &str,
    error_message: &str,
    attempt_count: i64,
) -> Result<(), MnemoError> {
    let id = id.to_string();
    let error_message = error_message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE extraction_jobs SET status = 'failed', attempt_count = ?1, \
                 error_message = ?2, processed_at = ?3 WHERE id = ?4",
                params![attempt_count, error_message, now_iso(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
