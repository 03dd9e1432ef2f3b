// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic score decay and auto-archival.
//!
//! Recomputes every active memory's score as a weighted blend of
//! recency, access frequency, and source engagement, then archives
//! memories falling below the configured threshold. Archival is the
//! soft kind and fully reversible.

use chrono::{DateTime, NaiveDateTime, Utc};
use mnemo_config::model::DecayConfig;
use mnemo_core::types::TIMESTAMP_FORMAT;
use mnemo_core::MnemoError;
use mnemo_storage::models::{ScoreUpdate, ScoringRow};
use mnemo_storage::{queries, Database};
use tracing::{info, warn};

use crate::recording;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Outcome of one decay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Users with at least one active memory.
    pub users: usize,
    /// Memories whose score was recomputed.
    pub recalculated: usize,
    /// Memories newly archived this pass.
    pub archived: usize,
}

/// Recompute scores for all active memories and archive the ones below
/// the threshold.
pub async fn run_decay(db: &Database, config: &DecayConfig) -> Result<DecayReport, MnemoError> {
    let now = Utc::now();
    let user_ids = queries::memories::active_user_ids(db).await?;

    let mut report = DecayReport {
        users: user_ids.len(),
        ..DecayReport::default()
    };

    for user_id in &user_ids {
        let rows = queries::memories::active_scoring_rows(db, user_id).await?;
        let updates: Vec<ScoreUpdate> = rows
            .iter()
            .map(|row| {
                let score = memory_score(row, now, config);
                ScoreUpdate {
                    id: row.id.clone(),
                    score,
                    archive: score < config.archive_threshold,
                }
            })
            .collect();

        let (rescored, archived) = queries::memories::apply_score_updates(db, updates).await?;
        report.recalculated += rescored;
        report.archived += archived;
    }

    if report.archived > 0 {
        recording::record_memories_archived(report.archived as u64);
    }
    info!(
        users = report.users,
        recalculated = report.recalculated,
        archived = report.archived,
        "decay pass finished"
    );
    Ok(report)
}

/// The decayed score of one memory at `now`.
///
/// Recency is measured from the last access, falling back to creation
/// for never-accessed memories.
fn memory_score(row: &ScoringRow, now: DateTime<Utc>, config: &DecayConfig) -> f64 {
    let reference = row.last_accessed_at.as_deref().unwrap_or(&row.created_at);
    let days = days_since(reference, now);
    let recency = (-config.recency_decay_rate * days).exp();

    let frequency = if row.access_count <= 0 {
        0.0
    } else {
        (row.access_count as f64 / config.frequency_max as f64).min(1.0)
    };

    config.recency_weight * recency
        + config.frequency_weight * frequency
        + config.engagement_weight * row.source_engagement
}

fn days_since(timestamp: &str, now: DateTime<Utc>) -> f64 {
    let parsed = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|e| {
            warn!(timestamp, error = %e, "unparseable timestamp, treating as now");
            now
        });
    let seconds = (now - parsed).num_seconds().max(0) as f64;
    seconds / SECONDS_PER_DAY
}
