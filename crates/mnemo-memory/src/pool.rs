// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin extractor model pool with health tracking.
//!
//! Candidates are sorted fastest-first at construction. A model is
//! skipped once it accumulates `failure_threshold` consecutive
//! failures; one success resets its counter. When every candidate is
//! unhealthy the pool falls back to the fastest one rather than
//! refusing work.

use std::collections::HashMap;
use std::sync::Mutex;

use mnemo_config::model::ExtractorModelConfig;
use mnemo_core::MnemoError;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Candidate {
    model_id: String,
    speed_ms: u64,
}

#[derive(Debug, Default)]
struct PoolState {
    index: usize,
    consecutive_failures: HashMap<String, u32>,
}

/// Pool statistics for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub healthy: usize,
}

/// Rotates extraction calls across the configured models.
pub struct ExtractorPool {
    candidates: Vec<Candidate>,
    failure_threshold: u32,
    state: Mutex<PoolState>,
}

impl ExtractorPool {
    /// Build a pool from configured models, sorted fastest first.
    pub fn new(models: &[ExtractorModelConfig], failure_threshold: u32) -> Self {
        let mut candidates: Vec<Candidate> = models
            .iter()
            .map(|m| Candidate {
                model_id: m.id.clone(),
                speed_ms: m.speed_ms,
            })
            .collect();
        candidates.sort_by_key(|c| c.speed_ms);

        for c in &candidates {
            debug!(model = %c.model_id, speed_ms = c.speed_ms, "extractor registered");
        }

        Self {
            candidates,
            failure_threshold,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PoolState> {
        // A panic while holding this lock leaves only counters behind.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The next healthy extractor, round-robin from the fastest.
    ///
    /// Falls back to the fastest candidate when every model is
    /// unhealthy; errors only when the pool is empty.
    pub fn next_extractor(&self) -> Result<String, MnemoError> {
        self.select(None)
    }

    /// The retry candidate after `failed` just failed.
    ///
    /// Never returns `failed` while another candidate exists, even when
    /// the failed model is still below the health threshold. A
    /// single-model pool returns that model.
    pub fn next_extractor_excluding(&self, failed: &str) -> Result<String, MnemoError> {
        self.select(Some(failed))
    }

    fn select(&self, exclude: Option<&str>) -> Result<String, MnemoError> {
        if self.candidates.is_empty() {
            return Err(MnemoError::Provider {
                message: "no extractor models available".to_string(),
                source: None,
            });
        }

        let mut state = self.lock_state();
        for _ in 0..self.candidates.len() {
            let candidate = &self.candidates[state.index];
            state.index = (state.index + 1) % self.candidates.len();

            if Some(candidate.model_id.as_str()) == exclude && self.candidates.len() > 1 {
                continue;
            }
            let failures = state
                .consecutive_failures
                .get(&candidate.model_id)
                .copied()
                .unwrap_or(0);
            if failures >= self.failure_threshold {
                debug!(model = %candidate.model_id, failures, "skipping unhealthy extractor");
                continue;
            }
            return Ok(candidate.model_id.clone());
        }

        // Everything was skipped. Prefer the fastest non-excluded
        // candidate over re-running the one that just failed.
        let fallback = self
            .candidates
            .iter()
            .find(|c| Some(c.model_id.as_str()) != exclude)
            .unwrap_or(&self.candidates[0]);
        warn!(model = %fallback.model_id, "all extractors unhealthy, using fastest");
        Ok(fallback.model_id.clone())
    }

    /// Record a successful call, resetting the model's failure counter.
    pub fn mark_success(&self, model_id: &str) {
        let mut state = self.lock_state();
        state.consecutive_failures.remove(model_id);
    }

    /// Record a failed call.
    pub fn mark_failure(&self, model_id: &str) {
        let mut state = self.lock_state();
        let failures = state
            .consecutive_failures
            .entry(model_id.to_string())
            .or_insert(0);
        *failures += 1;
        if *failures >= self.failure_threshold {
            warn!(model = %model_id, failures = *failures, "extractor marked unhealthy");
        }
    }

    /// Current pool health.
    pub fn stats(&self) -> PoolStats {
        let state = self.lock_state();
        let healthy = self
            .candidates
            .iter()
            .filter(|c| {
                state
                    .consecutive_failures
                    .get(&c.model_id)
                    .copied()
                    .unwrap_or(0)
                    < self.failure_threshold
            })
            .count();
        PoolStats {
            total: self.candidates.len(),
            healthy,
        }
    }
}
