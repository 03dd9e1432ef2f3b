// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Mnemo metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("mnemo_jobs_enqueued_total", "Extraction jobs enqueued");
    describe_counter!(
        "mnemo_jobs_processed_total",
        "Extraction jobs finished, by outcome"
    );
    describe_counter!(
        "mnemo_enqueue_rejected_total",
        "Enqueue attempts rejected by backpressure or the rate window"
    );
    describe_counter!(
        "mnemo_extraction_attempts_total",
        "Model extraction attempts, by model and outcome"
    );
    describe_counter!(
        "mnemo_memories_stored_total",
        "Memories written, new or reinforced"
    );
    describe_counter!("mnemo_memories_archived_total", "Memories auto-archived by decay");
    describe_gauge!("mnemo_pool_healthy_extractors", "Healthy extractor models in the pool");
    describe_histogram!(
        "mnemo_job_duration_seconds",
        "Wall time to process one extraction job"
    );
}

/// Record an accepted enqueue.
pub fn record_job_enqueued() {
    metrics::counter!("mnemo_jobs_enqueued_total").increment(1);
}

/// Record an enqueue rejected before persisting anything.
pub fn record_enqueue_rejected(reason: &'static str) {
    metrics::counter!("mnemo_enqueue_rejected_total", "reason" => reason).increment(1);
}

/// Record a finished job.
pub fn record_job_processed(outcome: &'static str) {
    metrics::counter!("mnemo_jobs_processed_total", "outcome" => outcome).increment(1);
}

/// Record one model attempt.
pub fn record_extraction_attempt(model: &str, outcome: &'static str) {
    metrics::counter!(
        "mnemo_extraction_attempts_total",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a stored memory.
pub fn record_memory_stored(reinforced: bool) {
    let kind = if reinforced { "reinforced" } else { "new" };
    metrics::counter!("mnemo_memories_stored_total", "kind" => kind).increment(1);
}

/// Record memories archived by a decay pass.
pub fn record_memories_archived(count: u64) {
    metrics::counter!("mnemo_memories_archived_total").increment(count);
}

/// Set the number of healthy extractors.
pub fn set_pool_healthy(count: f64) {
    metrics::gauge!("mnemo_pool_healthy_extractors").set(count);
}

/// Record how long one job took to process.
pub fn record_job_duration(seconds: f64) {
    metrics::histogram!("mnemo_job_duration_seconds").record(seconds);
}
