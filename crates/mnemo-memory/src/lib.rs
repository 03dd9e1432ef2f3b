// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory pipeline: extraction, storage, and decay.
//!
//! Conversations are enqueued through [`JobQueue`] under per-user
//! backpressure, drained by [`JobProcessor`] against a failover pool of
//! extraction models, and the resulting facts land deduplicated and
//! encrypted in [`MemoryStore`]. [`decay::run_decay`] keeps scores
//! fresh and archives what nobody looks at anymore.

pub mod client;
pub mod decay;
pub mod engagement;
pub mod normalize;
pub mod pool;
pub mod processor;
pub mod prompt;
pub mod queue;
pub mod recording;
pub mod settings;
pub mod store;

pub use client::HttpCompletionClient;
pub use decay::{run_decay, DecayReport};
pub use engagement::{calculate_engagement, Engagement};
pub use pool::{ExtractorPool, PoolStats};
pub use processor::{JobProcessor, ProcessReport};
pub use queue::JobQueue;
pub use settings::StaticSettings;
pub use store::MemoryStore;
