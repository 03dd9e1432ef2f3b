// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content normalization and hashing for deduplication.
//!
//! Two phrasings of the same fact should collide: "User prefers
//! dark-mode!" and "user prefers dark mode" normalize to the same
//! string and therefore the same hash. The hash is an equality key
//! only; no similarity matching happens anywhere.

use sha2::{Digest, Sha256};

/// Canonicalize content for hashing.
///
/// Lowercases, maps newlines, tabs, hyphens, and underscores to spaces,
/// strips everything outside `[a-z0-9 ]`, and collapses whitespace runs.
pub fn normalize_content(content: &str) -> String {
    let lowered = content.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| match c {
            '\n' | '\t' | '\r' | '-' | '_' => ' ',
            other => other,
        })
        .collect();
    let stripped: String = spaced
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 hex digest of already-normalized content.
pub fn hash_content(normalized: &str) -> String {
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
