// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user payload encryption for the Mnemo memory pipeline.
//!
//! Implements the [`mnemo_core::Encryption`] collaborator with
//! AES-256-GCM and per-user subkeys derived from a single master key
//! via HKDF-SHA256. Memory content and job payloads are never stored
//! in plaintext; this crate is where they get sealed.

pub mod crypto;
pub mod encryption;
pub mod keys;

pub use encryption::UserVault;
