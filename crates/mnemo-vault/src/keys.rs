// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key lifecycle and per-user subkey derivation.
//!
//! The master key is 32 uniform random bytes stored in a key file
//! (generated on first run). Per-user keys are derived from it with
//! HKDF-SHA256, using the user ID as the expand info, so each user's
//! payloads are sealed under an independent key and no per-user key
//! material is ever persisted.

use std::path::Path;

use mnemo_core::MnemoError;
use ring::hkdf;
use zeroize::Zeroizing;

use crate::crypto;

/// Domain-separation salt for user subkey derivation. Versioned so a
/// future scheme change can re-derive without touching the master key.
const USER_KEY_SALT: &[u8] = b"mnemo.user-key.v1";

struct KeyLen32;

impl hkdf::KeyType for KeyLen32 {
    fn len(&self) -> usize {
        32
    }
}

/// Load the master key from `path`, generating and persisting a fresh
/// one if the file does not exist.
pub fn load_or_generate_master_key(path: &Path) -> Result<Zeroizing<[u8; 32]>, MnemoError> {
    if path.exists() {
        let bytes = std::fs::read(path)
            .map_err(|e| MnemoError::Crypto(format!("failed to read key file: {e}")))?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            MnemoError::Crypto(format!(
                "key file must contain exactly 32 bytes, found {}",
                bytes.len()
            ))
        })?;
        return Ok(Zeroizing::new(key));
    }

    let key = crypto::generate_random_key()?;
    std::fs::write(path, key)
        .map_err(|e| MnemoError::Crypto(format!("failed to write key file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| MnemoError::Crypto(format!("failed to restrict key file mode: {e}")))?;
    }

    tracing::info!(path = %path.display(), "generated new master key");
    Ok(Zeroizing::new(key))
}

/// Derive the 32-byte subkey for a user via HKDF-SHA256.
pub fn derive_user_key(
    master_key: &[u8; 32],
    user_id: &str,
) -> Result<Zeroizing<[u8; 32]>, MnemoError> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, USER_KEY_SALT);
    let prk = salt.extract(master_key);
    // The Okm borrows the info slice until fill.
    let info = [user_id.as_bytes()];
    let okm = prk
        .expand(&info, KeyLen32)
        .map_err(|_| MnemoError::Crypto("HKDF expand failed".to_string()))?;

    let mut key = Zeroizing::new([0u8; 32]);
    okm.fill(key.as_mut())
        .map_err(|_| MnemoError::Crypto("HKDF fill failed".to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_user_key_is_deterministic() {
        let master = [7u8; 32];
        let k1 = derive_user_key(&master, "user-1").unwrap();
        let k2 = derive_user_key(&master, "user-1").unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn different_users_get_different_keys() {
        let master = [7u8; 32];
        let k1 = derive_user_key(&master, "user-1").unwrap();
        let k2 = derive_user_key(&master, "user-2").unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn different_masters_get_different_keys() {
        let k1 = derive_user_key(&[1u8; 32], "user-1").unwrap();
        let k2 = derive_user_key(&[2u8; 32], "user-1").unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn load_or_generate_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnemo.key");

        let generated = load_or_generate_master_key(&path).unwrap();
        assert!(path.exists());

        let reloaded = load_or_generate_master_key(&path).unwrap();
        assert_eq!(*generated, *reloaded);
    }

    #[test]
    fn short_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnemo.key");
        std::fs::write(&path, [0u8; 16]).unwrap();

        assert!(load_or_generate_master_key(&path).is_err());
    }
}
