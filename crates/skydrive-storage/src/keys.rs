//! Object key generation and validation.

use crate::traits::{StorageError, StorageResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

/// Random bytes behind each object key.
pub const OBJECT_KEY_BYTES: usize = 32;

const MAX_KEY_LEN: usize = 255;

/// Generate a fresh object key: 32 random bytes, URL-safe base64 without padding (43 chars).
pub fn generate_object_key() -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..OBJECT_KEY_BYTES).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Accept only flat keys: one path segment of `[A-Za-z0-9_.-]`, not starting with `.`.
///
/// Every backend checks keys with this before touching the store, so a key
/// can never name a directory or escape the bucket prefix.
pub fn validate_object_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must be 1 to {} characters",
            MAX_KEY_LEN
        )));
    }
    if key.starts_with('.') {
        return Err(StorageError::InvalidKey(
            "Storage key must not start with '.'".to_string(),
        ));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid character {:?}",
            bad
        )));
    }
    Ok(())
}
