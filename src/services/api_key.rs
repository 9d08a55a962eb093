//! API key generation and verification.

use sha2::{Digest, Sha256};

use crate::db::{DbPool, users as db};
use crate::error::{AppError, AppResult};
use crate::models::User;

/// API key prefix.
const KEY_PREFIX: &str = "lm_";
/// Length of the key prefix that may appear in logs.
pub const KEY_LOG_PREFIX_LENGTH: usize = 8;

/// Generate a new random API key: `lm_` followed by 64 hex characters.
///
/// Returns the full key (to be shown to the user once) and its hash.
pub fn generate_key() -> (String, String) {
    let random: [u8; 32] = rand::random();
    let full_key = format!("{}{}", KEY_PREFIX, hex::encode(random));
    let key_hash = hash_key(&full_key);
    (full_key, key_hash)
}

/// Hash an API key using SHA-256.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolve the user owning `key`.
pub async fn verify_key(pool: &DbPool, key: &str) -> AppResult<User> {
    if !key.starts_with(KEY_PREFIX) {
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    db::find_by_key_hash(pool.connection(), &hash_key(key))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))
}
