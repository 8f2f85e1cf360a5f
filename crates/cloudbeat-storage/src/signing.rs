//! Signed tokens for local blob URLs.
//!
//! Token = base64url(expiry_ts (u64 BE) || HMAC-SHA256(secret, expiry_ts || key)).
//! The key is not embedded; it is taken from the request path and must match.

use crate::traits::{StorageError, StorageResult};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EXPIRY_LEN: usize = 8;
const MAC_LEN: usize = 32; // SHA256
const TOKEN_LEN: usize = EXPIRY_LEN + MAC_LEN;

fn mac_for(secret: &[u8], expiry: &[u8], storage_key: &str) -> StorageResult<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
    mac.update(expiry);
    mac.update(storage_key.as_bytes());
    Ok(mac)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Build a token granting read access to `storage_key` until `expires_in` from now.
pub fn create(storage_key: &str, expires_in: Duration, secret: &[u8]) -> StorageResult<String> {
    let expiry_ts = unix_now().saturating_add(expires_in.as_secs());
    let expiry = expiry_ts.to_be_bytes();
    let tag = mac_for(secret, &expiry, storage_key)?.finalize().into_bytes();

    let mut token_bytes = [0u8; TOKEN_LEN];
    token_bytes[..EXPIRY_LEN].copy_from_slice(&expiry);
    token_bytes[EXPIRY_LEN..].copy_from_slice(&tag);

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes))
}

/// Check that `token` was issued for `storage_key` and has not expired.
pub fn verify(token: &str, storage_key: &str, secret: &[u8]) -> StorageResult<()> {
    let invalid = || StorageError::PermissionDenied("Invalid file token".to_string());

    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| invalid())?;
    if decoded.len() != TOKEN_LEN {
        return Err(invalid());
    }

    let (expiry, tag) = decoded.split_at(EXPIRY_LEN);
    mac_for(secret, expiry, storage_key)?
        .verify_slice(tag)
        .map_err(|_| invalid())?;

    let mut expiry_bytes = [0u8; EXPIRY_LEN];
    expiry_bytes.copy_from_slice(expiry);
    if unix_now() > u64::from_be_bytes(expiry_bytes) {
        return Err(StorageError::PermissionDenied(
            "File token has expired".to_string(),
        ));
    }

    Ok(())
}
