use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

/// Key used to sign test tokens. The default verifier never checks it.
pub const TEST_SIGNING_KEY: &str = "test-signing-key-at-least-32-characters";

/// A platform-style access token for `sub`, valid for an hour.
pub fn token_for(sub: &str) -> String {
    mint(json!({
        "sub": sub,
        "aud": "authenticated",
        "role": "authenticated",
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

pub fn mint(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SIGNING_KEY.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn bearer(sub: &str) -> String {
    format!("Bearer {}", token_for(sub))
}
