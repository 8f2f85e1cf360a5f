//! Bearer token decoding.
//!
//! The platform that issued the token is the one that enforces access, so by
//! default the gateway only decodes the token for its subject
//! ([`UnverifiedDecoder`]). Deployments that want the gateway to reject forged
//! tokens itself select [`SharedSecretVerifier`] or [`JwksVerifier`](super::jwks::JwksVerifier).

use crate::auth::models::JwtClaims;
use async_trait::async_trait;
use cloudbeat_core::AppError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;

pub const INVALID_TOKEN: &str = "Invalid token";
pub const TOKEN_EXPIRED: &str = "Token expired";

/// Turns a raw bearer token into the caller's subject id.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn subject(&self, token: &str) -> Result<String, AppError>;
}

pub(crate) fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AppError {
    tracing::debug!(error = %err, "JWT decoding failed");
    match err.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthenticated(TOKEN_EXPIRED.to_string()),
        _ => AppError::Unauthenticated(INVALID_TOKEN.to_string()),
    }
}

pub(crate) fn subject_of(claims: JwtClaims) -> Result<String, AppError> {
    claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| AppError::Unauthenticated(INVALID_TOKEN.to_string()))
}

/// Decodes the payload without checking the signature.
///
/// `exp` is still enforced (zero leeway) when the token carries one.
#[derive(Debug, Default, Clone)]
pub struct UnverifiedDecoder;

impl UnverifiedDecoder {
    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_aud = false;
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

#[async_trait]
impl TokenVerifier for UnverifiedDecoder {
    async fn subject(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &Self::validation())
            .map_err(map_jwt_error)?;
        subject_of(data.claims)
    }
}

/// HS256 verification with the project's JWT secret.
pub struct SharedSecretVerifier {
    key: DecodingKey,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn subject(&self, token: &str) -> Result<String, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.leeway = 0;
        let data = decode::<JwtClaims>(token, &self.key, &validation).map_err(map_jwt_error)?;
        subject_of(data.claims)
    }
}
