use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cloudbeat_core::{AppError, Credential};
use serde::Deserialize;
use std::fmt;

/// Claims the gateway reads from a bearer token.
#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Identity of the caller, extracted by the auth middleware and stored in request extensions.
#[derive(Clone)]
pub struct AuthContext {
    pub user_id: String,
    /// The bearer token exactly as received; forwarded to the platform.
    pub token: String,
}

impl AuthContext {
    /// Credential that makes collaborator calls on the caller's behalf.
    pub fn credential(&self) -> Credential {
        Credential::caller(self.user_id.clone(), self.token.clone())
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

// Extension cannot be combined with Multipart, so handlers extract this from request parts
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthenticated(
                    "Authorization token is missing".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let ctx = AuthContext {
            user_id: "u-1".to_string(),
            token: "eyJ.secret.sig".to_string(),
        };
        let rendered = format!("{:?}", ctx);
        assert!(rendered.contains("u-1"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_credential_forwards_token() {
        let ctx = AuthContext {
            user_id: "u-1".to_string(),
            token: "tok".to_string(),
        };
        assert_eq!(ctx.credential(), Credential::caller("u-1", "tok"));
    }
}
