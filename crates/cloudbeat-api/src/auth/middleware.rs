use crate::auth::models::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cloudbeat_core::AppError;
use std::sync::Arc;

pub const MISSING_TOKEN: &str = "Authorization token is missing";

/// Bearer token from `Authorization: Bearer <token>` (scheme case-insensitive).
///
/// Anything other than exactly two whitespace-separated parts is treated as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Gate for caller-scoped routes: resolves the bearer token to an [`AuthContext`]
/// and stores it in request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            return HttpAppError(AppError::Unauthenticated(MISSING_TOKEN.to_string()))
                .into_response();
        }
    };

    let user_id = match state.verifier.subject(&token).await {
        Ok(user_id) => user_id,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(user_id = %user_id, "Request authenticated");
    request
        .extensions_mut()
        .insert(AuthContext { user_id, token });
    next.run(request).await
}
