//! Authentication extractors.
//!
//! Bearer-token extraction for route handlers. `RequireAdmin` is the single
//! admin gate: every admin-only operation goes through it, never through an
//! inlined secret comparison at the call site.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crystal_atelier_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// Pull the bearer token out of the Authorization header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Extractor that requires a valid customer access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("hello, user {user_id}")
/// }
/// ```
pub struct RequireUser(pub UserId);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;
        let user_id = state.tokens().verify_access(token)?;
        Ok(Self(user_id))
    }
}

/// Extractor that requires a valid admin token. Carries the admin
/// username from the token's subject.
pub struct RequireAdmin(pub String);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing admin token".to_owned()))?;
        let username = state.admin_tokens().verify(token)?;
        Ok(Self(username))
    }
}
