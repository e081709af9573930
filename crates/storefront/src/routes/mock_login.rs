use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crystal_atelier_core::types::Email;

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::users::SessionResponse;

const SECRET_HEADER: &str = "x-mock-login-secret";

#[derive(Debug, Deserialize)]
pub struct MockLoginQuery {
    email: String,
}

/// Test-only session mint, bypassing the identity provider. The route is
/// only mounted when a shared secret is configured, and the caller must
/// present it in the `x-mock-login-secret` header.
pub async fn mock_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MockLoginQuery>,
) -> Result<Json<SessionResponse>> {
    let expected = state
        .config()
        .mock_login_secret
        .as_ref()
        .ok_or_else(|| AppError::NotFound("not found".to_owned()))?;

    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing mock-login secret".to_owned()))?;
    if presented != expected.expose_secret() {
        return Err(AppError::Unauthorized("bad mock-login secret".to_owned()));
    }

    let email: Email = query
        .email
        .parse()
        .map_err(|e| AppError::InvalidArgument(format!("invalid email: {e}")))?;

    let user = UserRepository::new(state.pool())
        .upsert_by_email(&email, None)
        .await?;
    let tokens = state.tokens().issue_pair(user.id)?;

    tracing::info!(user_id = %user.id, "mock login minted a session");
    Ok(Json(SessionResponse::new(tokens, user)))
}
