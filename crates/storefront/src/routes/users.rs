use axum::extract::State;
use axum::Json;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::db::users::UserRepository;
use crate::error::Result;
use crate::models::User;
use crate::services::auth::TokenPair;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    tokens: TokenPair,
    user: User,
}

impl SessionResponse {
    pub(crate) const fn new(tokens: TokenPair, user: User) -> Self {
        Self { tokens, user }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    id_token: SecretString,
}

/// Exchange an identity-provider ID token for a session. Creates the
/// user row on first sign-in, keyed by verified email.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<SessionResponse>> {
    let identity = state.identity().verify(&body.id_token).await?;

    let user = UserRepository::new(state.pool())
        .upsert_by_email(&identity.email, identity.name.as_deref())
        .await?;
    let tokens = state.tokens().issue_pair(user.id)?;

    tracing::info!(user_id = %user.id, "user signed in");
    Ok(Json(SessionResponse::new(tokens, user)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    refresh_token: String,
}

/// Rotate a refresh token into a fresh pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>> {
    let (user_id, tokens) = state.tokens().refresh(&body.refresh_token)?;

    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| {
            crate::error::AppError::Unauthorized("refresh token for unknown user".to_owned())
        })?;

    Ok(Json(SessionResponse::new(tokens, user)))
}
