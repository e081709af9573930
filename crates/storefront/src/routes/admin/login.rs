use axum::extract::State;
use axum::Json;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
}

/// Exchange the configured admin credentials for an admin token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let config = state.config();

    let ok = body.username == config.admin_username
        && body.password.expose_secret() == config.admin_password.expose_secret();
    if !ok {
        tracing::warn!(username = %body.username, "failed admin login attempt");
        return Err(AppError::Unauthorized("invalid credentials".to_owned()));
    }

    let token = state.admin_tokens().issue(&body.username)?;
    tracing::info!(username = %body.username, "admin logged in");
    Ok(Json(LoginResponse { token }))
}
