//! JWT token issuance and verification.
//!
//! Two structurally identical issuers exist: [`TokenService`] mints the
//! customer access/refresh pair (24h / 7d, separate secrets), and
//! [`AdminTokenService`] mints a single long-lived admin token with a
//! `role` claim. A `kind` claim keeps the token families from being
//! interchangeable even if secrets were ever shared.
//!
//! Refresh rotates both tokens; there is no reuse detection, so a client
//! that fails a refresh must discard its session rather than retry in a
//! loop.

pub mod error;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crystal_atelier_core::UserId;

pub use error::AuthError;

const ACCESS_TTL_SECS: u64 = 60 * 60 * 24; // 1 day
const REFRESH_TTL_SECS: u64 = 60 * 60 * 24 * 7; // 7 days
const ADMIN_TTL_SECS: u64 = 60 * 60 * 24 * 7; // 7 days

const KIND_ACCESS: &str = "access";
const KIND_REFRESH: &str = "refresh";
const KIND_ADMIN: &str = "admin";

/// JWT claims shared by all three token kinds.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID for customer tokens, the admin username for admin tokens.
    sub: String,
    /// Token kind discriminant (`access`, `refresh`, `admin`).
    kind: String,
    /// Expiration, seconds since UNIX epoch.
    exp: u64,
    /// Role claim, present only on admin tokens. Checked for presence,
    /// not used for fine-grained authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn now_epoch() -> u64 {
    // Safe cast: timestamps are far from i64::MIN.
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

fn sign(claims: &Claims, secret: &SecretString) -> Result<String, AuthError> {
    Ok(encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )?)
}

/// Decode and validate a token: HS256, `exp` checked (default 60s leeway
/// for clock skew), required claims `exp` + `sub`.
fn verify(token: &str, secret: &SecretString, expected_kind: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    if data.claims.kind != expected_kind {
        return Err(AuthError::WrongKind);
    }

    Ok(data.claims)
}

fn parse_user_id(claims: &Claims) -> Result<UserId, AuthError> {
    claims
        .sub
        .parse::<i32>()
        .map(UserId::new)
        .map_err(|_| AuthError::Malformed)
}

/// Issues and verifies the customer access/refresh token pair.
#[derive(Clone)]
pub struct TokenService {
    access_secret: SecretString,
    refresh_secret: SecretString,
}

impl TokenService {
    /// Create a token service from the two signing secrets.
    #[must_use]
    pub const fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
        }
    }

    /// Mint a fresh access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] only on bad key material.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        let now = now_epoch();
        let access = sign(
            &Claims {
                sub: user_id.to_string(),
                kind: KIND_ACCESS.to_owned(),
                exp: now + ACCESS_TTL_SECS,
                role: None,
            },
            &self.access_secret,
        )?;
        let refresh = sign(
            &Claims {
                sub: user_id.to_string(),
                kind: KIND_REFRESH.to_owned(),
                exp: now + REFRESH_TTL_SECS,
                role: None,
            },
            &self.refresh_secret,
        )?;
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Verify an access token and extract the user it identifies.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on expiry, bad signature, wrong kind, or
    /// malformed payload. Never panics.
    pub fn verify_access(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = verify(token, &self.access_secret, KIND_ACCESS)?;
        parse_user_id(&claims)
    }

    /// Exchange a valid refresh token for a fresh pair. Both tokens
    /// rotate; the old refresh token is not tracked or revoked.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the refresh token is invalid.
    pub fn refresh(&self, refresh_token: &str) -> Result<(UserId, TokenPair), AuthError> {
        let claims = verify(refresh_token, &self.refresh_secret, KIND_REFRESH)?;
        let user_id = parse_user_id(&claims)?;
        let pair = self.issue_pair(user_id)?;
        Ok((user_id, pair))
    }
}

/// Issues and verifies the single long-lived admin token.
#[derive(Clone)]
pub struct AdminTokenService {
    secret: SecretString,
}

impl AdminTokenService {
    /// Create an admin token service from its signing secret.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Mint an admin token for a username.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] only on bad key material.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        sign(
            &Claims {
                sub: username.to_owned(),
                kind: KIND_ADMIN.to_owned(),
                exp: now_epoch() + ADMIN_TTL_SECS,
                role: Some("admin".to_owned()),
            },
            &self.secret,
        )
    }

    /// Verify an admin token. The role claim must be present.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on expiry, bad signature, missing role,
    /// or malformed payload.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let claims = verify(token, &self.secret, KIND_ADMIN)?;
        if claims.role.is_none() {
            return Err(AuthError::Malformed);
        }
        Ok(claims.sub)
    }
}
