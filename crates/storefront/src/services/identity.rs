//! Identity-provider (Google) ID-token verification.
//!
//! Sign-in exchanges a Google ID token for our own token pair. The token is
//! checked against Google's tokeninfo endpoint; the audience must match the
//! configured client ID and the email must be verified. Nothing is retried
//! here - a failed provider call surfaces immediately.

use secrecy::SecretString;
use serde::Deserialize;

use crystal_atelier_core::{Email, EmailError};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Why an identity token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider call itself failed.
    #[error("identity provider request failed: {0}")]
    Provider(#[from] reqwest::Error),

    /// The provider rejected the token.
    #[error("identity token rejected by provider")]
    Rejected,

    /// The token was issued for a different client.
    #[error("identity token audience mismatch")]
    AudienceMismatch,

    /// The provider reports the email as unverified.
    #[error("email not verified with provider")]
    EmailUnverified,

    /// The provider returned an unusable email.
    #[error("invalid email from provider: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// The identity extracted from a verified provider token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: Email,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    email_verified: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Client for verifying Google ID tokens.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    client_id: String,
}

impl IdentityClient {
    /// Create a client for the configured OAuth client ID.
    #[must_use]
    pub fn new(client_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.to_owned(),
        }
    }

    /// Verify an ID token and extract the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the provider call fails, rejects
    /// the token, the audience mismatches, or the email is unverified.
    pub async fn verify(&self, id_token: &SecretString) -> Result<VerifiedIdentity, IdentityError> {
        use secrecy::ExposeSecret;

        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token.expose_secret())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected);
        }

        let info: TokenInfo = response.json().await?;

        if info.aud != self.client_id {
            return Err(IdentityError::AudienceMismatch);
        }

        if info.email_verified.as_deref() != Some("true") {
            return Err(IdentityError::EmailUnverified);
        }

        let email = Email::parse(&info.email)?;
        Ok(VerifiedIdentity {
            email,
            name: info.name,
        })
    }
}
