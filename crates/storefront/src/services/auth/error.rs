//! Authentication error types.

/// Why a token failed verification. All variants are treated as
/// unauthenticated by handlers; none ever panics the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Signature does not match the signing secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token's `exp` has passed.
    #[error("token expired")]
    Expired,

    /// Not a parseable JWT, or claims are the wrong shape.
    #[error("malformed token")]
    Malformed,

    /// A refresh token presented as an access token, or vice versa.
    #[error("wrong token kind")]
    WrongKind,

    /// Token could not be signed (bad key material).
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
