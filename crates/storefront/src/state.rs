//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AtelierConfig;
use crate::services::auth::{AdminTokenService, TokenService};
use crate::services::identity::IdentityClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and token services. No
/// per-request mutable state lives here; everything durable is in the
/// database.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AtelierConfig,
    pool: PgPool,
    tokens: TokenService,
    admin_tokens: AdminTokenService,
    identity: IdentityClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AtelierConfig, pool: PgPool) -> Self {
        let tokens = TokenService::new(
            config.access_token_secret.clone(),
            config.refresh_token_secret.clone(),
        );
        let admin_tokens = AdminTokenService::new(config.admin_token_secret.clone());
        let identity = IdentityClient::new(&config.google_client_id);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                admin_tokens,
                identity,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AtelierConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the customer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the admin token service.
    #[must_use]
    pub fn admin_tokens(&self) -> &AdminTokenService {
        &self.inner.admin_tokens
    }

    /// Get a reference to the identity-provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }
}
