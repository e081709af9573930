//! Integration tests for Crystal Atelier.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! docker compose up -d postgres
//! cargo run -p crystal-atelier-cli -- migrate
//!
//! # Start the server with a mock-login secret set
//! MOCK_LOGIN_SECRET=... cargo run -p crystal-atelier-storefront
//!
//! # Run the ignored integration tests
//! cargo test -p crystal-atelier-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ATELIER_BASE_URL` - Server base URL (default `http://localhost:3000`)
//! - `MOCK_LOGIN_SECRET` - Must match the server's secret
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD` - Admin credentials

use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

/// Base URL for the API server (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("ATELIER_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A logged-in customer session.
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Value,
}

/// Shared context for tests that talk to a running server.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Create a context pointing at the configured server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
        }
    }

    /// Mint a session for a fresh throwaway user via the mock-login route.
    ///
    /// # Panics
    ///
    /// Panics if `MOCK_LOGIN_SECRET` is unset or the request fails.
    pub async fn login_fresh_user(&self) -> Session {
        let email = format!("it-{}@example.com", Uuid::new_v4());
        self.login_as(&email).await
    }

    /// Mint a session for a specific email via the mock-login route.
    ///
    /// # Panics
    ///
    /// Panics if `MOCK_LOGIN_SECRET` is unset or the request fails.
    pub async fn login_as(&self, email: &str) -> Session {
        let secret = std::env::var("MOCK_LOGIN_SECRET")
            .expect("MOCK_LOGIN_SECRET must be set for integration tests");

        let resp = self
            .client
            .get(format!("{}/api/mock-login", self.base_url))
            .header("x-mock-login-secret", secret)
            .query(&[("email", email)])
            .send()
            .await
            .expect("mock-login request failed");
        assert_eq!(resp.status(), 200, "mock-login should succeed");

        let body: Value = resp.json().await.expect("mock-login body");
        Session {
            access_token: body["accessToken"]
                .as_str()
                .expect("accessToken")
                .to_string(),
            refresh_token: body["refreshToken"]
                .as_str()
                .expect("refreshToken")
                .to_string(),
            user: body["user"].clone(),
        }
    }

    /// Log in as the configured admin and return the admin token.
    ///
    /// # Panics
    ///
    /// Panics if the admin credentials are unset or the request fails.
    pub async fn admin_token(&self) -> String {
        let username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = std::env::var("ADMIN_PASSWORD")
            .expect("ADMIN_PASSWORD must be set for integration tests");

        let resp = self
            .client
            .post(format!("{}/api/admin/login", self.base_url))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("admin login request failed");
        assert_eq!(resp.status(), 200, "admin login should succeed");

        let body: Value = resp.json().await.expect("admin login body");
        body["token"].as_str().expect("token").to_string()
    }

    /// Create a product via the admin API and return its JSON.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn create_product(&self, admin_token: &str, name: &str, price: &str) -> Value {
        let resp = self
            .client
            .put(format!("{}/api/product", self.base_url))
            .bearer_auth(admin_token)
            .json(&serde_json::json!({
                "name": name,
                "subtitle": "integration test crystal",
                "price": price,
                "tone": "amethyst",
            }))
            .send()
            .await
            .expect("create product request failed");
        assert_eq!(resp.status(), 201, "product creation should succeed");
        resp.json().await.expect("product body")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
