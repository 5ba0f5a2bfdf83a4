//! End-to-end tests for the shop API.
//!
//! Tests drive the full router (middleware included) in-process against the
//! in-memory store, so no database or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shop-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `catalog` - Category and product lifecycles
//! - `users` - Registration, login, and account updates
//! - `authorization` - Gate behavior on every protected route

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use shop_api::config::{ApiConfig, TokenConfig};
use shop_api::db::MemoryStore;
use shop_api::models::{NewUser, User};
use shop_api::routes;
use shop_api::services::auth::hash_password;
use shop_api::state::AppState;
use shop_core::{Role, UserId};

/// Signing secret used by every test app.
pub const TEST_SECRET: &str = "q8Z!r2Lm#V7t@Kp4&Xw9^Hd3*Nf6$Bj1";

/// Status and decoded JSON body of a response.
///
/// Non-JSON bodies are kept as a JSON string; empty bodies are `null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A fresh application with an empty in-memory store.
pub struct TestApp {
    state: AppState,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = ApiConfig {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            token: TokenConfig {
                secret: SecretString::from(TEST_SECRET.to_owned()),
                ttl: Duration::hours(2),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        Self {
            state: AppState::new(config, Arc::new(MemoryStore::new())),
        }
    }

    /// The shared state, for inspecting the store directly.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send one request through the full router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = routes::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    /// A valid token for a user that does not exist in the store.
    ///
    /// # Panics
    ///
    /// Panics if signing fails.
    #[must_use]
    pub fn token_for(&self, role: Role) -> String {
        self.state
            .tokens()
            .issue(&User {
                id: UserId::new(1000),
                username: format!("{role}-fixture"),
                role,
            })
            .expect("Failed to issue token")
    }

    /// Insert a user with any role, bypassing self-registration.
    ///
    /// # Panics
    ///
    /// Panics if hashing or the insert fails.
    pub async fn seed_user(&self, username: &str, password: &str, role: Role) -> User {
        let password_hash = hash_password(password).expect("Failed to hash password");
        self.state
            .store()
            .create_user(&NewUser {
                username: username.to_owned(),
                password_hash,
                role,
            })
            .await
            .expect("Failed to seed user")
    }

    /// Log in over HTTP and return the issued token.
    ///
    /// # Panics
    ///
    /// Panics if the login does not succeed.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self.request("POST", "/users/login", None, Some(&body)).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);

        response.body["token"]
            .as_str()
            .expect("token missing from login response")
            .to_owned()
    }
}
