//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (store ping)
//!
//! # Categories
//! GET    /categories                - List categories
//! GET    /categories/{id}           - Category by ID (null if absent)
//! POST   /categories                - Create category       [employee]
//! PUT    /categories/{id}           - Replace category      [employee]
//! DELETE /categories/{id}           - Delete category       [employee]
//!
//! # Products
//! GET    /products                  - List products with categories
//! GET    /products/{id}             - Product by ID (null if absent)
//! GET    /products/categories/{id}  - Products in a category
//! POST   /products                  - Create product        [employee]
//!
//! # Users
//! GET    /users                     - List users            [manager]
//! POST   /users                     - Self-register (role forced to employee)
//! POST   /users/login               - Exchange credentials for a token
//! PUT    /users/{id}                - Replace user          [manager]
//! ```
//!
//! On guarded `/{id}` methods a non-integer segment is a 404 before the gate
//! looks at the token.

pub mod categories;
pub mod health;
pub mod products;
pub mod users;

use axum::{
    Router,
    http::{Request, Response},
    routing::{MethodRouter, get, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::extract::require_integer_id;
use crate::middleware::{Access, EMPLOYEE, MANAGER, guard, request_id_middleware};
use crate::state::AppState;

/// [`guard`] for `/{id}` routes, with the ID segment checked first.
fn guard_by_id(
    state: &AppState,
    access: Access,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    guard(state, access, route).route_layer(axum::middleware::from_fn(require_integer_id))
}

/// Create the category routes router.
pub fn category_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::index).merge(guard(state, EMPLOYEE, post(categories::create))),
        )
        .route(
            "/{id}",
            get(categories::show).merge(guard_by_id(
                state,
                EMPLOYEE,
                put(categories::update).delete(categories::destroy),
            )),
        )
}

/// Create the product routes router.
pub fn product_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::index).merge(guard(state, EMPLOYEE, post(products::create))),
        )
        .route("/{id}", get(products::show))
        .route("/categories/{id}", get(products::by_category))
}

/// Create the user routes router.
pub fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(users::register).merge(guard(state, MANAGER, get(users::index))),
        )
        .route("/login", post(users::login))
        .route("/{id}", guard_by_id(state, MANAGER, put(users::update)))
}

/// Create all resource routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/categories", category_routes(state))
        .nest("/products", product_routes(state))
        .nest("/users", user_routes(state))
}

/// Build the complete application: routes, health checks, and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes(&state))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{StatusCode, header},
    };
    use chrono::Duration;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use shop_core::{Role, UserId};

    use super::*;
    use crate::config::{ApiConfig, TokenConfig};
    use crate::db::MemoryStore;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::models::User;

    fn state() -> AppState {
        let config = ApiConfig {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            token: TokenConfig {
                secret: SecretString::from("q8Z!r2Lm#V7t@Kp4&Xw9^Hd3*Nf6$Bj1".to_owned()),
                ttl: Duration::hours(2),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        AppState::new(config, Arc::new(MemoryStore::new()))
    }

    fn token(state: &AppState, role: Role) -> String {
        state
            .tokens()
            .issue(&User {
                id: UserId::new(99),
                username: "staff".to_owned(),
                role,
            })
            .unwrap()
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let state = state();
        let (status, body) = send(&state, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_owned()));

        let (status, _) = send(&state, "GET", "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = app(state()).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let state = state();
        let employee = token(&state, Role::Employee);

        let (status, created) = send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "Shoes" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, json!({ "id": 1, "name": "Shoes" }));

        let (status, fetched) = send(&state, "GET", "/categories/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, message) =
            send(&state, "DELETE", "/categories/1", Some(&employee), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message["message"], "Category deleted");

        let (status, absent) = send(&state, "GET", "/categories/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(absent, Value::Null);
    }

    #[tokio::test]
    async fn test_mutation_without_token_is_unauthorized() {
        let state = state();
        let (status, body) = send(
            &state,
            "POST",
            "/categories",
            None,
            Some(json!({ "name": "Shoes" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());
        assert!(state.store().list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_with_bad_token_is_unauthorized() {
        let state = state();
        let (status, _) = send(
            &state,
            "DELETE",
            "/categories/1",
            Some("not-a-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let state = state();
        let manager = token(&state, Role::Manager);
        let (status, _) = send(
            &state,
            "POST",
            "/products",
            Some(&manager),
            Some(json!({ "name": "Runner", "price": 10, "category_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let employee = token(&state, Role::Employee);
        let (status, _) = send(&state, "GET", "/users", Some(&employee), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_public_reads_ignore_token() {
        let state = state();
        let (status, body) =
            send(&state, "GET", "/categories", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_non_integer_id_is_not_found() {
        let state = state();
        let (status, _) = send(&state, "GET", "/categories/abc", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, "GET", "/products/categories/x", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_id_mismatch_leaves_store_unchanged() {
        let state = state();
        let employee = token(&state, Role::Employee);
        send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "Shoes" })),
        )
        .await;

        let (status, _) = send(
            &state,
            "PUT",
            "/categories/1",
            Some(&employee),
            Some(json!({ "id": 2, "name": "Boots" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, fetched) = send(&state, "GET", "/categories/1", None, None).await;
        assert_eq!(fetched["name"], "Shoes");
    }

    #[tokio::test]
    async fn test_update_category() {
        let state = state();
        let employee = token(&state, Role::Employee);
        send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "Shoes" })),
        )
        .await;

        let (status, body) = send(
            &state,
            "PUT",
            "/categories/1",
            Some(&employee),
            Some(json!({ "id": 1, "name": "Boots" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 1, "name": "Boots" }));

        let (status, _) = send(
            &state,
            "PUT",
            "/categories/5",
            Some(&employee),
            Some(json!({ "id": 5, "name": "Sandals" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let (status, body) =
            send(&state, "DELETE", "/categories/42", Some(&employee), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Category not found");
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let (status, body) = send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "ab" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["name"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let request = Request::builder()
            .method("POST")
            .uri("/categories")
            .header(header::AUTHORIZATION, format!("Bearer {employee}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_product_create_and_filter() {
        let state = state();
        let employee = token(&state, Role::Employee);
        send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "Shoes" })),
        )
        .await;

        let (status, product) = send(
            &state,
            "POST",
            "/products",
            Some(&employee),
            Some(json!({
                "name": "Runner",
                "description": "Light trail shoe",
                "price": "49.99",
                "category_id": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["id"], 1);
        assert_eq!(product["category"], json!({ "id": 1, "name": "Shoes" }));

        let (status, listed) = send(&state, "GET", "/products/categories/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, other) = send(&state, "GET", "/products/categories/2", None, None).await;
        assert_eq!(other, json!([]));

        let (_, missing) = send(&state, "GET", "/products/9", None, None).await;
        assert_eq!(missing, Value::Null);
    }

    #[tokio::test]
    async fn test_product_with_unknown_category_is_bad_request() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let (status, body) = send(
            &state,
            "POST",
            "/products",
            Some(&employee),
            Some(json!({ "name": "Runner", "price": 10, "category_id": 3 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Could not create a new product" }));
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let state = state();
        let (status, user) = send(
            &state,
            "POST",
            "/users",
            None,
            Some(json!({ "username": "a", "password": "p", "role": "manager" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["role"], "employee");
        assert_eq!(user["password"], "");

        let (status, login) = send(
            &state,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "a", "password": "p" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["user"]["password"], "");
        assert!(!login["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_login_is_not_found() {
        let state = state();
        send(
            &state,
            "POST",
            "/users",
            None,
            Some(json!({ "username": "a", "password": "p" })),
        )
        .await;

        let (wrong_status, wrong) = send(
            &state,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "a", "password": "nope" })),
        )
        .await;
        let (unknown_status, unknown) = send(
            &state,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "zed", "password": "p" })),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::NOT_FOUND);
        assert_eq!(unknown_status, StatusCode::NOT_FOUND);
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn test_manager_lists_and_updates_users() {
        let state = state();
        let manager = token(&state, Role::Manager);
        send(
            &state,
            "POST",
            "/users",
            None,
            Some(json!({ "username": "bob", "password": "pw" })),
        )
        .await;

        let (status, users) = send(&state, "GET", "/users", Some(&manager), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users[0]["username"], "bob");
        assert_eq!(users[0]["password"], "");

        let (status, updated) = send(
            &state,
            "PUT",
            "/users/1",
            Some(&manager),
            Some(json!({ "id": 1, "username": "bob", "password": "pw2", "role": "manager" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["role"], "manager");
        assert_eq!(updated["password"], "");

        let (status, _) = send(
            &state,
            "PUT",
            "/users/1",
            Some(&manager),
            Some(json!({ "id": 2, "username": "bob", "password": "pw2" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_bad_request() {
        let state = state();
        let body = json!({ "username": "bob", "password": "pw" });
        send(&state, "POST", "/users", None, Some(body.clone())).await;
        let (status, _) = send(&state, "POST", "/users", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_id_mismatch_wins_over_validation() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let manager = token(&state, Role::Manager);

        let (status, body) = send(
            &state,
            "PUT",
            "/categories/1",
            Some(&employee),
            Some(json!({ "id": 2, "name": "ab" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Category not found" }));

        let (status, body) = send(
            &state,
            "PUT",
            "/users/1",
            Some(&manager),
            Some(json!({ "id": 2, "username": "", "password": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));
    }

    #[tokio::test]
    async fn test_matching_id_still_validates() {
        let state = state();
        let employee = token(&state, Role::Employee);
        let (status, body) = send(
            &state,
            "PUT",
            "/categories/1",
            Some(&employee),
            Some(json!({ "id": 1, "name": "ab" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["name"].is_array());
    }

    #[tokio::test]
    async fn test_non_integer_id_is_not_found_before_gate() {
        let state = state();
        for (method, uri) in [
            ("PUT", "/categories/abc"),
            ("DELETE", "/categories/abc"),
            ("PUT", "/users/abc"),
        ] {
            let (status, _) = send(&state, method, uri, None, Some(json!({}))).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        }

        // Integer segments still reach the gate.
        let (status, _) = send(&state, "DELETE", "/categories/1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_empty_fields_is_not_found() {
        let state = state();
        send(
            &state,
            "POST",
            "/users",
            None,
            Some(json!({ "username": "a", "password": "p" })),
        )
        .await;

        let (_, wrong) = send(
            &state,
            "POST",
            "/users/login",
            None,
            Some(json!({ "username": "a", "password": "nope" })),
        )
        .await;

        for body in [
            json!({ "username": "a", "password": "" }),
            json!({ "username": "", "password": "p" }),
            json!({}),
        ] {
            let (status, response) =
                send(&state, "POST", "/users/login", None, Some(body)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(response, wrong);
        }
    }

    #[tokio::test]
    async fn test_product_price_precision_is_validated() {
        let state = state();
        let employee = token(&state, Role::Employee);
        send(
            &state,
            "POST",
            "/categories",
            Some(&employee),
            Some(json!({ "name": "Shoes" })),
        )
        .await;

        for price in ["1.999", "10000000000"] {
            let (status, body) = send(
                &state,
                "POST",
                "/products",
                Some(&employee),
                Some(json!({ "name": "Runner", "price": price, "category_id": 1 })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
            assert!(body["errors"]["price"].is_array());
        }
        assert!(state.store().list_products().await.unwrap().is_empty());
    }
}
