//! User route handlers.
//!
//! Responses use [`UserView`], whose `password` is always empty.

use axum::{Json, extract::State, http::StatusCode};

use shop_core::{UserId, Validate};

use crate::error::{AppError, Result, StoreResultExt, set_sentry_user};
use crate::extract::{IdPath, JsonBody, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserPayload, UserView};
use crate::state::AppState;

const NOT_FOUND: &str = "User not found";

/// `GET /users`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<UserView>>> {
    let users = state
        .store()
        .list_users()
        .await
        .or_store_error("Could not load users")?;

    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// `POST /users`
///
/// Self-registration. The stored role is always the default role.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    let user = state.auth().register(&payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /users/login`
///
/// Every failed login, including one with missing fields, is the same 404.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state
        .auth()
        .authenticate(&payload.username, &payload.password)
        .await?;

    set_sentry_user(&user.id, &user.username);
    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}

/// `PUT /users/{id}`
///
/// The payload's `id` must equal the path ID; a mismatch is a 404 even when
/// the payload would also fail validation.
pub async fn update(
    State(state): State<AppState>,
    manager: CurrentUser,
    IdPath(id): IdPath<UserId>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Json<UserView>> {
    if payload.id != Some(id) {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }
    payload.validate()?;

    let user = state
        .auth()
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    tracing::info!(
        user_id = %id,
        role = %user.role,
        username = %manager.username,
        "User updated"
    );
    Ok(Json(user.into()))
}
