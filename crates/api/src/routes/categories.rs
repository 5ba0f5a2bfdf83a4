//! Category route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use shop_core::{CategoryId, Validate};

use crate::error::{AppError, Result, StoreResultExt};
use crate::extract::{IdPath, JsonBody, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::{Category, CategoryPayload};
use crate::state::AppState;

const NOT_FOUND: &str = "Category not found";

/// `GET /categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state
        .store()
        .list_categories()
        .await
        .or_store_error("Could not load categories")?;

    Ok(Json(categories))
}

/// `GET /categories/{id}`
///
/// Responds `null` when no category has this ID.
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
) -> Result<Json<Option<Category>>> {
    let category = state
        .store()
        .get_category(id)
        .await
        .or_store_error("Could not load the category")?;

    Ok(Json(category))
}

/// `POST /categories`
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = state
        .store()
        .create_category(&payload.into_new())
        .await
        .or_store_error("Could not create a new category")?;

    tracing::info!(
        category_id = %category.id,
        username = %user.username,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /categories/{id}`
///
/// The payload's `id` must equal the path ID; a mismatch is a 404 even when
/// the payload would also fail validation.
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath<CategoryId>,
    JsonBody(payload): JsonBody<CategoryPayload>,
) -> Result<Json<Category>> {
    if payload.id != Some(id) {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }
    payload.validate()?;

    let category = payload.into_category(id);
    let updated = state
        .store()
        .update_category(&category)
        .await
        .or_store_error("Could not update the category")?;

    if !updated {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    tracing::info!(category_id = %id, username = %user.username, "Category updated");
    Ok(Json(category))
}

/// `DELETE /categories/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath<CategoryId>,
) -> Result<Json<Value>> {
    let existing = state
        .store()
        .get_category(id)
        .await
        .or_store_error("Could not remove the category")?;

    if existing.is_none() {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    let removed = state
        .store()
        .delete_category(id)
        .await
        .or_store_error("Could not remove the category")?;

    if !removed {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    tracing::info!(category_id = %id, username = %user.username, "Category deleted");
    Ok(Json(json!({ "message": "Category deleted" })))
}
