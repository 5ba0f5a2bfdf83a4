//! Product route handlers.

use axum::{Json, extract::State, http::StatusCode};

use shop_core::{CategoryId, ProductId};

use crate::error::{AppError, Result, StoreResultExt};
use crate::extract::{IdPath, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::{Product, ProductPayload};
use crate::state::AppState;

/// `GET /products`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state
        .store()
        .list_products()
        .await
        .or_store_error("Could not load products")?;

    Ok(Json(products))
}

/// `GET /products/{id}`
///
/// Responds `null` when no product has this ID.
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
) -> Result<Json<Option<Product>>> {
    let product = state
        .store()
        .get_product(id)
        .await
        .or_store_error("Could not load the product")?;

    Ok(Json(product))
}

/// `GET /products/categories/{id}`
pub async fn by_category(
    State(state): State<AppState>,
    IdPath(category_id): IdPath<CategoryId>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .store()
        .list_products_by_category(category_id)
        .await
        .or_store_error("Could not load products")?;

    Ok(Json(products))
}

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(payload): ValidJson<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    let new = payload
        .into_new()
        .ok_or_else(|| AppError::BadRequest("category_id is required".to_owned()))?;

    let product = state
        .store()
        .create_product(&new)
        .await
        .or_store_error("Could not create a new product")?;

    tracing::info!(
        product_id = %product.id,
        category_id = %product.category_id,
        username = %user.username,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}
