//! Request extractors that reject with [`AppError`] bodies.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::de::DeserializeOwned;

use shop_core::Validate;

use crate::error::AppError;

/// Integer ID from a `{id}` path segment.
///
/// A segment that is not an integer does not match the route, so it is
/// answered with 404 rather than 400.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: From<i32>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Resource not found".to_owned()))?;

        Ok(Self(T::from(id)))
    }
}

/// Route layer that answers 404 for a non-integer `{id}` segment.
///
/// Installed outside the gate on `/{id}` routes, so an unmatched segment is a
/// 404 whether or not the caller sent a token.
///
/// # Errors
///
/// Returns `AppError::NotFound` instead of running the inner service.
pub async fn require_integer_id(
    _: IdPath<i32>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    Ok(next.run(request).await)
}

/// JSON body, with malformed input reported as a 400 `{message}`.
///
/// Does not validate; handlers that must check something else first (such as
/// path/body ID agreement) call [`Validate::validate`] themselves.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// JSON body that has passed [`Validate`].
///
/// Malformed JSON is a 400 with the parser's message; field failures are a
/// 400 listing every failing field.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        value.validate()?;
        Ok(Self(value))
    }
}
