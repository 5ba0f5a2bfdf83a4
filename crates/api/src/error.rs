//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Every failure becomes a JSON body of
//! the form `{"message": "..."}`; validation failures add
//! `"errors": {"field": ["..."]}`. Store failures are reported to clients only
//! through a fixed, operation-specific message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use shop_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::AuthError;

/// Message returned for payloads that fail field validation.
pub const VALIDATION_MESSAGE: &str = "One or more validation errors occurred.";
/// Message returned for failed logins, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found, or path and payload IDs disagree.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Store operation failed; `message` is what the client sees.
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::Store { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::NOT_FOUND,
                AuthError::UsernameTaken | AuthError::Repository(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Client-facing message; never includes store or crypto internals.
    fn message(&self) -> String {
        match self {
            Self::Validation(_) => VALIDATION_MESSAGE.to_owned(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Store { message, .. } => (*message).to_owned(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_owned(),
                AuthError::UsernameTaken => "Username is already taken".to_owned(),
                AuthError::Repository(_) => "Could not process the user account".to_owned(),
                AuthError::PasswordHash | AuthError::Token(_) => {
                    "Internal server error".to_owned()
                }
            },
        }
    }

    const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Store { .. }
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Token(_)
                )
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.message();

        let body = match self {
            Self::Validation(errors) => json!({ "message": message, "errors": errors }),
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach a client-facing message to store failures.
pub trait StoreResultExt<T> {
    /// Map `Err` to [`AppError::Store`] with `message`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if `self` is `Err`.
    fn or_store_error(self, message: &'static str) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, RepositoryError> {
    fn or_store_error(self, message: &'static str) -> Result<T> {
        self.map_err(|source| AppError::Store { message, source })
    }
}

/// Set the Sentry user context for the acting user.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}
