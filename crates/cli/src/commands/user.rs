//! Account management commands.
//!
//! Self-registration through the API always yields an `employee`, so the first
//! `manager` has to be created here.
//!
//! # Usage
//!
//! ```bash
//! shop-cli user create -u alice -p 'correct horse' -r manager
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use shop_api::db::{PgStore, RepositoryError, UserStore};
use shop_api::models::{NewUser, RegisterRequest};
use shop_api::services::auth::hash_password;
use shop_core::{Role, RoleParseError, UserId, Validate, ValidationErrors};
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error(transparent)]
    InvalidRole(#[from] RoleParseError),

    /// Username or password failed validation.
    #[error("Invalid account: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Password could not be hashed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("User already exists with username: {0}")]
    UserExists(String),

    /// Store operation failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Parse the role and check the credentials, before any database work.
///
/// # Errors
///
/// Returns `UserError::InvalidRole` or `UserError::Invalid`.
pub fn prepare(
    username: &str,
    password: &str,
    role: &str,
) -> Result<(RegisterRequest, Role), UserError> {
    let role: Role = role.parse()?;
    let request = RegisterRequest {
        username: username.trim().to_owned(),
        password: password.to_owned(),
    };
    request.validate()?;

    Ok((request, role))
}

/// Create a user with the given role.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError` if validation, hashing, or the insert fails.
pub async fn create(username: &str, password: &str, role: &str) -> Result<UserId, UserError> {
    let (request, role) = prepare(username, password, role)?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("SHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = shop_api::db::create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    let password_hash = hash_password(&request.password).map_err(|_| UserError::PasswordHash)?;

    tracing::info!("Creating user: {} ({})", request.username, role);
    let user = store
        .create_user(&NewUser {
            username: request.username.clone(),
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(request.username.clone()),
            other => UserError::Repository(other),
        })?;

    tracing::info!("Created user {} with ID {}", user.username, user.id);
    Ok(user.id)
}
