//! Data access for the shop.
//!
//! Handlers never talk to a database directly. They receive a `&dyn Store`
//! from [`AppState`](crate::state::AppState) and call the port traits below,
//! which have two adapters:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (schema `shop`)
//! - [`MemoryStore`] - process-local tables, used when no database URL is
//!   configured and by tests
//!
//! ## Tables
//!
//! - `shop.category` - Product categories
//! - `shop.product` - Products (`category_id` references `shop.category`)
//! - `shop.app_user` - Accounts with Argon2 password hashes and a role
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shop-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shop_core::{CategoryId, ProductId};

use crate::models::{Category, NewCategory, NewProduct, NewUser, Product, User, UserUpdate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (unique username, dangling category reference).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Category collection.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories, ordered by ID.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// A single category, or `None` if no row has this ID.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// Insert a category and return it with its new ID.
    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError>;

    /// Replace an existing category. Returns `false` if it does not exist.
    async fn update_category(&self, category: &Category) -> Result<bool, RepositoryError>;

    /// Remove a category. Returns `false` if it does not exist.
    ///
    /// Fails with [`RepositoryError::Conflict`] while products still reference it.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError>;
}

/// Product collection. Every returned product has its category attached.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, ordered by ID.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A single product, or `None` if no row has this ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products whose `category_id` equals `category_id`.
    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a product and return it with its new ID and category.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the category does not exist.
    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;
}

/// User collection (the credential store).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, ordered by ID.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// A user and their password hash, looked up by exact username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Insert a user. Fails with [`RepositoryError::Conflict`] on a taken username.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Replace an existing user. Returns `None` if it does not exist.
    ///
    /// Fails with [`RepositoryError::Conflict`] on a taken username.
    async fn update_user(&self, user: &UserUpdate) -> Result<Option<User>, RepositoryError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: CategoryStore + ProductStore + UserStore {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the configured store.
///
/// Connects to `PostgreSQL` when a URL is given, otherwise starts an empty
/// in-memory store.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database connection cannot be established.
pub async fn connect(
    database_url: Option<&secrecy::SecretString>,
) -> Result<Arc<dyn Store>, sqlx::Error> {
    match database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("No database URL configured, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
