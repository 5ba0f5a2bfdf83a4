//! `PostgreSQL` adapter for the store ports.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use shop_core::{CategoryId, ProductId, Role, UserId};

use super::{CategoryStore, ProductStore, RepositoryError, Store, UserStore};
use crate::models::{Category, NewCategory, NewProduct, NewUser, Product, User, UserUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

/// Product joined with its category.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    category_id: i32,
    category_name: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category_id = CategoryId::new(row.category_id);
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category_id,
            category: Category {
                id: category_id,
                name: row.category_name,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    role: Role,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            role: row.role,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: i32,
    username: String,
    role: Role,
    password_hash: String,
}

const PRODUCT_COLUMNS: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.category_id,
           c.name AS category_name
    FROM shop.product p
    JOIN shop.category c ON c.id = p.category_id
";

/// Map constraint violations to [`RepositoryError::Conflict`].
fn map_constraint(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name FROM shop.category ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name FROM shop.category WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let row: CategoryRow =
            sqlx::query_as("INSERT INTO shop.category (name) VALUES ($1) RETURNING id, name")
                .bind(&category.name)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    async fn update_category(&self, category: &Category) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE shop.category SET name = $2 WHERE id = $1")
            .bind(category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint(e, "category still has products"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{PRODUCT_COLUMNS} ORDER BY p.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{PRODUCT_COLUMNS} WHERE p.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{PRODUCT_COLUMNS} WHERE p.category_id = $1 ORDER BY p.id"))
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(
            r"
            WITH inserted AS (
                INSERT INTO shop.product (name, description, price, category_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, description, price, category_id
            )
            SELECT i.id, i.name, i.description, i.price, i.category_id,
                   c.name AS category_name
            FROM inserted i
            JOIN shop.category c ON c.id = i.category_id
            ",
        )
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "category does not exist"))?;

        Ok(row.into())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, username, role FROM shop.app_user ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT id, username, role, password_hash FROM shop.app_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let user = User {
                id: UserId::new(r.id),
                username: r.username,
                role: r.role,
            };
            (user, r.password_hash)
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO shop.app_user (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, role
            ",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "username already exists"))?;

        Ok(row.into())
    }

    async fn update_user(&self, user: &UserUpdate) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            UPDATE shop.app_user
            SET username = $2, password_hash = $3, role = $4
            WHERE id = $1
            RETURNING id, username, role
            ",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "username already exists"))?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
