//! In-memory adapter for the store ports.
//!
//! Keeps every table in a `BTreeMap` behind one lock so each call sees a
//! consistent snapshot. IDs start at 1 and are never reused.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use shop_core::{CategoryId, ProductId, Role, UserId};

use super::{CategoryStore, ProductStore, RepositoryError, Store, UserStore};
use crate::models::{Category, NewCategory, NewProduct, NewUser, Product, User, UserUpdate};

#[derive(Debug, Clone)]
struct ProductRecord {
    name: String,
    description: Option<String>,
    price: rust_decimal::Decimal,
    category_id: CategoryId,
}

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    password_hash: String,
    role: Role,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, String>,
    products: BTreeMap<ProductId, ProductRecord>,
    users: BTreeMap<UserId, UserRecord>,
    next_category: i32,
    next_product: i32,
    next_user: i32,
}

impl Tables {
    fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories.get(&id).map(|name| Category {
            id,
            name: name.clone(),
        })
    }

    /// Join a product with its category.
    fn product(&self, id: ProductId, record: &ProductRecord) -> Result<Product, RepositoryError> {
        let category = self.category(record.category_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "product {id} references missing category {}",
                record.category_id
            ))
        })?;

        Ok(Product {
            id,
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            category_id: record.category_id,
            category,
        })
    }

    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|(id, u)| u.username == username && Some(*id) != except)
    }
}

fn user(id: UserId, record: &UserRecord) -> User {
    User {
        id,
        username: record.username.clone(),
        role: record.role,
    }
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .categories
            .iter()
            .map(|(id, name)| Category {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().category(id))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write();
        tables.next_category += 1;
        let id = CategoryId::new(tables.next_category);
        tables.categories.insert(id, category.name.clone());

        Ok(Category {
            id,
            name: category.name.clone(),
        })
    }

    async fn update_category(&self, category: &Category) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write();
        match tables.categories.get_mut(&category.id) {
            Some(name) => {
                name.clone_from(&category.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.categories.contains_key(&id) {
            return Ok(false);
        }
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(RepositoryError::Conflict(
                "category still has products".to_owned(),
            ));
        }

        tables.categories.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read();
        tables
            .products
            .iter()
            .map(|(id, record)| tables.product(*id, record))
            .collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read();
        tables
            .products
            .get(&id)
            .map(|record| tables.product(id, record))
            .transpose()
    }

    async fn list_products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read();
        tables
            .products
            .iter()
            .filter(|(_, record)| record.category_id == category_id)
            .map(|(id, record)| tables.product(*id, record))
            .collect()
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.categories.contains_key(&product.category_id) {
            return Err(RepositoryError::Conflict(
                "category does not exist".to_owned(),
            ));
        }

        tables.next_product += 1;
        let id = ProductId::new(tables.next_product);
        let record = ProductRecord {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category_id: product.category_id,
        };
        let created = tables.product(id, &record)?;
        tables.products.insert(id, record);

        Ok(created)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables.users.iter().map(|(id, u)| user(*id, u)).collect())
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .iter()
            .find(|(_, u)| u.username == username)
            .map(|(id, u)| (user(*id, u), u.password_hash.clone())))
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.username_taken(&new_user.username, None) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        tables.next_user += 1;
        let id = UserId::new(tables.next_user);
        let record = UserRecord {
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
        };
        let created = user(id, &record);
        tables.users.insert(id, record);

        Ok(created)
    }

    async fn update_user(&self, update: &UserUpdate) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&update.id) {
            return Ok(None);
        }
        if tables.username_taken(&update.username, Some(update.id)) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let record = UserRecord {
            username: update.username.clone(),
            password_hash: update.password_hash.clone(),
            role: update.role,
        };
        let updated = user(update.id, &record);
        tables.users.insert(update.id, record);

        Ok(Some(updated))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn shoes() -> NewCategory {
        NewCategory {
            name: "Shoes".to_owned(),
        }
    }

    fn runner(category_id: CategoryId) -> NewProduct {
        NewProduct {
            name: "Runner".to_owned(),
            description: Some("Light trail shoe".to_owned()),
            price: Decimal::new(4999, 2),
            category_id,
        }
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_owned(),
            password_hash: "hash".to_owned(),
            role: Role::Employee,
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_are_distinct() {
        let store = MemoryStore::new();
        let first = store.create_category(&shoes()).await.unwrap();
        let second = store
            .create_category(&NewCategory {
                name: "Hats".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, CategoryId::new(1));
        assert_eq!(second.id, CategoryId::new(2));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.create_category(&shoes()).await.unwrap();
        assert!(store.delete_category(first.id).await.unwrap());

        let second = store.create_category(&shoes()).await.unwrap();
        assert_eq!(second.id, CategoryId::new(2));
    }

    #[tokio::test]
    async fn test_get_missing_category_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_category(CategoryId::new(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_category_returns_false() {
        let store = MemoryStore::new();
        let updated = store
            .update_category(&Category {
                id: CategoryId::new(3),
                name: "Boots".to_owned(),
            })
            .await
            .unwrap();

        assert!(!updated);
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_carries_its_category() {
        let store = MemoryStore::new();
        let category = store.create_category(&shoes()).await.unwrap();
        let product = store.create_product(&runner(category.id)).await.unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.category, category);

        let fetched = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn test_product_requires_existing_category() {
        let store = MemoryStore::new();
        let err = store
            .create_product(&runner(CategoryId::new(9)))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_by_category_filters_on_category() {
        let store = MemoryStore::new();
        let shoes = store.create_category(&shoes()).await.unwrap();
        let hats = store
            .create_category(&NewCategory {
                name: "Hats".to_owned(),
            })
            .await
            .unwrap();
        store.create_product(&runner(shoes.id)).await.unwrap();
        store.create_product(&runner(hats.id)).await.unwrap();
        store.create_product(&runner(shoes.id)).await.unwrap();

        let listed = store.list_products_by_category(shoes.id).await.unwrap();
        let ids: Vec<i32> = listed.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let store = MemoryStore::new();
        let category = store.create_category(&shoes()).await.unwrap();
        store.create_product(&runner(category.id)).await.unwrap();

        let err = store.delete_category(category.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.get_category(category.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user(&new_user("alice")).await.unwrap();

        let err = store.create_user(&new_user("alice")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_credentials_is_exact_match() {
        let store = MemoryStore::new();
        store.create_user(&new_user("alice")).await.unwrap();

        let (found, hash) = store.find_credentials("alice").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(hash, "hash");
        assert!(store.find_credentials("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_keeps_own_username() {
        let store = MemoryStore::new();
        let created = store.create_user(&new_user("alice")).await.unwrap();

        let updated = store
            .update_user(&UserUpdate {
                id: created.id,
                username: "alice".to_owned(),
                password_hash: "other".to_owned(),
                role: Role::Manager,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, Role::Manager);
        let (_, hash) = store.find_credentials("alice").await.unwrap().unwrap();
        assert_eq!(hash, "other");
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_username() {
        let store = MemoryStore::new();
        store.create_user(&new_user("alice")).await.unwrap();
        let bob = store.create_user(&new_user("bob")).await.unwrap();

        let err = store
            .update_user(&UserUpdate {
                id: bob.id,
                username: "alice".to_owned(),
                password_hash: "hash".to_owned(),
                role: Role::Employee,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_none() {
        let store = MemoryStore::new();
        let result = store
            .update_user(&UserUpdate {
                id: UserId::new(4),
                username: "ghost".to_owned(),
                password_hash: "hash".to_owned(),
                role: Role::Employee,
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
