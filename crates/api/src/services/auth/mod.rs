//! Authentication service.
//!
//! Registration, login, and account updates. Passwords are stored as
//! Argon2id hashes and never returned.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use shop_core::{Role, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, RegisterRequest, User, UserPayload, UserUpdate};
use crate::services::token::TokenService;

/// Hash verified when a login names an unknown user, so both failure paths
/// cost one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("shop-api-dummy-password").ok());

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenService) -> Self {
        Self { store, tokens }
    }

    /// Self-register an account.
    ///
    /// The new account always gets [`Role::default`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .create_user(&NewUser {
                username: request.username.trim().to_owned(),
                password_hash,
                role: Role::default(),
            })
            .await
            .map_err(map_conflict)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check a username/password pair and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or the
    /// password is wrong; the two cases are indistinguishable.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let Some((user, password_hash)) = self.store.find_credentials(username.trim()).await?
        else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            tracing::debug!("Login attempt for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if let Err(e) = verify_password(password, &password_hash) {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(e);
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Replace an account's username, password, and role.
    ///
    /// Returns `None` if no user has this ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameTaken` if another account has the username.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn update(
        &self,
        id: UserId,
        payload: &UserPayload,
    ) -> Result<Option<User>, AuthError> {
        let password_hash = hash_password(&payload.password)?;

        self.store
            .update_user(&UserUpdate {
                id,
                username: payload.username.trim().to_owned(),
                password_hash,
                role: payload.role,
            })
            .await
            .map_err(map_conflict)
    }
}

fn map_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(_) => AuthError::UsernameTaken,
        other => AuthError::Repository(other),
    }
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use secrecy::SecretString;

    use super::*;
    use crate::config::TokenConfig;
    use crate::db::{MemoryStore, UserStore};

    fn tokens() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: SecretString::from("q8Z!r2Lm#V7t@Kp4&Xw9^Hd3*Nf6$Bj1".to_owned()),
            ttl: Duration::hours(2),
        })
    }

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &first).is_ok());
        assert!(verify_password("hunter3", &first).is_err());
    }

    #[tokio::test]
    async fn test_register_forces_default_role() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let user = auth.register(&register("a", "p")).await.unwrap();
        assert_eq!(user.role, Role::Employee);

        let (_, hash) = store.find_credentials("a").await.unwrap().unwrap();
        assert_ne!(hash, "p");
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        auth.register(&register("alice", "p")).await.unwrap();
        let err = auth.register(&register("alice", "q")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_authenticate_issues_verifiable_token() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register(&register("alice", "s3cret")).await.unwrap();

        let (user, token) = auth.authenticate("alice", "s3cret").await.unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.user_id().unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_fail_alike() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register(&register("alice", "s3cret")).await.unwrap();

        let wrong = auth.authenticate("alice", "nope").await.unwrap_err();
        let unknown = auth.authenticate("bob", "s3cret").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_empty_credentials_are_invalid() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register(&register("alice", "s3cret")).await.unwrap();

        let empty_password = auth.authenticate("alice", "").await.unwrap_err();
        let empty_username = auth.authenticate("", "s3cret").await.unwrap_err();

        assert!(matches!(empty_password, AuthError::InvalidCredentials));
        assert!(matches!(empty_username, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_update_rehashes_password_and_sets_role() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth.register(&register("alice", "old")).await.unwrap();

        let updated = auth
            .update(
                user.id,
                &UserPayload {
                    id: Some(user.id),
                    username: "alice".to_owned(),
                    password: "new".to_owned(),
                    role: Role::Manager,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, Role::Manager);
        assert!(auth.authenticate("alice", "new").await.is_ok());
        assert!(auth.authenticate("alice", "old").await.is_err());
    }
}
