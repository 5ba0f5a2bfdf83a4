//! User domain and request types.
//!
//! Password material never leaves the service: [`User`] carries no password
//! at all, and [`UserView`] always serializes an empty `password` so clients
//! expecting the field keep working.

use serde::{Deserialize, Serialize};

use shop_core::{Role, UserId, Validate, ValidationErrors};

/// Allowed length of a username, in characters.
pub const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 1..=20;
/// Allowed length of a password, in characters.
pub const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 1..=128;

/// A user account (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Role embedded in issued tokens.
    pub role: Role,
}

/// Fields needed to insert a user; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Full replacement record for an existing user.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public representation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    /// Always empty.
    pub password: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password: String::new(),
            role: user.role,
        }
    }
}

/// Request body for `POST /users`.
///
/// Has no `role` field. Self-registered accounts always get [`Role::default`],
/// whatever the client sends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub id: Option<UserId>,
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Request body for `POST /users/login`.
///
/// Not validated: an empty or missing field is just a failed login.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub token: String,
}

fn check_credentials(errors: &mut ValidationErrors, username: &str, password: &str) {
    errors.check_length("username", username.trim(), USERNAME_LENGTH);
    errors.check_length("password", password, PASSWORD_LENGTH);
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_credentials(&mut errors, &self.username, &self.password);
        errors.into_result()
    }
}

impl Validate for UserPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_credentials(&mut errors, &self.username, &self.password);
        errors.into_result()
    }
}
