//! Business services layered over the store.
//!
//! - [`auth`] - registration, login, and account updates
//! - [`token`] - access token issuing and verification

pub mod auth;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use token::{Claims, TokenError, TokenService};
