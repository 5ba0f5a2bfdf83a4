//! Core types for the shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod role;
pub mod validation;

pub use id::*;
pub use role::{Role, RoleParseError};
pub use validation::{Validate, ValidationErrors};
