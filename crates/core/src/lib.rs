//! Shop Core - Shared types library.
//!
//! This crate provides common types used across all shop components:
//! - `api` - The HTTP service for categories, products, and users
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, user roles, and field validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
