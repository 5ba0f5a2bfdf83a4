//! Shop API library.
//!
//! Category, product, and user endpoints over an injected store, with
//! bearer-token authentication and per-route role checks. The binary in
//! `main.rs` wires configuration, logging, and the listener around
//! [`routes::app`]; tests drive the same router in-process.
//!
//! # Access
//!
//! - Reads of categories and products are public
//! - Catalog mutations require an `employee` token
//! - Listing and updating users requires a `manager` token
//! - Registration and login are public

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
