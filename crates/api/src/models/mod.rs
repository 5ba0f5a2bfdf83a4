//! Domain models and request/response bodies.
//!
//! Domain types (`Category`, `Product`, `User`) are what the store returns.
//! Payload types are what handlers deserialize; they implement
//! [`shop_core::Validate`] and convert into the store's insert/update records.

pub mod category;
pub mod product;
pub mod user;

pub use category::{Category, CategoryPayload, NewCategory};
pub use product::{NewProduct, Product, ProductPayload};
pub use user::{
    LoginRequest, LoginResponse, NewUser, RegisterRequest, User, UserPayload, UserUpdate, UserView,
};
