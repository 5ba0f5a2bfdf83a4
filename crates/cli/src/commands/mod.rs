//! CLI command implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Read the database URL (`SHOP_DATABASE_URL`, falling back to `DATABASE_URL`).
///
/// Loads `.env` first if present.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.is_empty())
        .map(SecretString::from)
}
