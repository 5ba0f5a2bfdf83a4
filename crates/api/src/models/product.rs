//! Product domain and request types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shop_core::{CategoryId, ProductId, Validate, ValidationErrors};

use super::category::Category;

/// Allowed length of a product name, in characters.
pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=60;
/// Maximum length of a product description, in characters.
pub const DESCRIPTION_MAX_LENGTH: usize = 1024;
/// Decimal places a price may carry (`NUMERIC(12,2)`).
pub const PRICE_SCALE: u32 = 2;
/// Exclusive upper bound on a price (`NUMERIC(12,2)` holds ten integer digits).
/// Equal to `Decimal::new(10_000_000_000, 0)`, spelled via `from_parts` so it is `const`.
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(0x540B_E400, 0x2, 0, false, 0);

/// A product with its category attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub category: Category,
}

/// Fields needed to insert a product; the store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: CategoryId,
}

/// Request body for `POST /products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
}

impl ProductPayload {
    /// Build the insert record.
    ///
    /// Returns `None` when no category was given; callers validate first.
    #[must_use]
    pub fn into_new(self) -> Option<NewProduct> {
        let category_id = self.category_id?;
        Some(NewProduct {
            name: self.name.trim().to_owned(),
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            price: self.price,
            category_id,
        })
    }
}

impl Validate for ProductPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_length("name", self.name.trim(), NAME_LENGTH);
        errors.check_max_length(
            "description",
            self.description.as_deref().map(str::trim),
            DESCRIPTION_MAX_LENGTH,
        );

        if self.price <= Decimal::ZERO {
            errors.add("price", "price must be greater than zero");
        } else if self.price >= PRICE_LIMIT {
            errors.add("price", "price must be less than 10000000000");
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            errors.add("price", "price may have at most 2 decimal places");
        }

        if !self.category_id.is_some_and(|id| id.as_i32() >= 1) {
            errors.add("category_id", "category_id must reference a category");
        }

        errors.into_result()
    }
}
