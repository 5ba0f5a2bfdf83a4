//! Category domain and request types.

use serde::{Deserialize, Serialize};

use shop_core::{CategoryId, Validate, ValidationErrors};

/// Allowed length of a category name, in characters.
pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=60;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Fields needed to insert a category; the store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

/// Request body for `POST /categories` and `PUT /categories/{id}`.
///
/// `id` is only consulted on update, where it must equal the path ID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryPayload {
    pub id: Option<CategoryId>,
    pub name: String,
}

impl CategoryPayload {
    /// Build the insert record, discarding any client-supplied ID.
    #[must_use]
    pub fn into_new(self) -> NewCategory {
        NewCategory {
            name: self.name.trim().to_owned(),
        }
    }

    /// Build the full replacement record for `id`.
    #[must_use]
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name.trim().to_owned(),
        }
    }
}

impl Validate for CategoryPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_length("name", self.name.trim(), NAME_LENGTH);
        errors.into_result()
    }
}
