//! Field-level validation for request payloads.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

/// Field-level validation failures, keyed by field name.
///
/// Serializes as `{"field": ["message", ...]}` so clients can attach each
/// message to the offending input.
///
/// # Examples
///
/// ```
/// use shop_core::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.check_length("name", "ab", 3..=60);
/// assert!(errors.contains("name"));
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Require `value` to be non-blank and within `range` characters.
    pub fn check_length(&mut self, field: &'static str, value: &str, range: RangeInclusive<usize>) {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is required"));
            return;
        }

        let len = value.chars().count();
        if len < *range.start() {
            self.add(
                field,
                format!("{field} must be at least {} characters", range.start()),
            );
        } else if len > *range.end() {
            self.add(
                field,
                format!("{field} must be at most {} characters", range.end()),
            );
        }
    }

    /// Require an optional `value` to be at most `max` characters when present.
    pub fn check_max_length(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.add(field, format!("{field} must be at most {max} characters"));
        }
    }

    /// Returns `true` if a failure was recorded for `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns `true` if no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    #[must_use]
    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Convert into `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if any failure was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for messages in self.0.values() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                f.write_str(message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A payload that can check its own field constraints.
pub trait Validate {
    /// Check every field and collect all failures.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ValidationErrors`] if any field is invalid.
    fn validate(&self) -> Result<(), ValidationErrors>;
}
