//! Input checks shared by the add and update dialogs.

use crate::models::Item;

/// Reasons an add/update submission is rejected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The id or the name is empty after trimming.
    EmptyField,
    /// The id contains something other than ASCII digits.
    NonNumericId,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyField => write!(f, "Fields cannot be empty"),
            ValidationError::NonNumericId => write!(f, "ID must contain only numbers"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Returns true if `id` is a non-empty run of ASCII digits.
pub fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Trims both fields and builds the item to store.
///
/// Emptiness is checked before the digit rule, so `("", "x")` reports
/// `EmptyField` rather than `NonNumericId`.
pub fn validate(id: &str, name: &str) -> Result<Item, ValidationError> {
    let id = id.trim();
    let name = name.trim();

    if id.is_empty() || name.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    if !is_numeric_id(id) {
        return Err(ValidationError::NonNumericId);
    }

    Ok(Item::new(id, name))
}
