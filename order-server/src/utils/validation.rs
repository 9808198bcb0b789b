//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Limits match
//! the intake rules of the order form; free text is truncated rather than
//! rejected only where the data model says so (item notes).

use crate::orders::OrderError;
use shared::util;

// ── Text length limits ──────────────────────────────────────────────

/// Customer names
pub const MAX_NAME_LEN: usize = 100;

/// Item notes - truncated, not rejected
pub const MAX_ITEM_NOTE_LEN: usize = 200;

/// Notes, reasons (cancel reason, force-complete reason, internal notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Class/group tags, table numbers, delivery locations
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(OrderError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), OrderError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(OrderError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Validate the customer block of an order creation request
pub fn validate_customer(name: &str, phone: &str) -> Result<(), OrderError> {
    validate_required_text(name, "customer.name", MAX_NAME_LEN)?;
    if !util::is_valid_phone(phone) {
        return Err(OrderError::Validation(
            "customer.phone must be a 10-digit number starting with 0".into(),
        ));
    }
    Ok(())
}
