//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use validator::ValidateEmail;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: client, product, sauce
pub const MAX_NAME_LEN: usize = 200;

/// Notes and descriptions (order note, line note, product description)
pub const MAX_NOTE_LEN: usize = 500;

/// Short labels: sauce names on a line item
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Sauces selectable on a single line
pub const MAX_SAUCES_PER_LINE: usize = 20;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Phone digits after normalization
pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.chars().count()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        ));
    }
    Ok(())
}

/// Normalize and validate a phone number, returning the digits-only form.
pub fn validate_phone(raw: &str) -> Result<String, AppError> {
    let digits = shared::util::normalize_phone(raw)
        .ok_or_else(|| AppError::invalid_field("phone", "phone may only contain digits"))?;
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(AppError::invalid_field(
            "phone",
            format!("phone must have {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"),
        ));
    }
    Ok(digits)
}

/// Validate an optional email address. Empty strings count as absent.
pub fn validate_email(value: &Option<String>) -> Result<Option<String>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(email) => {
            if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
                return Err(AppError::invalid_field("email", "email is not valid"));
            }
            Ok(Some(email.to_string()))
        }
    }
}

/// Validate a price: finite, non-negative, bounded.
pub fn validate_price(price: f64, field: &str) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(
            shared::ErrorCode::ProductInvalidPrice,
            format!("{field} must be a finite, non-negative number"),
        ));
    }
    if price > shared::order::MAX_UNIT_PRICE {
        return Err(AppError::with_message(
            shared::ErrorCode::ProductInvalidPrice,
            format!("{field} exceeds maximum allowed value"),
        ));
    }
    Ok(())
}
