//! Input validation helpers
//!
//! Centralized text length constants and validation functions shared by the
//! auth, user and membership handlers.

use std::sync::LazyLock;

use regex::Regex;
use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Names: full name, company, occupation, username
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: postal codes, references, currency
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

pub const MIN_PASSWORD_LEN: usize = 8;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Phone numbers on the application form
pub const MAX_CONTACT_LEN: usize = 25;

static NRIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[STFG]\d{7}[A-Z]$").expect("static NRIC pattern"));

// ── Generic text ────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::field(field, "This field is required."));
    }
    if value.chars().count() > max_len {
        return Err(AppError::field(
            field,
            format!(
                "{field} is too long ({} chars, max {max_len})",
                value.chars().count()
            ),
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
        return Err(AppError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.chars().count()),
        ));
    }
    Ok(())
}

// ── Domain formats ──────────────────────────────────────────────────

pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::field("email", "Enter a valid email address."));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || email.contains(' ')
    {
        return Err(AppError::field("email", "Enter a valid email address."));
    }
    Ok(())
}

pub fn validate_password(password: &str, field: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).with_detail(
            field,
            serde_json::json!([ErrorCode::PasswordTooShort.message()]),
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::field(
            field,
            format!("{field} is too long (max {MAX_PASSWORD_LEN})"),
        ));
    }
    Ok(())
}

/// NRIC/FIN: S, T, F or G, seven digits, one letter
pub fn validate_nric(nric: &str) -> Result<(), AppError> {
    if !NRIC_RE.is_match(nric) {
        return Err(AppError::new(ErrorCode::InvalidNric).with_detail(
            "nric_fin",
            serde_json::json!([
                "NRIC/FIN must start with S, T, F, or G followed by 7 digits and an alphabet."
            ]),
        ));
    }
    Ok(())
}

/// Upper-cased ISO currency code, falling back to `default`
pub fn normalize_currency(currency: Option<&str>, default: &str) -> Result<String, AppError> {
    let currency = currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::field("currency", "Currency must be a 3-letter code."));
    }
    Ok(currency)
}
