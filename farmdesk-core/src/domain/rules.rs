//! src/domain/rules.rs
//! ============================================================================
//! # Field validation rules
//!
//! Checks shared by the entity drafts and patches. Each returns the first
//! `ListError::Validation` it hits.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ListError, ListResult};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()-]{5,19}$").expect("valid phone regex"));

pub fn check_required(field: &'static str, value: &str) -> ListResult<()> {
    if value.trim().is_empty() {
        return Err(ListError::validation(field, "is required"));
    }
    Ok(())
}

pub fn check_email(email: &str) -> ListResult<()> {
    check_required("email", email)?;
    if !EMAIL.is_match(email) {
        return Err(ListError::validation("email", "is not a valid email address"));
    }
    Ok(())
}

pub fn check_phone(phone: &str) -> ListResult<()> {
    if !PHONE.is_match(phone) {
        return Err(ListError::validation("phone", "is not a valid phone number"));
    }
    Ok(())
}

/// `value` must be finite, above `min` (or equal when `min_inclusive`), and
/// at most `max`.
pub fn check_amount(
    field: &'static str,
    value: f64,
    min: f64,
    min_inclusive: bool,
    max: f64,
) -> ListResult<()> {
    if !value.is_finite() {
        return Err(ListError::validation(field, "must be a number"));
    }
    let above_min = if min_inclusive { value >= min } else { value > min };
    if !above_min {
        let bound = if min_inclusive { "at least" } else { "greater than" };
        return Err(ListError::validation(field, format!("must be {bound} {min}")));
    }
    if value > max {
        return Err(ListError::validation(field, format!("must be at most {max}")));
    }
    Ok(())
}
