//! Local form validation, run before any request is sent.
//!
//! Mirrors the checks the forms perform; the backend still validates
//! everything authoritatively.

use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a change-password form.
///
/// # Errors
///
/// Returns `ApiError::Validation` describing the first failed rule.
pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> Result<(), ApiError> {
    if current.is_empty() {
        return Err(invalid("Current password is required."));
    }
    validate_new_password(new, confirm)?;
    if new == current {
        return Err(invalid("New password must be different from the current password."));
    }
    Ok(())
}

/// Validate a new password and its confirmation.
///
/// # Errors
///
/// Returns `ApiError::Validation` when the password is too short or the
/// confirmation does not match.
pub fn validate_new_password(new: &str, confirm: &str) -> Result<(), ApiError> {
    if new.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(invalid(format!("Password must be at least {MIN_PASSWORD_LENGTH} characters.")));
    }
    if new != confirm {
        return Err(invalid("Passwords do not match."));
    }
    Ok(())
}

/// Validate a reset-password form.
///
/// # Errors
///
/// Returns `ApiError::Validation` describing the first failed rule.
pub fn validate_reset_password(token: &str, new: &str, confirm: &str) -> Result<(), ApiError> {
    if token.trim().is_empty() {
        return Err(invalid("Reset token is missing or invalid."));
    }
    validate_new_password(new, confirm)
}

/// Validate a registration form.
///
/// # Errors
///
/// Returns `ApiError::Validation` describing the first failed rule.
pub fn validate_registration(name: &str, email: &str, password: &str, confirm: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(invalid("Name is required."));
    }
    validate_email(email)?;
    validate_new_password(password, confirm)
}

/// Validate a login form.
///
/// # Errors
///
/// Returns `ApiError::Validation` if either field is empty or the email is
/// malformed.
pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(invalid("Password is required."));
    }
    Ok(())
}

/// Plausibility check only: one `@`, non-empty local part, dotted domain.
///
/// # Errors
///
/// Returns `ApiError::Validation` for an implausible address.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(invalid("Email is required."));
    }
    let plausible = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if plausible { Ok(()) } else { Err(invalid("Please enter a valid email address.")) }
}

/// Validate a carbon-entry quantity.
///
/// # Errors
///
/// Returns `ApiError::Validation` unless the quantity is finite and positive.
pub fn validate_carbon_quantity(quantity: f64) -> Result<(), ApiError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(invalid("Quantity must be a positive number."))
    }
}

/// Validate a chat message body.
///
/// # Errors
///
/// Returns `ApiError::Validation` for a blank message.
pub fn validate_message(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(invalid("Message cannot be empty."));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ApiError {
    ApiError::Validation(message.into())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
