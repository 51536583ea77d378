//! Password hashing and the raw-password policy.
//!
//! Policy validation runs on the plaintext *before* hashing and lives apart
//! from `hash_password`, so a digest can never be mistakenly validated
//! against human-readable password rules.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 20;

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Validates a plaintext password against the account policy:
/// 8-20 characters, at least one lowercase letter, one uppercase letter,
/// one digit and one of `@$!%*?&`, drawn only from that alphabet.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if !has_lowercase || !has_uppercase || !has_digit || !has_symbol {
        return Err(ValidationError::Invalid(
            "password",
            "Password must contain at least one lowercase letter, one uppercase \
             letter, one digit, and one special character (@$!%*?&)."
                .to_string(),
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c);
    if !password.chars().all(allowed) {
        return Err(ValidationError::Invalid(
            "password",
            "Password may only contain letters, digits, and the special \
             characters @$!%*?&."
                .to_string(),
        ));
    }

    Ok(())
}

/// Hashes a plaintext password with bcrypt. Callers are responsible for
/// running `validate_password` on the raw input first.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verifies a plaintext password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
