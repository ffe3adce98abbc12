//! Request field validation for the auth RPC surface.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AuthError, AuthResult};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap());

pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::Validation("email is required".into()));
    }
    if !EMAIL_REGEX.is_match(&email.to_lowercase()) {
        return Err(AuthError::Validation("invalid email format".into()));
    }
    Ok(())
}

/// Password policy: at least 8 alphanumeric characters, containing at least
/// one letter and one digit.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(AuthError::Validation("password is required".into()));
    }
    if password.len() < 8 {
        return Err(AuthError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AuthError::Validation(
            "password may contain only letters and digits".into(),
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AuthError::Validation(
            "password must contain at least one letter and one number".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_emails() {
        assert!(validate_email("buyer@example.com").is_ok());
        assert!(validate_email("Seller.Name+tag@shop.example.org").is_ok());
    }

    #[test]
    fn rejects_bad_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("abc12345").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("allletters").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("with space1").is_err());
    }
}
