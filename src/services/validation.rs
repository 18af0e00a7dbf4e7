//! Input shape checks shared by the identity flows.

use regex::Regex;
use std::sync::OnceLock;

use super::identity_service::IdentityError;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$")
            .expect("Invalid regex pattern defined in code")
    })
}

pub fn validate_email(email: &str) -> Result<&str, IdentityError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(IdentityError::validation("Email is required"));
    }

    if !email_regex().is_match(trimmed) {
        return Err(IdentityError::validation("Invalid email format"));
    }

    Ok(trimmed)
}

pub fn validate_username(username: &str) -> Result<&str, IdentityError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(IdentityError::validation("Username is required"));
    }

    if trimmed.len() > 64 {
        return Err(IdentityError::validation(
            "Username must be 64 characters or less",
        ));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str, min_length: usize) -> Result<&str, IdentityError> {
    if password.chars().count() < min_length {
        return Err(IdentityError::validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }

    Ok(password)
}
