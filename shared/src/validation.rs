//! Input validation functions
//!
//! Shape checks for account and content input. Each function returns a
//! human-readable message suitable for a field-level error map.

/// Minimum and maximum length for names and usernames
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 31;

/// Minimum password length
pub const PASSWORD_MIN_LEN: usize = 8;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    let email_regex = regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map_err(|_| "Email must be valid".to_string())?;
    if !email_regex.is_match(email) {
        return Err("Email must be valid".to_string());
    }
    Ok(())
}

/// Validate password strength
///
/// At least eight characters with an uppercase letter, a lowercase letter,
/// a digit and a symbol.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if password.len() > 128 {
        return Err("Password too long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if !(has_upper && has_lower && has_digit && has_symbol) {
        return Err(
            "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate a first or last name
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err("Name should be 3-31 characters long".to_string());
    }
    Ok(())
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err("Username should be 3-31 characters long".to_string());
    }
    if trimmed.contains('@') || trimmed.chars().any(char::is_whitespace) {
        return Err("Username cannot contain spaces or '@'".to_string());
    }
    Ok(())
}

/// Validate a login identifier (email or username)
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.trim().is_empty() {
        return Err("Email or Username is required".to_string());
    }
    if identifier.contains('@') {
        return validate_email(identifier.trim());
    }
    Ok(())
}

/// Validate a topic or category slug supplied by a client
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("Slug is required".to_string());
    }
    if slug.len() > 200 {
        return Err("Slug too long".to_string());
    }
    let valid = slug
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if !valid || slug.starts_with('-') || slug.ends_with('-') {
        return Err("Slug may only contain letters, digits, '-' and '_'".to_string());
    }
    Ok(())
}
