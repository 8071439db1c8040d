use std::sync::LazyLock;

use regex::Regex;

use crate::dns::is_valid_hostname;
use crate::server::response::ApiError;

const MIN_SUBDOMAIN_LEN: usize = 3;
const MAX_SUBDOMAIN_LEN: usize = 63;
const MIN_PASSWORD_LEN: usize = 8;
const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "app", "mail"];

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex")
});

pub fn validate_subdomain(subdomain: &str) -> Result<(), ApiError> {
    if subdomain.len() < MIN_SUBDOMAIN_LEN || subdomain.len() > MAX_SUBDOMAIN_LEN {
        return Err(ApiError::bad_request(format!(
            "Subdomain must be between {MIN_SUBDOMAIN_LEN} and {MAX_SUBDOMAIN_LEN} characters"
        )));
    }
    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::bad_request(
            "Subdomain can only contain lowercase letters, digits, and hyphens",
        ));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(ApiError::bad_request(
            "Subdomain cannot start or end with a hyphen",
        ));
    }
    if RESERVED_SUBDOMAINS.contains(&subdomain) {
        return Err(ApiError::bad_request(format!(
            "Subdomain '{subdomain}' is reserved"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid email address"))
    }
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Lowercases a domain name and checks that it is a plain host name.
pub fn normalize_domain(value: &str) -> Result<String, ApiError> {
    let domain = value.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.starts_with("*.") || !is_valid_hostname(&domain) {
        return Err(ApiError::bad_request(format!(
            "'{}' is not a valid domain name",
            value.trim()
        )));
    }
    Ok(domain)
}

/// Returns the trimmed value, or 400 when it is blank.
pub fn required(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Like [`required`] for optional update fields: `None` passes through.
pub fn required_opt(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    value.map(|v| required(&v, field)).transpose()
}

/// Lowercases and collapses every run of non-alphanumerics into one `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() || slugify(slug) != slug {
        return Err(ApiError::bad_request(
            "Slug can only contain lowercase letters, digits, and single hyphens",
        ));
    }
    Ok(())
}
