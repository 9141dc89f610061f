/// Input validation utilities
use crate::error::ReportflowError;
use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Splits a comma-separated address list, trimming entries and dropping
/// blanks. Order and duplicates are preserved.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts only absolute http(s) URLs
pub fn validate_service_url(name: &str, value: &str) -> Result<(), ReportflowError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ReportflowError::Config(format!("Invalid {} URL '{}': {}", name, value, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ReportflowError::Config(format!(
            "Invalid {} URL scheme '{}'",
            name, other
        ))),
    }
}
