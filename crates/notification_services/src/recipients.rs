use std::sync::LazyLock;

use regex::Regex;

use crate::types::NotificationError;

// RFC 5322 style pattern, simplified but strict about domain structure:
// at least one dot, no consecutive dots, alphabetic TLD of two or more chars.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$",
    )
    .unwrap()
});

/// Parse recipient addresses from a raw configuration value.
///
/// Supports both a single address and a comma-separated list. Candidates
/// are trimmed, empty entries are discarded and syntactically invalid
/// addresses are dropped with a warning. Fails when the value is absent,
/// empty, or yields no valid address.
pub fn parse_recipients(raw: Option<&str>) -> Result<Vec<String>, NotificationError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NotificationError::Config("recipient address list is not set".to_string()))?;

    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for candidate in raw.split(',').map(str::trim) {
        if candidate.is_empty() {
            continue;
        }
        if is_valid_email(candidate) {
            valid.push(candidate.to_string());
        } else {
            invalid.push(candidate.to_string());
        }
    }

    if !invalid.is_empty() {
        log::warn!("Invalid email addresses found and skipped: {:?}", invalid);
    }

    if valid.is_empty() {
        return Err(NotificationError::Config(
            "no valid email addresses found in recipient list".to_string(),
        ));
    }

    log::info!("Parsed {} valid recipient address(es)", valid.len());
    Ok(valid)
}

/// The first valid address from the configuration, if any.
pub fn primary_recipient(raw: Option<&str>) -> Option<String> {
    parse_recipients(raw).ok()?.into_iter().next()
}

/// Validate a single email address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}
