//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a table prefix, including the trailing underscore.
pub const MAX_TABLE_PREFIX_LENGTH: usize = 32;

/// Maximum length of a hostname (RFC 1035).
pub const MAX_HOSTNAME_LENGTH: usize = 253;

lazy_static::lazy_static! {
    /// Table prefixes are spliced into identifiers, so they are restricted to
    /// lowercase ASCII and must end with an underscore.
    pub static ref TABLE_PREFIX_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*_$").unwrap();

    pub static ref HOSTNAME_LABEL_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap();

    pub static ref THEME_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").unwrap();

    pub static ref LANGUAGE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z]{2,3}(_[a-zA-Z]{2,4})?$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a SQL table prefix such as `pmf_` or `supp_`.
pub fn validate_table_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() {
        return Err(error("table_prefix_empty", "Table prefix must not be empty"));
    }
    if prefix.len() > MAX_TABLE_PREFIX_LENGTH {
        return Err(error(
            "table_prefix_length",
            "Table prefix must be at most 32 characters",
        ));
    }
    if !TABLE_PREFIX_REGEX.is_match(prefix) {
        return Err(error(
            "table_prefix_format",
            "Table prefix must start with a lowercase letter, contain only [a-z0-9_] and end with '_'",
        ));
    }
    Ok(())
}

/// Validates a hostname used as a tenant directory name.
///
/// Only lowercase DNS names are accepted, which also rules out path
/// separators and `..`.
pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    if hostname.is_empty() {
        return Err(error("hostname_empty", "Hostname must not be empty"));
    }
    if hostname.len() > MAX_HOSTNAME_LENGTH {
        return Err(error(
            "hostname_length",
            "Hostname must be at most 253 characters",
        ));
    }
    if !hostname.split('.').all(|label| HOSTNAME_LABEL_REGEX.is_match(label)) {
        return Err(error(
            "hostname_format",
            "Hostname must consist of lowercase DNS labels separated by dots",
        ));
    }
    Ok(())
}

/// Validates a theme directory name.
pub fn validate_theme_name(theme: &str) -> Result<(), ValidationError> {
    if THEME_NAME_REGEX.is_match(theme) {
        Ok(())
    } else {
        Err(error(
            "theme_name_format",
            "Theme name may only contain letters, digits, '-' and '_'",
        ))
    }
}

/// Longest language code the `VARCHAR(5)` lang columns can hold.
pub const MAX_LANGUAGE_CODE_LEN: usize = 5;

/// Validates a FAQ language code such as `en`, `de` or `pt_br`.
pub fn validate_language_code(lang: &str) -> Result<(), ValidationError> {
    if lang.len() > MAX_LANGUAGE_CODE_LEN {
        Err(error("language_code_length", "Language code is too long"))
    } else if LANGUAGE_CODE_REGEX.is_match(lang) {
        Ok(())
    } else {
        Err(error("language_code_format", "Invalid language code"))
    }
}

/// Validates an absolute http(s) URL ending with a slash.
pub fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    let has_scheme = url.starts_with("https://") || url.starts_with("http://");
    let host_part = url.split("://").nth(1).unwrap_or_default();
    if !has_scheme || host_part.trim_matches('/').is_empty() {
        return Err(error(
            "base_url_scheme",
            "URL must be an absolute http(s) URL",
        ));
    }
    if !url.ends_with('/') {
        return Err(error("base_url_slash", "URL must end with '/'"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(error("base_url_whitespace", "URL must not contain whitespace"));
    }
    Ok(())
}
