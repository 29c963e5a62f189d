//! Option validation run before any request is sent

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

fn guid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\{?[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\}?$")
            .expect("GUID pattern is valid")
    })
}

fn content_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^0x[0-9a-fA-F]+$").expect("content type pattern is valid")
    })
}

/// Whether `value` is a GUID, with or without braces
///
/// # Examples
///
/// ```
/// use m365ctl::validation::is_valid_guid;
///
/// assert!(is_valid_guid("{3989cb59-ce1a-4a5c-bb78-257c5c39381d}"));
/// assert!(!is_valid_guid("3989cb59"));
/// ```
pub fn is_valid_guid(value: &str) -> bool {
    guid_pattern().is_match(value)
}

/// Validates a GUID option, returning a usage message naming the option
pub fn validate_guid(option: &str, value: &str) -> Result<(), String> {
    if is_valid_guid(value) {
        Ok(())
    } else {
        Err(format!("{} is not a valid GUID for option {}.", value, option))
    }
}

/// Validates an absolute http(s) URL such as a SharePoint site URL
pub fn validate_absolute_url(option: &str, value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(format!("{} is not a valid absolute URL for option {}.", value, option)),
    }
}

/// Validates a SharePoint content type id (`0x0101...`)
pub fn validate_content_type_id(value: &str) -> Result<(), String> {
    if content_type_pattern().is_match(value) {
        Ok(())
    } else {
        Err(format!("{} is not a valid content type ID.", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid() {
        assert!(is_valid_guid("5ee2dd25-d941-455a-9bdb-7f2c54aed11b"));
        assert!(is_valid_guid("{5EE2DD25-D941-455A-9BDB-7F2C54AED11B}"));
        assert!(!is_valid_guid("5ee2dd25d941455a9bdb7f2c54aed11b"));
        assert_eq!(
            validate_guid("--id", "abc"),
            Err("abc is not a valid GUID for option --id.".to_string())
        );
    }

    #[test]
    fn test_absolute_url() {
        assert!(validate_absolute_url("--web-url", "https://contoso.sharepoint.com/sites/a").is_ok());
        assert!(validate_absolute_url("--web-url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_absolute_url("--web-url", "/sites/a").is_err());
        assert!(validate_absolute_url("--web-url", "ftp://contoso.com").is_err());
    }

    #[test]
    fn test_content_type_id() {
        assert!(validate_content_type_id("0x0100558D85B7216F6A489A499DB361E1AE2F").is_ok());
        assert!(validate_content_type_id("0101").is_err());
    }
}
