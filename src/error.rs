//! Error taxonomy shared by every command
//!
//! Commands return `anyhow::Result`, but the failures they raise on purpose are
//! built from [`CommandError`] so callers (and tests) can tell a missing resource
//! from an ambiguous lookup or a provider-side failure. Every variant renders as
//! the single line the user sees.

use serde_json::Value;
use thiserror::Error;

/// Fixed diagnostic for tokens that carry neither `scp` nor `roles`.
pub const AUTH_SHAPE_MESSAGE: &str =
    "Unable to determine if the access token is delegated or application-only.";

#[derive(Debug, Error)]
pub enum CommandError {
    /// A lookup returned no candidates
    #[error("{0}")]
    NotFound(String),

    /// A lookup returned several candidates and prompting is disabled
    #[error("{message} Found: {}.", .ids.join(", "))]
    Ambiguous { message: String, ids: Vec<String> },

    /// The provider returned a structured error
    #[error("{0}")]
    Remote(String),

    /// A CSOM batch reported an `ErrorInfo`
    #[error("{0}")]
    Csom(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}", AUTH_SHAPE_MESSAGE)]
    AuthShape,

    /// Missing or conflicting options
    #[error("{0}")]
    Usage(String),
}

/// Extracts the human-readable message from a provider error body.
///
/// Graph and Azure Resource Manager use `error.message` as a string, SharePoint
/// verbose JSON nests it as `error.message.value`, and SharePoint nometadata JSON
/// uses `odata.error.message.value`. Bodies that are not JSON are returned as-is.
pub fn remote_error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("Request failed with status code {}", status);
    }

    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };

    let candidates = [
        json.pointer("/error/message"),
        json.pointer("/error/message/value"),
        json.get("odata.error").and_then(|e| e.pointer("/message/value")),
        json.get("error_description"),
        json.get("message"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string());
    message
}
