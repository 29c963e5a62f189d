//! Access token inspection
//!
//! Tokens are acquired outside this tool. All we need from them is whether they
//! were issued for a signed-in user or for an application, and who the user is.
//! The JWT payload is decoded without verifying the signature; the services do that.

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use tracing::debug;

use crate::error::CommandError;

#[derive(Debug, Default, Deserialize)]
struct Claims {
    scp: Option<String>,
    roles: Option<Vec<String>>,
    upn: Option<String>,
    preferred_username: Option<String>,
    unique_name: Option<String>,
}

/// A parsed bearer token
#[derive(Debug)]
pub struct AccessToken {
    claims: Claims,
}

impl AccessToken {
    /// Parses the payload segment of a JWT.
    ///
    /// A token that is not a well-formed JWT parses to empty claims, which then
    /// fails classification with the auth-shape error.
    pub fn parse(raw: &str) -> Self {
        let claims = raw
            .split('.')
            .nth(1)
            .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
            .and_then(|bytes| serde_json::from_slice::<Claims>(&bytes).ok())
            .unwrap_or_default();

        debug!(
            "Parsed access token (scp: {}, roles: {})",
            claims.scp.is_some(),
            claims.roles.is_some()
        );
        Self { claims }
    }

    /// `true` for application tokens, `false` for delegated ones
    pub fn is_app_only(&self) -> Result<bool> {
        match (&self.claims.scp, &self.claims.roles) {
            (Some(_), _) => Ok(false),
            (None, Some(_)) => Ok(true),
            (None, None) => Err(CommandError::AuthShape.into()),
        }
    }

    /// Fails unless the token was issued to a signed-in user
    pub fn ensure_delegated(&self, message: &str) -> Result<()> {
        if self.is_app_only()? {
            return Err(CommandError::Usage(message.to_string()).into());
        }
        Ok(())
    }

    /// Sign-in name of the user the token was issued to
    pub fn user_principal(&self) -> Option<&str> {
        self.claims
            .upn
            .as_deref()
            .or(self.claims.preferred_username.as_deref())
            .or(self.claims.unique_name.as_deref())
    }
}
