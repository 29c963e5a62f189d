//! Per-invocation command context
//!
//! Everything a command needs (configuration, the HTTP client, the prompter, the
//! filesystem and the access token) is bundled here, built once in `main` and
//! passed by reference through resolve, act and cleanup. Nothing survives the
//! invocation.

use anyhow::Result;
use tracing::debug;

use crate::{
    auth::AccessToken,
    config::Config,
    error::CommandError,
    fs::{LocalFs, TokioFs},
    http::HttpClient,
    prompt::{Prompter, TerminalPrompter},
};

pub struct CommandContext {
    pub config: Config,
    pub http: HttpClient,
    pub prompter: Box<dyn Prompter>,
    pub fs: Box<dyn LocalFs>,
    access_token: Option<String>,
}

impl CommandContext {
    /// Context wired to the terminal and the real filesystem
    pub fn new(config: Config, access_token: Option<String>) -> Result<Self> {
        let http = HttpClient::new(config.timeout, access_token.clone())?;
        Ok(Self {
            config,
            http,
            prompter: Box::new(TerminalPrompter::new()),
            fs: Box::new(TokioFs),
            access_token,
        })
    }

    /// Replaces the terminal prompter
    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    /// Replaces the local filesystem
    pub fn with_fs(mut self, fs: impl LocalFs + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// The parsed access token; commands that inspect it fail without one
    pub fn access_token(&self) -> Result<AccessToken> {
        let raw = self.access_token.as_deref().ok_or_else(|| {
            CommandError::Usage(
                "No access token. Pass --access-token or set M365_ACCESS_TOKEN.".to_string(),
            )
        })?;
        Ok(AccessToken::parse(raw))
    }

    /// Asks for confirmation unless `force` is set.
    ///
    /// Returns `false` when the user declined; callers then do nothing.
    pub fn confirm(&self, force: bool, message: &str) -> Result<bool> {
        if force {
            return Ok(true);
        }
        let confirmed = self.prompter.confirm(message)?;
        if !confirmed {
            debug!("Confirmation declined: {}", message);
        }
        Ok(confirmed)
    }
}
