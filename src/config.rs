//! Runtime configuration
//!
//! Settings come from global command-line options, each with an environment
//! variable fallback handled by clap. [`Config`] is the resolved, validated form
//! handed to commands.

use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";
pub const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// `key: value` lines per record
    Text,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Microsoft Graph root, without the version segment
    pub graph_url: String,
    /// Azure Resource Manager root used by Power Automate commands
    pub management_url: String,
    /// Ask the user to resolve missing options and ambiguous matches
    pub prompt: bool,
    pub output: OutputFormat,
    pub timeout: Duration,
}

impl Config {
    /// Builds the configuration for one invocation
    ///
    /// # Arguments
    /// * `graph_url` - Root of Microsoft Graph, without the version segment
    /// * `management_url` - Root of the Power Platform management API
    /// * `prompt` - Whether missing or ambiguous input is asked for interactively
    /// * `output` - Output format of the command result
    /// * `timeout` - Timeout of each HTTP request
    pub fn new(
        graph_url: &str,
        management_url: &str,
        prompt: bool,
        output: OutputFormat,
        timeout: Duration,
    ) -> Self {
        Self {
            graph_url: graph_url.trim_end_matches('/').to_string(),
            management_url: management_url.trim_end_matches('/').to_string(),
            prompt,
            output,
            timeout,
        }
    }

    /// Absolute Graph v1.0 url for `path` (which starts with `/`)
    pub fn graph(&self, path: &str) -> String {
        format!("{}/v1.0{}", self.graph_url, path)
    }

    /// Absolute Azure management url for `path` (which starts with `/`)
    pub fn management(&self, path: &str) -> String {
        format!("{}{}", self.management_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_GRAPH_URL,
            DEFAULT_MANAGEMENT_URL,
            false,
            OutputFormat::Json,
            Duration::from_secs(30),
        )
    }
}
