//! Command-line interface for m365ctl
//!
//! Commands are grouped the way Microsoft 365 workloads are: `entra`, `teams`,
//! `file`, `flow` and `spo`, each with nested resource and verb subcommands.
//! Global options apply to every command and fall back to `M365_*` environment
//! variables.
//!
//! # Examples
//!
//! ```text
//! m365ctl entra group get --mail-nickname finance
//! m365ctl entra m365group recyclebinitem clear --force
//! m365ctl teams chat get --participants megan@contoso.com,alex@contoso.com
//! m365ctl spo search --web-url https://contoso.sharepoint.com --query-text "IsDocument:1" --all-results
//! ```

use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::{
    commands::{
        chat::ChatGetArgs,
        contenttype::FieldLinkRemoveArgs,
        convert::ConvertPdfArgs,
        flow::FlowExportArgs,
        group::{GroupGetArgs, GroupListArgs, RecycleBinClearArgs},
        search::SearchArgs,
        storageentity::StorageEntitySetArgs,
    },
    config::{Config, OutputFormat, DEFAULT_GRAPH_URL, DEFAULT_MANAGEMENT_URL},
};

#[derive(Parser, Debug)]
#[command(
    name = "m365ctl",
    about = "Manage Microsoft 365 tenants from the command line",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "M365_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Microsoft Graph root URL
    #[arg(long, global = true, env = "M365_GRAPH_URL", default_value = DEFAULT_GRAPH_URL)]
    pub graph_url: String,

    /// Azure management root URL, used by flow commands
    #[arg(long, global = true, env = "M365_MANAGEMENT_URL", default_value = DEFAULT_MANAGEMENT_URL)]
    pub management_url: String,

    /// Prompt for missing options and to choose between ambiguous matches
    #[arg(long, global = true, env = "M365_PROMPT")]
    pub prompt: bool,

    #[arg(long, global = true, env = "M365_OUTPUT", value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Request timeout in milliseconds
    #[arg(long, global = true, env = "M365_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,
}

impl Cli {
    /// Configuration assembled from the global options
    pub fn config(&self) -> Config {
        Config::new(
            &self.graph_url,
            &self.management_url,
            self.prompt,
            self.output,
            Duration::from_millis(self.timeout_ms),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Microsoft Entra ID
    Entra {
        #[command(subcommand)]
        command: EntraCommands,
    },
    /// Microsoft Teams
    Teams {
        #[command(subcommand)]
        command: TeamsCommands,
    },
    /// Files in OneDrive and SharePoint
    File {
        #[command(subcommand)]
        command: FileCommands,
    },
    /// Power Automate
    Flow {
        #[command(subcommand)]
        command: FlowCommands,
    },
    /// SharePoint Online
    Spo {
        #[command(subcommand)]
        command: SpoCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntraCommands {
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Microsoft 365 groups
    M365group {
        #[command(subcommand)]
        command: M365GroupCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Get a group by id, display name or mail nickname
    Get(GroupGetArgs),
    /// List groups
    List(GroupListArgs),
}

#[derive(Subcommand, Debug)]
pub enum M365GroupCommands {
    /// Deleted Microsoft 365 groups
    Recyclebinitem {
        #[command(subcommand)]
        command: RecycleBinItemCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecycleBinItemCommands {
    /// List deleted Microsoft 365 groups
    List,
    /// Permanently delete every Microsoft 365 group in the recycle bin
    Clear(RecycleBinClearArgs),
}

#[derive(Subcommand, Debug)]
pub enum TeamsCommands {
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChatCommands {
    /// Get a chat by id, topic or participants
    Get(ChatGetArgs),
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    Convert {
        #[command(subcommand)]
        command: ConvertCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConvertCommands {
    /// Convert a file to PDF
    Pdf(ConvertPdfArgs),
}

#[derive(Subcommand, Debug)]
pub enum FlowCommands {
    /// Export a flow as a package or ARM template
    Export(FlowExportArgs),
}

#[derive(Subcommand, Debug)]
pub enum SpoCommands {
    Contenttype {
        #[command(subcommand)]
        command: ContentTypeCommands,
    },
    /// Tenant properties
    Storageentity {
        #[command(subcommand)]
        command: StorageEntityCommands,
    },
    /// Run a search query
    Search(SearchArgs),
}

#[derive(Subcommand, Debug)]
pub enum ContentTypeCommands {
    Field {
        #[command(subcommand)]
        command: FieldCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum FieldCommands {
    /// Remove a field link from a content type
    Remove(FieldLinkRemoveArgs),
}

#[derive(Subcommand, Debug)]
pub enum StorageEntityCommands {
    /// Set a tenant property
    Set(StorageEntitySetArgs),
}
