//! Command implementations
//!
//! Each command validates its options, resolves what it operates on, acts, and
//! returns the value to print (`Value::Null` when there is nothing to print).

pub mod chat;
pub mod contenttype;
pub mod convert;
pub mod flow;
pub mod group;
pub mod search;
pub mod storageentity;

use anyhow::Result;
use serde_json::Value;

use crate::{
    cli::{
        ChatCommands, Commands, ContentTypeCommands, ConvertCommands, EntraCommands,
        FieldCommands, FileCommands, FlowCommands, GroupCommands, M365GroupCommands,
        RecycleBinItemCommands, SpoCommands, StorageEntityCommands, TeamsCommands,
    },
    context::CommandContext,
};

/// Dispatches a parsed command
pub async fn run(command: &Commands, ctx: &CommandContext) -> Result<Value> {
    match command {
        Commands::Entra { command } => match command {
            EntraCommands::Group { command } => match command {
                GroupCommands::Get(args) => group::get(ctx, args).await,
                GroupCommands::List(args) => group::list(ctx, args).await,
            },
            EntraCommands::M365group {
                command: M365GroupCommands::Recyclebinitem { command },
            } => match command {
                RecycleBinItemCommands::List => group::list_deleted(ctx).await,
                RecycleBinItemCommands::Clear(args) => group::clear_deleted(ctx, args).await,
            },
        },
        Commands::Teams {
            command: TeamsCommands::Chat { command: ChatCommands::Get(args) },
        } => chat::get(ctx, args).await,
        Commands::File {
            command: FileCommands::Convert { command: ConvertCommands::Pdf(args) },
        } => convert::pdf(ctx, args).await,
        Commands::Flow {
            command: FlowCommands::Export(args),
        } => flow::export(ctx, args).await,
        Commands::Spo { command } => match command {
            SpoCommands::Contenttype {
                command: ContentTypeCommands::Field { command: FieldCommands::Remove(args) },
            } => contenttype::remove_field_link(ctx, args).await,
            SpoCommands::Storageentity {
                command: StorageEntityCommands::Set(args),
            } => storageentity::set(ctx, args).await,
            SpoCommands::Search(args) => search::search(ctx, args).await,
        },
    }
}
