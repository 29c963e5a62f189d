//! `entra group` and `entra m365group recyclebinitem` commands

use anyhow::Result;
use clap::{ArgGroup, Args};
use serde_json::Value;
use tracing::info;

use crate::{
    context::CommandContext,
    error::CommandError,
    http::RequestOptions,
    paginate::get_all_items,
    resolve::{filter_value, pick_option, resolve_single, Candidate, ResourceLocator},
    validation::validate_guid,
};

const DELETED_GROUPS_PATH: &str =
    "/directory/deletedItems/Microsoft.Graph.Group?$filter=groupTypes/any(c:c+eq+'Unified')&$top=100";

#[derive(Args, Debug, Clone, Default)]
#[command(group(
    ArgGroup::new("locator")
        .args(["id", "display_name", "mail_nickname"])
        .multiple(false)
))]
pub struct GroupGetArgs {
    /// Id of the group
    #[arg(short, long)]
    pub id: Option<String>,

    /// Display name of the group
    #[arg(short = 'n', long)]
    pub display_name: Option<String>,

    /// Mail nickname of the group
    #[arg(short, long)]
    pub mail_nickname: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GroupListArgs {
    /// Only list groups whose display name starts with this value
    #[arg(short = 'n', long)]
    pub display_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RecycleBinClearArgs {
    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl GroupGetArgs {
    fn locator(&self, ctx: &CommandContext) -> Result<ResourceLocator> {
        let (option, value) = pick_option(
            ctx,
            &[
                ("--id", self.id.as_deref()),
                ("--display-name", self.display_name.as_deref()),
                ("--mail-nickname", self.mail_nickname.as_deref()),
            ],
        )?;
        Ok(match option.as_str() {
            "--id" => ResourceLocator::Id(value),
            "--display-name" => ResourceLocator::Name {
                property: "displayName".to_string(),
                value,
            },
            _ => ResourceLocator::Name {
                property: "mailNickname".to_string(),
                value,
            },
        })
    }
}

/// Resolves a group locator to the group's id
pub async fn resolve_group_id(ctx: &CommandContext, locator: &ResourceLocator) -> Result<String> {
    match locator {
        ResourceLocator::Id(id) => {
            validate_guid("--id", id).map_err(CommandError::Usage)?;
            Ok(id.clone())
        }
        ResourceLocator::Name { property, value } => {
            let url = ctx.config.graph(&format!(
                "/groups?$filter={} eq '{}'&$select=id,displayName",
                property,
                filter_value(value)
            ));
            let records = get_all_items(&ctx.http, RequestOptions::new(url)).await?;
            let key = if property == "mailNickname" {
                "mail nickname"
            } else {
                "name"
            };

            let group = resolve_single(
                ctx,
                Candidate::from_records(records, "displayName"),
                &format!("The specified group '{}' does not exist.", value),
                &format!("Multiple groups with {} '{}' found.", key, value),
            )?;
            Ok(group.id)
        }
        other => Err(CommandError::Usage(format!("Groups cannot be looked up by {:?}", other)).into()),
    }
}

/// Gets one group by id, display name or mail nickname
///
/// # Errors
/// * Usage error when no locator was given and prompting is off
/// * Not found when nothing matches
/// * Several matches fail listing their ids, unless prompting is on
pub async fn get(ctx: &CommandContext, args: &GroupGetArgs) -> Result<Value> {
    let locator = args.locator(ctx)?;
    let id = resolve_group_id(ctx, &locator).await?;
    ctx.http
        .get_json(RequestOptions::new(ctx.config.graph(&format!("/groups/{}", id))))
        .await
}

/// Lists groups across all pages
pub async fn list(ctx: &CommandContext, args: &GroupListArgs) -> Result<Value> {
    let path = match &args.display_name {
        Some(prefix) => format!(
            "/groups?$filter=startswith(displayName,'{}')",
            filter_value(prefix)
        ),
        None => "/groups".to_string(),
    };
    let groups = get_all_items(&ctx.http, RequestOptions::new(ctx.config.graph(&path))).await?;
    Ok(Value::Array(groups))
}

/// Lists deleted Microsoft 365 groups
pub async fn list_deleted(ctx: &CommandContext) -> Result<Value> {
    let items = get_all_items(
        &ctx.http,
        RequestOptions::new(ctx.config.graph(DELETED_GROUPS_PATH)),
    )
    .await?;
    Ok(Value::Array(items))
}

/// Permanently deletes every Microsoft 365 group in the recycle bin, one at a time
pub async fn clear_deleted(ctx: &CommandContext, args: &RecycleBinClearArgs) -> Result<Value> {
    if !ctx.confirm(
        args.force,
        "Are you sure you want to clear all M365 Groups from the recycle bin?",
    )? {
        return Ok(Value::Null);
    }

    let items = get_all_items(
        &ctx.http,
        RequestOptions::new(ctx.config.graph(DELETED_GROUPS_PATH)),
    )
    .await?;

    let mut removed = 0;
    for id in items.iter().filter_map(|item| item.get("id").and_then(Value::as_str)) {
        ctx.http
            .delete(RequestOptions::new(
                ctx.config.graph(&format!("/directory/deletedItems/{}", id)),
            ))
            .await?;
        removed += 1;
    }

    info!("Removed {} group(s) from the recycle bin", removed);
    Ok(Value::Null)
}
