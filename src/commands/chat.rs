//! `teams chat get`

use anyhow::Result;
use clap::{ArgGroup, Args};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use crate::{
    context::CommandContext,
    error::CommandError,
    http::RequestOptions,
    paginate::get_all_items,
    resolve::{filter_value, pick_option, resolve_single, Candidate, ResourceLocator},
};

const CHAT_SELECT: &str = "$expand=members&$select=id,topic,createdDateTime,chatType";

#[derive(Args, Debug, Clone, Default)]
#[command(group(
    ArgGroup::new("locator")
        .args(["id", "name", "participants"])
        .multiple(false)
))]
pub struct ChatGetArgs {
    /// Id of the chat
    #[arg(short, long)]
    pub id: Option<String>,

    /// Topic of the chat
    #[arg(short, long)]
    pub name: Option<String>,

    /// Comma-separated sign-in names of the other participants
    #[arg(short, long, value_delimiter = ',')]
    pub participants: Option<Vec<String>>,
}

impl ChatGetArgs {
    fn locator(&self, ctx: &CommandContext) -> Result<ResourceLocator> {
        let participants = self.participants.as_ref().map(|p| p.join(","));
        let (option, value) = pick_option(
            ctx,
            &[
                ("--id", self.id.as_deref()),
                ("--name", self.name.as_deref()),
                ("--participants", participants.as_deref()),
            ],
        )?;
        Ok(match option.as_str() {
            "--id" => ResourceLocator::Id(value),
            "--name" => ResourceLocator::Name {
                property: "topic".to_string(),
                value,
            },
            _ => ResourceLocator::Participants(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        })
    }
}

fn member_emails(chat: &Value) -> BTreeSet<String> {
    chat.get("members")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m.get("email").and_then(Value::as_str))
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

async fn find_by_participants(ctx: &CommandContext, participants: &[String]) -> Result<String> {
    let token = ctx.access_token()?;
    token.ensure_delegated("This command requires delegated permissions when using --participants.")?;
    let me = token.user_principal().ok_or_else(|| {
        CommandError::Usage("Unable to determine the signed-in user from the access token.".to_string())
    })?;

    let mut expected: BTreeSet<String> = participants.iter().map(|p| p.to_lowercase()).collect();
    expected.insert(me.to_lowercase());
    let chat_type = if expected.len() == 2 { "oneOnOne" } else { "group" };
    debug!("Looking for a {} chat with {:?}", chat_type, expected);

    let chats = get_all_items(
        &ctx.http,
        RequestOptions::new(ctx.config.graph(&format!(
            "/chats?$filter=chatType eq '{}'&{}",
            chat_type, CHAT_SELECT
        ))),
    )
    .await?;
    let matching: Vec<Value> = chats
        .into_iter()
        .filter(|chat| member_emails(chat) == expected)
        .collect();

    let joined = participants.join(", ");
    let chat = resolve_single(
        ctx,
        Candidate::from_records(matching, "topic"),
        &format!("No chat conversation was found with {}.", joined),
        &format!("Multiple chats with participants '{}' found.", joined),
    )?;
    Ok(chat.id)
}

async fn find_by_name(ctx: &CommandContext, name: &str) -> Result<String> {
    let chats = get_all_items(
        &ctx.http,
        RequestOptions::new(ctx.config.graph(&format!(
            "/chats?$filter=topic eq '{}'&{}",
            filter_value(name),
            CHAT_SELECT
        ))),
    )
    .await?;

    let chat = resolve_single(
        ctx,
        Candidate::from_records(chats, "topic"),
        &format!("The specified chat '{}' does not exist.", name),
        &format!("Multiple chats with name '{}' found.", name),
    )?;
    Ok(chat.id)
}

/// Gets a chat by id, topic or exact participant set
///
/// # Arguments
/// * `ctx` - Command context; `--participants` needs a delegated token
/// * `args` - Exactly one locator
///
/// # Returns
/// * `Result<Value>` - The chat as returned by Graph
pub async fn get(ctx: &CommandContext, args: &ChatGetArgs) -> Result<Value> {
    let id = match args.locator(ctx)? {
        ResourceLocator::Id(id) => id,
        ResourceLocator::Name { value, .. } => find_by_name(ctx, &value).await?,
        ResourceLocator::Participants(participants) => {
            find_by_participants(ctx, &participants).await?
        }
    };

    ctx.http
        .get_json(RequestOptions::new(ctx.config.graph(&format!("/chats/{}", id))))
        .await
}
