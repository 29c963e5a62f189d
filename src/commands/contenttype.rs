//! `spo contenttype field remove`

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    context::CommandContext,
    csom::{self, CsomParameter, CsomRequest},
    error::CommandError,
    http::{RequestOptions, SPO_JSON},
    resolve::filter_value,
    validation::{validate_absolute_url, validate_content_type_id, validate_guid},
};

/// Type id SharePoint prefixes client object identities with
const IDENTITY_TYPE_ID: &str = "740c6a0b-85e2-48a0-a494-e0f1759d4aa7";

#[derive(Args, Debug, Clone, Default)]
pub struct FieldLinkRemoveArgs {
    /// URL of the site where the content type is located
    #[arg(short = 'u', long)]
    pub web_url: String,

    /// Id of the content type
    #[arg(short = 'i', long = "id")]
    pub content_type_id: String,

    /// Id of the field link to remove
    #[arg(short, long)]
    pub field_link_id: String,

    /// Title of the list when removing from a list content type
    #[arg(short, long)]
    pub list_title: Option<String>,

    /// Push the change to content types inheriting from this one
    #[arg(short = 'c', long)]
    pub update_child_content_types: bool,

    /// Don't prompt for confirmation
    #[arg(long)]
    pub force: bool,
}

impl FieldLinkRemoveArgs {
    fn validate(&self) -> Result<(), String> {
        validate_absolute_url("--web-url", &self.web_url)?;
        validate_content_type_id(&self.content_type_id)?;
        validate_guid("--field-link-id", &self.field_link_id)?;
        if self.list_title.is_some() && self.update_child_content_types {
            return Err(
                "--update-child-content-types can only be used with site content types."
                    .to_string(),
            );
        }
        Ok(())
    }
}

async fn object_id(ctx: &CommandContext, url: String) -> Result<String> {
    let response = ctx
        .http
        .get_json(RequestOptions::new(url.clone()).header("Accept", SPO_JSON))
        .await?;
    response
        .get("Id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CommandError::Remote(format!("Response from {} did not contain an Id", url)).into())
}

fn content_type_identity(site_id: &str, web_id: &str, list_id: Option<&str>, content_type_id: &str) -> String {
    let list = list_id
        .map(|id| format!(":list:{}", id))
        .unwrap_or_default();
    format!(
        "{}|{}:site:{}:web:{}{}:contenttype:{}",
        Uuid::new_v4(),
        IDENTITY_TYPE_ID,
        site_id,
        web_id,
        list,
        content_type_id
    )
}

/// Builds the batch that deletes a field link and saves the content type
fn remove_field_link_request(identity: String, field_link_id: &str, update_children: bool) -> CsomRequest {
    let mut request = CsomRequest::new();
    let content_type = request.identity(identity);
    let field_links = request.property(content_type, "FieldLinks");
    let field_link = request.method_path(
        field_links,
        "GetById",
        vec![CsomParameter::Guid(field_link_id.to_string())],
    );
    request.object_path_action(field_link);
    request.method_action(field_link, "DeleteObject", Vec::new());
    request.method_action(
        content_type,
        "Update",
        vec![CsomParameter::Boolean(update_children)],
    );
    request
}

/// Removes a field link from a site or list content type after confirmation
pub async fn remove_field_link(ctx: &CommandContext, args: &FieldLinkRemoveArgs) -> Result<Value> {
    args.validate().map_err(CommandError::Usage)?;

    let message = format!(
        "Are you sure you want to remove the field link {} from content type {}?",
        args.field_link_id, args.content_type_id
    );
    if !ctx.confirm(args.force, &message)? {
        return Ok(Value::Null);
    }

    let web_url = args.web_url.trim_end_matches('/');
    let site_id = object_id(ctx, format!("{}/_api/site?$select=Id", web_url)).await?;
    let web_id = object_id(ctx, format!("{}/_api/web?$select=Id", web_url)).await?;
    let list_id = match &args.list_title {
        Some(title) => Some(
            object_id(
                ctx,
                format!(
                    "{}/_api/web/lists/GetByTitle('{}')?$select=Id",
                    web_url,
                    filter_value(title)
                ),
            )
            .await?,
        ),
        None => None,
    };
    debug!("Site {}, web {}, list {:?}", site_id, web_id, list_id);

    let identity = content_type_identity(&site_id, &web_id, list_id.as_deref(), &args.content_type_id);
    let request = remove_field_link_request(identity, &args.field_link_id, args.update_child_content_types);
    csom::execute(ctx, web_url, &request).await?;

    info!(
        "Removed field link {} from content type {}",
        args.field_link_id, args.content_type_id
    );
    Ok(Value::Null)
}
