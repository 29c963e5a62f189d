//! `spo storageentity set`
//!
//! Tenant properties live on the app catalog's root web but can only be written
//! through the tenant admin site.

use anyhow::Result;
use clap::Args;
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use crate::{
    context::CommandContext,
    csom::{self, CsomParameter, CsomRequest, TENANT_TYPE_ID},
    error::CommandError,
    validation::validate_absolute_url,
};

#[derive(Args, Debug, Clone, Default)]
pub struct StorageEntitySetArgs {
    /// URL of the tenant app catalog site
    #[arg(short, long)]
    pub app_catalog_url: String,

    /// Name of the tenant property
    #[arg(short, long)]
    pub key: String,

    #[arg(short, long)]
    pub value: String,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub comment: Option<String>,

    /// Tenant admin site, derived from the app catalog URL when omitted
    #[arg(long)]
    pub admin_url: Option<String>,
}

/// `https://contoso.sharepoint.com/...` → `https://contoso-admin.sharepoint.com`
fn admin_url(app_catalog_url: &str) -> Result<String> {
    let url = Url::parse(app_catalog_url)
        .map_err(|_| CommandError::Usage(format!("{} is not a valid URL", app_catalog_url)))?;
    let host = url.host_str().unwrap_or_default();
    let (tenant, domain) = host.split_once('.').ok_or_else(|| {
        CommandError::Usage(format!("Unable to determine the admin site for {}", app_catalog_url))
    })?;
    let tenant = tenant.strip_suffix("-admin").unwrap_or(tenant);
    Ok(format!("{}://{}-admin.{}", url.scheme(), tenant, domain))
}

fn set_storage_entity_request(args: &StorageEntitySetArgs) -> CsomRequest {
    let mut request = CsomRequest::new();
    let tenant = request.constructor(TENANT_TYPE_ID);
    let site = request.method_path(
        tenant,
        "GetSiteByUrl",
        vec![CsomParameter::String(args.app_catalog_url.clone())],
    );
    let root_web = request.property(site, "RootWeb");
    request.method_action(
        root_web,
        "SetStorageEntity",
        vec![
            CsomParameter::String(args.key.clone()),
            CsomParameter::String(args.value.clone()),
            CsomParameter::String(args.description.clone().unwrap_or_default()),
            CsomParameter::String(args.comment.clone().unwrap_or_default()),
        ],
    );
    request
}

/// Sets a tenant property on an app catalog
///
/// # Errors
/// Access denied from SharePoint is reported as a hint to use a tenant admin account.
pub async fn set(ctx: &CommandContext, args: &StorageEntitySetArgs) -> Result<Value> {
    validate_absolute_url("--app-catalog-url", &args.app_catalog_url).map_err(CommandError::Usage)?;

    let admin = match &args.admin_url {
        Some(url) => {
            validate_absolute_url("--admin-url", url).map_err(CommandError::Usage)?;
            url.clone()
        }
        None => admin_url(&args.app_catalog_url)?,
    };

    let request = set_storage_entity_request(args);
    if let Err(err) = csom::execute(ctx, &admin, &request).await {
        return match err.downcast_ref::<CommandError>() {
            Some(CommandError::Csom(message)) if message.contains("Access denied") => Err(
                CommandError::Csom("Access denied. Make sure you are a tenant admin.".to_string())
                    .into(),
            ),
            _ => Err(err),
        };
    }

    info!("Set tenant property {}", args.key);
    Ok(Value::Null)
}
