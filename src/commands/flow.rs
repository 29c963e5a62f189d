//! `flow export`
//!
//! Exporting is a chain of dependent calls: the flow's display name names the
//! output file, the package resources feed the export request, and the export
//! response carries a pre-signed link to the package itself.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{
    context::CommandContext, error::CommandError, http::RequestOptions,
    validation::validate_guid,
};

const API_VERSION: &str = "api-version=2016-11-01";
const FLOW_RESOURCE_TYPE: &str = "Microsoft.Flow/flows";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Zip,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Json => "json",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FlowExportArgs {
    /// Name of the environment the flow lives in
    #[arg(short, long)]
    pub environment_name: String,

    /// Name (GUID) of the flow
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long, value_enum, default_value_t = ExportFormat::Zip)]
    pub format: ExportFormat,

    /// Display name of the package, defaults to the flow's display name
    #[arg(short = 'd', long)]
    pub package_display_name: Option<String>,

    #[arg(long)]
    pub package_description: Option<String>,

    #[arg(short = 'c', long)]
    pub package_created_by: Option<String>,

    #[arg(short = 's', long)]
    pub package_source_environment: Option<String>,

    /// File to write, defaults to `./<display name>.<format>`
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

impl FlowExportArgs {
    fn has_package_options(&self) -> bool {
        self.package_display_name.is_some()
            || self.package_description.is_some()
            || self.package_created_by.is_some()
            || self.package_source_environment.is_some()
    }

    async fn validate(&self, ctx: &CommandContext) -> Result<()> {
        validate_guid("--name", &self.name).map_err(CommandError::Usage)?;

        if self.format == ExportFormat::Json && self.has_package_options() {
            return Err(CommandError::Usage(
                "The package options can only be used when exporting as zip.".to_string(),
            )
            .into());
        }

        if let Some(parent) = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
        {
            if !ctx.fs.exists(parent).await {
                return Err(CommandError::Usage(format!(
                    "Specified path where to save the file does not exist: {}",
                    parent.display()
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Replaces characters that are not allowed in file names
fn file_name(display_name: &str) -> String {
    display_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '-',
            c => c,
        })
        .collect()
}

/// Marks the flow itself to be updated on import and everything else to be reused
fn mark_creation_types(resources: &mut Map<String, Value>) {
    for resource in resources.values_mut() {
        let creation_type = if resource.get("type").and_then(Value::as_str) == Some(FLOW_RESOURCE_TYPE)
        {
            "Update"
        } else {
            "Existing"
        };
        if let Some(resource) = resource.as_object_mut() {
            resource.insert("suggestedCreationType".to_string(), json!(creation_type));
        }
    }
}

fn export_errors(response: &Value) -> String {
    response
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

async fn export_package(
    ctx: &CommandContext,
    args: &FlowExportArgs,
    display_name: &str,
) -> Result<Vec<u8>> {
    let platform = format!(
        "/providers/Microsoft.BusinessAppPlatform/environments/{}",
        args.environment_name
    );
    let flow_id = format!("/providers/Microsoft.Flow/flows/{}", args.name);

    let listed = ctx
        .http
        .post_json(
            RequestOptions::new(ctx.config.management(&format!(
                "{}/listPackageResources?{}",
                platform, API_VERSION
            )))
            .json(json!({ "baseResourceIds": [flow_id] })),
        )
        .await?;
    let mut resources = listed
        .get("resources")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    mark_creation_types(&mut resources);
    debug!("Package contains {} resource(s)", resources.len());

    let body = json!({
        "includedResourceIds": [flow_id],
        "details": {
            "displayName": args.package_display_name.as_deref().unwrap_or(display_name),
            "description": args.package_description.as_deref().unwrap_or_default(),
            "creator": args.package_created_by.as_deref().unwrap_or_default(),
            "sourceEnvironment": args.package_source_environment.as_deref().unwrap_or_default(),
        },
        "resources": resources,
    });
    let exported = ctx
        .http
        .post_json(
            RequestOptions::new(ctx.config.management(&format!(
                "{}/exportPackage?{}",
                platform, API_VERSION
            )))
            .json(body),
        )
        .await?;

    if exported.get("status").and_then(Value::as_str) == Some("Failed") {
        return Err(CommandError::Remote(format!(
            "Export failed: {}",
            export_errors(&exported)
        ))
        .into());
    }

    let link = exported
        .pointer("/packageLink/value")
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::Remote("Export response did not contain a package link".to_string()))?;
    ctx.http
        .get_bytes(RequestOptions::new(link).anonymous())
        .await
}

async fn export_template(ctx: &CommandContext, args: &FlowExportArgs) -> Result<Vec<u8>> {
    let template = ctx
        .http
        .post_json(RequestOptions::new(ctx.config.management(&format!(
            "/providers/Microsoft.ProcessSimple/environments/{}/flows/{}/exportToARMTemplate?{}",
            args.environment_name, args.name, API_VERSION
        ))))
        .await?;
    Ok(serde_json::to_vec_pretty(&template)?)
}

/// Exports a flow and returns the path of the written file
pub async fn export(ctx: &CommandContext, args: &FlowExportArgs) -> Result<Value> {
    args.validate(ctx).await?;

    let flow = ctx
        .http
        .get_json(RequestOptions::new(ctx.config.management(&format!(
            "/providers/Microsoft.ProcessSimple/environments/{}/flows/{}?{}",
            args.environment_name, args.name, API_VERSION
        ))))
        .await?;
    let display_name = flow
        .pointer("/properties/displayName")
        .and_then(Value::as_str)
        .unwrap_or(&args.name)
        .to_string();
    debug!("Exporting flow '{}'", display_name);

    let contents = match args.format {
        ExportFormat::Zip => export_package(ctx, args, &display_name).await?,
        ExportFormat::Json => export_template(ctx, args).await?,
    };

    let path = args.path.clone().unwrap_or_else(|| {
        PathBuf::from(format!("./{}.{}", file_name(&display_name), args.format.extension()))
    });
    ctx.fs.write(&path, &contents).await.map_err(CommandError::Io)?;

    info!("Exported flow {} to {}", args.name, path.display());
    Ok(Value::String(path.display().to_string()))
}
