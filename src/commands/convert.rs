//! `file convert pdf`
//!
//! Graph converts a drive item to PDF on download (`content?format=pdf`), so a
//! local source is first uploaded to the signed-in user's drive under a temporary
//! name, and a remote target is written to a local temporary file before being
//! uploaded. Both temporaries are removed afterwards whether the conversion
//! succeeded or not.

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    cleanup::{Compensator, TransientArtifact},
    context::CommandContext,
    drive::{is_remote, resolve_file_url, DriveItem},
    error::CommandError,
    http::RequestOptions,
    validation::validate_absolute_url,
};

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertPdfArgs {
    /// Local path or SharePoint URL of the file to convert
    #[arg(short, long)]
    pub source_file: String,

    /// Local path or SharePoint URL where the PDF is written
    #[arg(short, long)]
    pub target_file: String,
}

async fn validate(ctx: &CommandContext, args: &ConvertPdfArgs) -> Result<()> {
    if is_remote(&args.source_file) {
        validate_absolute_url("--source-file", &args.source_file).map_err(CommandError::Usage)?;
    } else {
        if !ctx.fs.exists(Path::new(&args.source_file)).await {
            return Err(CommandError::Usage(format!(
                "Specified source file {} doesn't exist",
                args.source_file
            ))
            .into());
        }
        ctx.access_token()?
            .ensure_delegated("Converting a local file requires delegated permissions.")?;
    }

    if is_remote(&args.target_file) {
        validate_absolute_url("--target-file", &args.target_file).map_err(CommandError::Usage)?;
    }
    Ok(())
}

/// Uploads a local file to the user's drive under a temporary name
async fn upload_source(
    ctx: &CommandContext,
    source: &Path,
    compensator: &mut Compensator,
) -> Result<DriveItem> {
    let contents = ctx.fs.read(source).await.map_err(CommandError::Io)?;
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{}{}", Uuid::new_v4(), extension);

    let item = ctx
        .http
        .put_json(
            RequestOptions::new(ctx.config.graph(&format!("/me/drive/root:/{}:/content", name)))
                .bytes(contents),
        )
        .await?;
    let id = item.get("id").and_then(Value::as_str).ok_or_else(|| {
        CommandError::Remote("Upload response did not contain the id of the uploaded file".to_string())
    })?;

    let item_url = ctx.config.graph(&format!("/me/drive/items/{}", id));
    compensator.track(TransientArtifact::RemoteFile {
        url: item_url.clone(),
    });
    debug!("Uploaded {} as {}", source.display(), name);
    Ok(DriveItem::Item { item_url })
}

async fn convert(
    ctx: &CommandContext,
    args: &ConvertPdfArgs,
    compensator: &mut Compensator,
) -> Result<()> {
    let source = if is_remote(&args.source_file) {
        resolve_file_url(ctx, &args.source_file).await?
    } else {
        upload_source(ctx, Path::new(&args.source_file), compensator).await?
    };

    let pdf = ctx
        .http
        .get_bytes(RequestOptions::new(format!("{}?format=pdf", source.content_url())))
        .await?;
    debug!("Received {} bytes of PDF", pdf.len());

    if !is_remote(&args.target_file) {
        ctx.fs
            .write(Path::new(&args.target_file), &pdf)
            .await
            .map_err(CommandError::Io)?;
        return Ok(());
    }

    let local: PathBuf = std::env::temp_dir().join(format!("{}.pdf", Uuid::new_v4()));
    ctx.fs.write(&local, &pdf).await.map_err(CommandError::Io)?;
    compensator.track(TransientArtifact::LocalFile {
        path: local.clone(),
    });

    let target = resolve_file_url(ctx, &args.target_file).await?;
    let contents = ctx.fs.read(&local).await.map_err(CommandError::Io)?;
    ctx.http
        .put_json(RequestOptions::new(target.content_url()).bytes(contents))
        .await?;
    Ok(())
}

/// Converts a local or remote file to PDF
///
/// Temporary artifacts are removed whatever the outcome. See [`Compensator::finish`]
/// for which error is reported.
///
/// # Arguments
/// * `ctx` - Command context; a local source needs a delegated token
/// * `args` - Source and target, each a local path or a SharePoint URL
///
/// # Returns
/// * `Result<Value>` - `Value::Null` on success
pub async fn pdf(ctx: &CommandContext, args: &ConvertPdfArgs) -> Result<Value> {
    validate(ctx, args).await?;

    let mut compensator = Compensator::new();
    let outcome = convert(ctx, args, &mut compensator).await;
    compensator.finish(ctx, outcome).await?;

    info!("Converted {} to {}", args.source_file, args.target_file);
    Ok(Value::Null)
}
