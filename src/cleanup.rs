//! Cleanup of temporary artifacts created by multi-step commands
//!
//! A command registers each temporary artifact right after creating it and hands
//! the outcome of its main work to [`Compensator::finish`]. Every artifact is then
//! removed exactly once, whether the work succeeded or not. Remote and local
//! artifacts are cleaned independently of each other.
//!
//! Error precedence: a failure of the main work is always what the caller sees.
//! When the main work succeeded, a failure to unlink a local temporary file
//! becomes the result. A failed DELETE of a remote temporary upload is only
//! logged; the user's target was written and the upload lives in their own drive.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::{context::CommandContext, error::CommandError, http::RequestOptions};

/// Something a command created only to get its work done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientArtifact {
    /// Temporary upload, removed with DELETE on `url`
    RemoteFile { url: String },
    /// Temporary local file, unlinked
    LocalFile { path: PathBuf },
}

/// Registry of the temporary artifacts of one command run
#[derive(Debug, Default)]
pub struct Compensator {
    artifacts: Vec<TransientArtifact>,
}

impl Compensator {
    /// Compensator with nothing tracked
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an artifact; call right after it was created
    pub fn track(&mut self, artifact: TransientArtifact) {
        debug!("Tracking temporary artifact {:?}", artifact);
        self.artifacts.push(artifact);
    }

    /// Removes every tracked artifact and combines the cleanup outcome with `outcome`.
    ///
    /// Remote artifacts are removed first, then local ones. Each gets exactly one
    /// attempt, regardless of earlier failures.
    ///
    /// # Returns
    ///
    /// * `outcome` unchanged if it is an error
    /// * The first local unlink failure if `outcome` succeeded
    /// * `outcome` otherwise
    pub async fn finish<T>(self, ctx: &CommandContext, outcome: Result<T>) -> Result<T> {
        let (remote, local): (Vec<_>, Vec<_>) = self
            .artifacts
            .into_iter()
            .partition(|artifact| matches!(artifact, TransientArtifact::RemoteFile { .. }));

        for artifact in &remote {
            if let Err(e) = remove(ctx, artifact).await {
                warn!("Failed to remove temporary artifact {:?}: {}", artifact, e);
            }
        }

        let mut cleanup_error: Option<anyhow::Error> = None;
        for artifact in &local {
            if let Err(e) = remove(ctx, artifact).await {
                warn!("Failed to remove temporary artifact {:?}: {}", artifact, e);
                cleanup_error.get_or_insert(e);
            }
        }

        match (outcome, cleanup_error) {
            (Err(primary), _) => Err(primary),
            (Ok(_), Some(cleanup)) => Err(cleanup),
            (Ok(value), None) => Ok(value),
        }
    }
}

async fn remove(ctx: &CommandContext, artifact: &TransientArtifact) -> Result<()> {
    match artifact {
        TransientArtifact::RemoteFile { url } => {
            ctx.http.delete(RequestOptions::new(url.clone())).await?;
        }
        TransientArtifact::LocalFile { path } => {
            ctx.fs.remove(path).await.map_err(CommandError::Io)?;
        }
    }
    debug!("Removed temporary artifact {:?}", artifact);
    Ok(())
}
