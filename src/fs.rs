//! Local filesystem access used by file-oriented commands

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Filesystem operations commands perform on the local machine
///
/// Commands only go through this trait, so tests can swap in an implementation
/// that fails or records calls.
#[async_trait]
pub trait LocalFs: Send + Sync {
    /// Reads the whole file
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Creates or truncates the file and writes `contents`
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    /// Unlinks a file
    async fn remove(&self, path: &Path) -> io::Result<()>;
    /// Whether `path` exists; unreadable paths count as missing
    async fn exists(&self, path: &Path) -> bool;
}

/// [`LocalFs`] backed by `tokio::fs`
pub struct TokioFs;

#[async_trait]
impl LocalFs for TokioFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
