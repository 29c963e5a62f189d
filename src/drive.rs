//! Mapping SharePoint file URLs to Graph drive items
//!
//! A file URL such as
//! `https://contoso.sharepoint.com/sites/project/Shared%20Documents/plan.docx` is
//! resolved in three steps: the site id from the host and site path, the site's
//! drives, and the drive whose web URL is the longest prefix of the file URL.
//! What remains of the URL is the path inside that drive.

use anyhow::{Context, Result};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::{
    context::CommandContext,
    error::CommandError,
    http::RequestOptions,
    paginate::get_all_items,
};

/// A file addressed through Graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveItem {
    /// `<drive_url>/root:<path>`
    Path { drive_url: String, path: String },
    /// `<item_url>` of an item addressed by id
    Item { item_url: String },
}

impl DriveItem {
    /// Url of the item's content stream
    pub fn content_url(&self) -> String {
        match self {
            Self::Path { drive_url, path } => format!("{}/root:{}:/content", drive_url, path),
            Self::Item { item_url } => format!("{}/content", item_url),
        }
    }
}

/// `true` when `location` is an absolute http(s) URL rather than a local path
pub fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Site-relative part of a SharePoint path: `/sites/<name>` or `/teams/<name>`,
/// empty for the root site.
pub fn site_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [kind, name, ..] if kind.eq_ignore_ascii_case("sites") || kind.eq_ignore_ascii_case("teams") => {
            format!("/{}/{}", kind, name)
        }
        _ => String::new(),
    }
}

/// Origin (scheme, host and port) plus path, lowercased, used to compare drive and file URLs
fn normalized(url: &Url) -> String {
    format!(
        "{}{}",
        url.origin().ascii_serialization(),
        url.path().trim_end_matches('/')
    )
    .to_lowercase()
}

/// Resolves an absolute SharePoint file URL to a Graph drive item
pub async fn resolve_file_url(ctx: &CommandContext, file_url: &str) -> Result<DriveItem> {
    let url = Url::parse(file_url).with_context(|| format!("Invalid file URL: {}", file_url))?;
    let host = url
        .host_str()
        .ok_or_else(|| CommandError::Usage(format!("Invalid file URL: {}", file_url)))?;

    let site_path = site_path(url.path());
    let site_lookup = if site_path.is_empty() {
        ctx.config.graph(&format!("/sites/{}?$select=id", host))
    } else {
        ctx.config.graph(&format!("/sites/{}:{}?$select=id", host, site_path))
    };
    let site = ctx.http.get_json(RequestOptions::new(site_lookup)).await?;
    let site_id = site
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::NotFound(format!("Site for '{}' not found", file_url)))?;
    debug!("Resolved site {} for {}", site_id, file_url);

    let drives = get_all_items(
        &ctx.http,
        RequestOptions::new(ctx.config.graph(&format!("/sites/{}/drives?$select=webUrl,id", site_id))),
    )
    .await?;

    let file = normalized(&url);
    let (drive_id, drive_path) = drives
        .iter()
        .filter_map(|drive| {
            let id = drive.get("id")?.as_str()?;
            let web_url = Url::parse(drive.get("webUrl")?.as_str()?).ok()?;
            let prefix = normalized(&web_url);
            let matches = file == prefix || file.starts_with(&format!("{}/", prefix));
            matches.then(|| (id.to_string(), web_url.path().trim_end_matches('/').len()))
        })
        .max_by_key(|(_, len)| *len)
        .ok_or_else(|| CommandError::NotFound(format!("Drive '{}' not found", file_url)))?;

    let path = url.path().get(drive_path..).unwrap_or_default().to_string();
    debug!("Resolved drive {} path {} for {}", drive_id, path, file_url);

    Ok(DriveItem::Path {
        drive_url: ctx.config.graph(&format!("/drives/{}", drive_id)),
        path,
    })
}
