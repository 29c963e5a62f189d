//! Following OData continuation links
//!
//! Graph returns `@odata.nextLink`, SharePoint nometadata JSON returns
//! `odata.nextLink`. Either is requested verbatim until a page comes back without
//! one. Pages are fetched one after another because each cursor comes from the
//! previous response.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::http::{HttpClient, RequestOptions};

const NEXT_LINK_FIELDS: [&str; 2] = ["@odata.nextLink", "odata.nextLink"];

/// Continuation link of a page, if any
pub fn next_link(page: &Value) -> Option<String> {
    NEXT_LINK_FIELDS
        .iter()
        .find_map(|field| page.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Fetches every page starting at `options.url` and concatenates their `value` arrays.
///
/// The headers of `options` are sent with every page request.
pub async fn get_all_items(http: &HttpClient, options: RequestOptions) -> Result<Vec<Value>> {
    let headers = options.headers.clone();
    let mut items = Vec::new();
    let mut next = Some(options.url);
    let mut pages = 0;

    while let Some(url) = next.take() {
        let page = http
            .get_json(RequestOptions {
                url,
                headers: headers.clone(),
                ..RequestOptions::default()
            })
            .await?;
        pages += 1;

        if let Some(values) = page.get("value").and_then(Value::as_array) {
            items.extend(values.iter().cloned());
        }
        next = next_link(&page);
    }

    debug!("Collected {} items from {} page(s)", items.len(), pages);
    Ok(items)
}
