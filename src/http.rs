//! HTTP client for Microsoft Graph, SharePoint and Azure management endpoints
//!
//! This module wraps a single pooled reqwest client with:
//! - Bearer authentication from the configured access token
//! - Per-request headers and bodies described by [`RequestOptions`]
//! - Unwrapping of provider error envelopes into [`CommandError::Remote`]
//!
//! Requests are never retried: a failed call fails the command.

use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Method, Response};
use serde_json::Value;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{remote_error_message, CommandError};

/// Accept header SharePoint REST calls use to get plain JSON.
pub const SPO_JSON: &str = "application/json;odata=nometadata";

/// Body of an outgoing request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Text { content: String, content_type: String },
    Bytes(Vec<u8>),
}

/// Everything a single call needs: target url, extra headers and optional body
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Send without the bearer token, e.g. for pre-signed download links
    pub anonymous: bool,
}

impl RequestOptions {
    /// Options for `url` with no headers and no body
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Adds a request header; repeated names are all sent
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Sets a text body with an explicit content type
    ///
    /// # Examples
    ///
    /// ```
    /// use m365ctl::http::RequestOptions;
    ///
    /// let options = RequestOptions::new("https://contoso.sharepoint.com/_vti_bin/client.svc/ProcessQuery")
    ///     .text("<Request />", "text/xml");
    /// assert!(options.body.is_some());
    /// ```
    pub fn text(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text {
            content: content.into(),
            content_type: content_type.into(),
        });
        self
    }

    /// Sets a binary body
    pub fn bytes(mut self, content: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Bytes(content));
        self
    }

    /// Skips the `Authorization` header
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// Pooled HTTP client shared by every request of one invocation
///
/// # Examples
///
/// ```no_run
/// use m365ctl::http::{HttpClient, RequestOptions};
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = HttpClient::new(Duration::from_secs(30), Some("eyJ0eXAi...".to_string()))?;
/// let me = client
///     .get_json(RequestOptions::new("https://graph.microsoft.com/v1.0/me"))
///     .await?;
/// println!("{}", me["displayName"]);
/// # Ok(())
/// # }
/// ```
pub struct HttpClient {
    client: Client,
    access_token: Option<String>,
}

impl HttpClient {
    /// Creates a client with the given request timeout and optional bearer token
    pub fn new(timeout: Duration, access_token: Option<String>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("m365ctl/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            access_token,
        })
    }

    /// GET returning parsed JSON (`Value::Null` for an empty body)
    pub async fn get_json(&self, options: RequestOptions) -> Result<Value> {
        let response = self.execute(Method::GET, options).await?;
        read_json(response).await
    }

    /// GET returning the raw body, used for file downloads
    pub async fn get_bytes(&self, options: RequestOptions) -> Result<Vec<u8>> {
        let response = self.execute(Method::GET, options).await?;
        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        Ok(bytes.to_vec())
    }

    /// POST returning parsed JSON
    ///
    /// # Arguments
    /// * `options` - Target url, headers and body
    ///
    /// # Returns
    /// * `Result<Value>` - The parsed body, `Value::Null` when the server sent none
    ///
    /// # Errors
    /// Non-2xx responses fail with [`CommandError::Remote`](crate::error::CommandError::Remote)
    /// carrying the provider's message.
    pub async fn post_json(&self, options: RequestOptions) -> Result<Value> {
        let response = self.execute(Method::POST, options).await?;
        read_json(response).await
    }

    /// POST returning the body as text, used for CSOM batches
    pub async fn post_text(&self, options: RequestOptions) -> Result<String> {
        let response = self.execute(Method::POST, options).await?;
        response
            .text()
            .await
            .context("Failed to read response body")
    }

    /// PUT returning parsed JSON, used for drive uploads
    pub async fn put_json(&self, options: RequestOptions) -> Result<Value> {
        let response = self.execute(Method::PUT, options).await?;
        read_json(response).await
    }

    /// DELETE, discarding the response body
    ///
    /// # Arguments
    /// * `options` - Url of the resource to delete
    ///
    /// # Returns
    /// * `Result<()>` - Ok once the server accepted the delete
    pub async fn delete(&self, options: RequestOptions) -> Result<()> {
        self.execute(Method::DELETE, options).await?;
        Ok(())
    }

    async fn execute(&self, method: Method, options: RequestOptions) -> Result<Response> {
        debug!("{} {}", method, options.url);

        let mut request = self.client.request(method.clone(), &options.url);
        if let Some(token) = self.access_token.as_ref().filter(|_| !options.anonymous) {
            request = request.bearer_auth(token);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match options.body {
            Some(RequestBody::Json(body)) => request.json(&body),
            Some(RequestBody::Text {
                content,
                content_type,
            }) => request.header("Content-Type", content_type).body(content),
            Some(RequestBody::Bytes(content)) => request.body(content),
            None => request,
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, options.url))?;

        let status = response.status();
        if status.is_success() {
            debug!("{} {} -> {}", method, options.url, status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("{} {} failed with status {}", method, options.url, status);
        Err(CommandError::Remote(remote_error_message(status.as_u16(), &body)).into())
    }
}

async fn read_json(response: Response) -> Result<Value> {
    let text = response
        .text()
        .await
        .context("Failed to read response body")?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).context("Failed to parse JSON response")
}
