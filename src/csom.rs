//! SharePoint client-side object model (CSOM) batches
//!
//! This module provides:
//! - A builder for `ProcessQuery` request bodies, allocating the integer ids that
//!   tie actions to object paths
//! - XML serialisation of the batch with quick-xml
//! - Parsing of the positional JSON response into a header plus per-action results
//! - Detection of `ErrorInfo`, which SharePoint reports with HTTP 200
//!
//! A batch is executed atomically by the server; the first `ErrorInfo` found in the
//! response is the failure of the whole batch.

use anyhow::{anyhow, Context, Result};
use quick_xml::{events::BytesText, Writer};
use serde_json::Value;
use std::io::Cursor;
use tracing::debug;

use crate::{
    context::CommandContext,
    error::CommandError,
    http::{RequestOptions, SPO_JSON},
};

const CLIENT_QUERY_NAMESPACE: &str = "http://schemas.microsoft.com/sharepoint/clientquery/2009";
const APPLICATION_NAME: &str = "m365ctl";

/// Type id of `Microsoft.Online.SharePoint.TenantAdministration.Tenant`
pub const TENANT_TYPE_ID: &str = "{268004ae-ef6b-4e9b-8425-127220d84719}";

/// Typed method argument
#[derive(Debug, Clone, PartialEq)]
pub enum CsomParameter {
    String(String),
    Boolean(bool),
    Guid(String),
}

impl CsomParameter {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Boolean(_) => "Boolean",
            Self::Guid(_) => "Guid",
        }
    }

    fn text(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Boolean(value) => value.to_string(),
            Self::Guid(value) => format!("{{{}}}", value.trim_matches(|c| c == '{' || c == '}')),
        }
    }
}

/// Reference to an entry of the batch's object path table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectPathId(u32);

/// Id of an action; the response reports each action's result under it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionId(u32);

#[derive(Debug, Clone)]
enum ObjectPath {
    Identity {
        id: u32,
        name: String,
    },
    Constructor {
        id: u32,
        type_id: String,
    },
    Property {
        id: u32,
        parent: u32,
        name: String,
    },
    Method {
        id: u32,
        parent: u32,
        name: String,
        parameters: Vec<CsomParameter>,
    },
}

#[derive(Debug, Clone)]
enum Action {
    ObjectPath {
        id: u32,
        path: u32,
    },
    Method {
        id: u32,
        path: u32,
        name: String,
        parameters: Vec<CsomParameter>,
    },
}

/// Ordered list of CSOM actions over an object path table
///
/// # Examples
///
/// ```
/// use m365ctl::csom::{CsomParameter, CsomRequest, TENANT_TYPE_ID};
///
/// let mut request = CsomRequest::new();
/// let tenant = request.constructor(TENANT_TYPE_ID);
/// let site = request.method_path(
///     tenant,
///     "GetSiteByUrl",
///     vec![CsomParameter::String("https://contoso.sharepoint.com/sites/apps".into())],
/// );
/// request.object_path_action(site);
///
/// let xml = request.to_xml().unwrap();
/// assert!(xml.contains(r#"<Method Id="2" ParentId="1" Name="GetSiteByUrl">"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CsomRequest {
    next_id: u32,
    actions: Vec<Action>,
    object_paths: Vec<ObjectPath>,
}

impl CsomRequest {
    /// Empty batch; ids start at 1
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Object addressed by its server identity string
    pub fn identity(&mut self, name: impl Into<String>) -> ObjectPathId {
        let id = self.allocate();
        self.object_paths.push(ObjectPath::Identity {
            id,
            name: name.into(),
        });
        ObjectPathId(id)
    }

    /// Object created from a type id, e.g. [`TENANT_TYPE_ID`]
    pub fn constructor(&mut self, type_id: impl Into<String>) -> ObjectPathId {
        let id = self.allocate();
        self.object_paths.push(ObjectPath::Constructor {
            id,
            type_id: type_id.into(),
        });
        ObjectPathId(id)
    }

    /// Property of another object path
    pub fn property(&mut self, parent: ObjectPathId, name: impl Into<String>) -> ObjectPathId {
        let id = self.allocate();
        self.object_paths.push(ObjectPath::Property {
            id,
            parent: parent.0,
            name: name.into(),
        });
        ObjectPathId(id)
    }

    /// Object returned by a method of another object path
    pub fn method_path(
        &mut self,
        parent: ObjectPathId,
        name: impl Into<String>,
        parameters: Vec<CsomParameter>,
    ) -> ObjectPathId {
        let id = self.allocate();
        self.object_paths.push(ObjectPath::Method {
            id,
            parent: parent.0,
            name: name.into(),
            parameters,
        });
        ObjectPathId(id)
    }

    /// Materialises an object path on the server
    pub fn object_path_action(&mut self, path: ObjectPathId) -> ActionId {
        let id = self.allocate();
        self.actions.push(Action::ObjectPath { id, path: path.0 });
        ActionId(id)
    }

    /// Invokes a method on an object path
    pub fn method_action(
        &mut self,
        path: ObjectPathId,
        name: impl Into<String>,
        parameters: Vec<CsomParameter>,
    ) -> ActionId {
        let id = self.allocate();
        self.actions.push(Action::Method {
            id,
            path: path.0,
            name: name.into(),
            parameters,
        });
        ActionId(id)
    }

    /// Serialises the batch as a `ProcessQuery` request body
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .create_element("Request")
            .with_attribute(("AddExpandoFieldTypeSuffix", "true"))
            .with_attribute(("SchemaVersion", "15.0.0.0"))
            .with_attribute(("LibraryVersion", "16.0.0.0"))
            .with_attribute(("ApplicationName", APPLICATION_NAME))
            .with_attribute(("xmlns", CLIENT_QUERY_NAMESPACE))
            .write_inner_content(|w| {
                w.create_element("Actions").write_inner_content(|w| {
                    for action in &self.actions {
                        write_action(w, action)?;
                    }
                    Ok::<(), quick_xml::Error>(())
                })?;
                w.create_element("ObjectPaths").write_inner_content(|w| {
                    for path in &self.object_paths {
                        write_object_path(w, path)?;
                    }
                    Ok::<(), quick_xml::Error>(())
                })?;
                Ok::<(), quick_xml::Error>(())
            })
            .map_err(|e| anyhow!("Failed to serialise CSOM request: {}", e))?;

        String::from_utf8(writer.into_inner().into_inner())
            .context("CSOM request is not valid UTF-8")
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_action(w: &mut XmlWriter, action: &Action) -> quick_xml::Result<()> {
    match action {
        Action::ObjectPath { id, path } => {
            let (id, path) = (id.to_string(), path.to_string());
            w.create_element("ObjectPath")
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("ObjectPathId", path.as_str()))
                .write_empty()?;
        }
        Action::Method {
            id,
            path,
            name,
            parameters,
        } => {
            let (id, path) = (id.to_string(), path.to_string());
            let element = w
                .create_element("Method")
                .with_attribute(("Name", name.as_str()))
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("ObjectPathId", path.as_str()));
            if parameters.is_empty() {
                element.write_empty()?;
            } else {
                element.write_inner_content(|w| write_parameters(w, parameters))?;
            }
        }
    }
    Ok(())
}

fn write_object_path(w: &mut XmlWriter, path: &ObjectPath) -> quick_xml::Result<()> {
    match path {
        ObjectPath::Identity { id, name } => {
            let id = id.to_string();
            w.create_element("Identity")
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("Name", name.as_str()))
                .write_empty()?;
        }
        ObjectPath::Constructor { id, type_id } => {
            let id = id.to_string();
            w.create_element("Constructor")
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("TypeId", type_id.as_str()))
                .write_empty()?;
        }
        ObjectPath::Property { id, parent, name } => {
            let (id, parent) = (id.to_string(), parent.to_string());
            w.create_element("Property")
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("ParentId", parent.as_str()))
                .with_attribute(("Name", name.as_str()))
                .write_empty()?;
        }
        ObjectPath::Method {
            id,
            parent,
            name,
            parameters,
        } => {
            let (id, parent) = (id.to_string(), parent.to_string());
            w.create_element("Method")
                .with_attribute(("Id", id.as_str()))
                .with_attribute(("ParentId", parent.as_str()))
                .with_attribute(("Name", name.as_str()))
                .write_inner_content(|w| write_parameters(w, parameters))?;
        }
    }
    Ok(())
}

fn write_parameters(w: &mut XmlWriter, parameters: &[CsomParameter]) -> quick_xml::Result<()> {
    w.create_element("Parameters").write_inner_content(|w| {
        for parameter in parameters {
            let text = parameter.text();
            w.create_element("Parameter")
                .with_attribute(("Type", parameter.type_name()))
                .write_text_content(BytesText::new(&text))?;
        }
        Ok::<(), quick_xml::Error>(())
    })?;
    Ok(())
}

/// Parsed `ProcessQuery` response
///
/// The wire format is a flat JSON array: a header object followed by
/// `action id, result` pairs in action order.
#[derive(Debug, Clone, Default)]
pub struct CsomResponse {
    pub header: Value,
    pub results: Vec<(u32, Value)>,
}

impl CsomResponse {
    /// Parses the response of `ProcessQuery`
    ///
    /// # Arguments
    /// * `text` - Response body, a JSON array
    ///
    /// # Returns
    /// * `Result<Self>` - Header and results; fails when the body is not a non-empty array
    pub fn parse(text: &str) -> Result<Self> {
        let items: Vec<Value> =
            serde_json::from_str(text).context("Failed to parse CSOM response")?;
        let mut items = items.into_iter();
        let header = items
            .next()
            .ok_or_else(|| anyhow!("Empty CSOM response"))?;

        let mut results = Vec::new();
        while let Some(item) = items.next() {
            let Some(id) = item.as_u64().and_then(|id| u32::try_from(id).ok()) else {
                debug!("Skipping unexpected CSOM response entry: {}", item);
                continue;
            };
            results.push((id, items.next().unwrap_or(Value::Null)));
        }

        Ok(Self { header, results })
    }

    /// First `ErrorInfo.ErrorMessage`, looking at the header and then at each result
    pub fn error(&self) -> Option<String> {
        std::iter::once(&self.header)
            .chain(self.results.iter().map(|(_, result)| result))
            .filter_map(|entry| entry.get("ErrorInfo"))
            .find(|info| !info.is_null())
            .map(|info| {
                info.get("ErrorMessage")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown CSOM error")
                    .to_string()
            })
    }

    /// Fails with the batch error, if any
    pub fn into_result(self) -> Result<Self> {
        match self.error() {
            Some(message) => Err(CommandError::Csom(message).into()),
            None => Ok(self),
        }
    }
}

/// Form digest required by SharePoint for POST requests
pub async fn request_digest(ctx: &CommandContext, web_url: &str) -> Result<String> {
    let response = ctx
        .http
        .post_json(
            RequestOptions::new(format!("{}/_api/contextinfo", web_url.trim_end_matches('/')))
                .header("Accept", SPO_JSON),
        )
        .await?;

    response
        .get("FormDigestValue")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Response from contextinfo did not contain a form digest"))
}

/// Posts the batch to `<web_url>/_vti_bin/client.svc/ProcessQuery`
pub async fn execute(
    ctx: &CommandContext,
    web_url: &str,
    request: &CsomRequest,
) -> Result<CsomResponse> {
    let web_url = web_url.trim_end_matches('/');
    let digest = request_digest(ctx, web_url).await?;
    let body = request.to_xml()?;
    debug!("CSOM request: {}", body);

    let text = ctx
        .http
        .post_text(
            RequestOptions::new(format!("{}/_vti_bin/client.svc/ProcessQuery", web_url))
                .header("X-RequestDigest", digest)
                .text(body, "text/xml"),
        )
        .await?;

    CsomResponse::parse(&text)?.into_result()
}
