//! Blueprint documents and the site/resource records they produce.
//!
//! These payloads are shared between handlers and `OpenAPI` generation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub site_id: i64,
    pub org_id: String,
    pub nice_id: String,
    pub name: Option<String>,
}

impl Site {
    /// Human-readable label used in error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.nice_id)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteResource {
    pub site_resource_id: i64,
    pub org_id: String,
    pub site_id: i64,
    pub nice_id: String,
    pub name: String,
    pub proxy_port: Option<u16>,
    pub destination_ip: String,
    pub destination_port: u16,
    pub protocol: Protocol,
}

/// Column values written by both insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResourceValues {
    pub name: String,
    pub site_id: i64,
    pub proxy_port: Option<u16>,
    pub destination_ip: String,
    pub destination_port: u16,
    pub protocol: Protocol,
}

/// One `client-resources` entry of a blueprint.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct ClientResourceSpec {
    pub name: Option<String>,
    /// Nice id of the target site; falls back to the `siteId` query parameter.
    pub site: Option<String>,
    pub proxy_port: Option<u16>,
    pub hostname: String,
    pub internal_port: u16,
    pub protocol: Protocol,
}

/// Entries keep the order they have in the document; ids are assigned in that order.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct BlueprintConfig {
    #[serde(rename = "client-resources", default)]
    pub client_resources: IndexMap<String, ClientResourceSpec>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ClientResourceResult {
    pub resource: SiteResource,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    pub nice_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ApplyBlueprintQuery {
    /// Default site for entries that do not name one.
    pub site_id: Option<i64>,
}
