//! HTTP plumbing for the two Odoo XML-RPC endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::xmlrpc;

/// Posts an XML-RPC document and hands back the raw response body.
///
/// [`HttpTransport`] is the real implementation; tests plug in an in-process server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_xml(&self, url: &str, body: String) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_xml(&self, url: &str, body: String) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// One XML-RPC endpoint, e.g. `https://host/xmlrpc/2/object`.
#[derive(Clone)]
pub struct ServerProxy {
    url: String,
    transport: Arc<dyn Transport>,
}

impl ServerProxy {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        ServerProxy {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        debug!(url = %self.url, method, "xml-rpc call");
        let body = xmlrpc::encode_call(method, params)?;
        let response = self.transport.post_xml(&self.url, body).await?;
        xmlrpc::decode_response(&response)
    }
}

impl std::fmt::Debug for ServerProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerProxy").field("url", &self.url).finish()
    }
}

/// Endpoint URLs derived from a server base address.
pub fn common_url(base: &str) -> String {
    format!("{}/xmlrpc/2/common", base.trim_end_matches('/'))
}

pub fn object_url(base: &str) -> String {
    format!("{}/xmlrpc/2/object", base.trim_end_matches('/'))
}
