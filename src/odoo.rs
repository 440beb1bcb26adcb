//! The Odoo external API client.
//!
//! Every authenticated operation goes through `execute_kw` on the `object` endpoint
//! with the argument layout
//! `(database, uid, password, model, method, positional args, keyword args)`.
//! Nothing is cached and each call is exactly one request.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::api::{self, AccessMode, FieldValues, RecordIds};
use crate::config::OdooConfig;
use crate::error::{Error, Result};
use crate::transport::{common_url, object_url, HttpTransport, ServerProxy, Transport};

/// An authenticated session. The only way to get one is [`Odoo::login`] (or one of
/// its wrappers), so a value of this type always carries a valid `uid`.
#[derive(Clone)]
pub struct Odoo {
    database: String,
    user: String,
    password: String,
    uid: i64,
    common: ServerProxy,
    object: ServerProxy,
}

#[derive(Deserialize)]
struct DemoCredentials {
    host: String,
    database: String,
    user: String,
    password: String,
}

impl Odoo {
    pub async fn login(config: &OdooConfig) -> Result<Odoo> {
        Self::login_with_transport(config, Arc::new(HttpTransport::new())).await
    }

    pub async fn login_with_transport(
        config: &OdooConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Odoo> {
        let common = ServerProxy::new(common_url(&config.url), Arc::clone(&transport));
        let object = ServerProxy::new(object_url(&config.url), transport);

        let response = common
            .call(
                "authenticate",
                &[
                    json!(config.database),
                    json!(config.username),
                    json!(config.password),
                    json!({}),
                ],
            )
            .await?;

        // a rejected login is answered with `false`, not with a fault
        let uid = match response {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| Error::UnexpectedResponse(format!("uid {n}")))?,
            Value::Bool(false) => {
                return Err(Error::AuthenticationFailed {
                    user: config.username.clone(),
                    database: config.database.clone(),
                })
            }
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "authenticate returned {other}"
                )))
            }
        };

        info!(uid, user = %config.username, database = %config.database, "login successful");

        Ok(Odoo {
            database: config.database.clone(),
            user: config.username.clone(),
            password: config.password.clone(),
            uid,
            common,
            object,
        })
    }

    pub async fn new_and_login(host: &str, database: &str, user: &str, password: &str) -> Result<Odoo> {
        Self::login(&OdooConfig::new(host, database, user, password)).await
    }

    /// Asks a demo server (such as `https://demo.odoo.com`) for a throwaway database.
    pub async fn start(host: &str) -> Result<OdooConfig> {
        Self::start_with_transport(host, Arc::new(HttpTransport::new())).await
    }

    pub async fn start_with_transport(host: &str, transport: Arc<dyn Transport>) -> Result<OdooConfig> {
        let common = ServerProxy::new(common_url(host), transport);
        let response = common.call("start", &[]).await?;
        let demo: DemoCredentials = api::from_value(response)?;

        Ok(OdooConfig::new(demo.host, demo.database, demo.user, demo.password))
    }

    /// `version` meta-call; needs no login.
    pub async fn server_version(host: &str) -> Result<Value> {
        Self::server_version_with_transport(host, Arc::new(HttpTransport::new())).await
    }

    pub async fn server_version_with_transport(
        host: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Value> {
        let common = ServerProxy::new(common_url(host), transport);
        common.call("version", &[]).await
    }

    pub async fn version(&self) -> Result<Value> {
        self.common.call("version", &[]).await
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Calls `method` on `model` and decodes the answer into `T`.
    pub async fn execute_kw<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<T> {
        debug!(model, method, "execute_kw");
        let response = self
            .object
            .call(
                "execute_kw",
                &[
                    json!(self.database),
                    json!(self.uid),
                    json!(self.password),
                    json!(model),
                    json!(method),
                    Value::Array(args),
                    Value::Object(kwargs),
                ],
            )
            .await?;

        Ok(api::from_value(response)?)
    }

    /// Any model method, arguments passed through as given.
    ///
    /// Methods acting on records expect the ids as the first positional argument:
    /// `run_method("res.partner", "action_archive", vec![json!([7])], Map::new())`.
    pub async fn run_method(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        self.execute_kw(model, method, args, kwargs).await
    }

    /// With `raise_exception` the server answers a denied access with a fault
    /// instead of `false`.
    pub async fn check_access_rights(
        &self,
        model: &str,
        mode: AccessMode,
        raise_exception: bool,
    ) -> Result<bool> {
        let mut kwargs = Map::new();
        kwargs.insert("raise_exception".into(), json!(raise_exception));
        self.execute_kw(model, "check_access_rights", vec![json!(mode.as_str())], kwargs)
            .await
    }

    pub async fn search_records<D: Serialize>(
        &self,
        model: &str,
        domain: D,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<i64>> {
        let mut kwargs = Map::new();
        page(&mut kwargs, offset, limit);
        self.execute_kw(model, "search", vec![domain_value(domain)?], kwargs)
            .await
    }

    pub async fn get_all_ids(&self, model: &str) -> Result<Vec<i64>> {
        self.search_records(model, (), None, None).await
    }

    /// Counted separately from any `search_records`; concurrent writers on the
    /// server can make the two disagree.
    pub async fn count_records<D: Serialize>(&self, model: &str, domain: D) -> Result<i64> {
        self.execute_kw(model, "search_count", vec![domain_value(domain)?], Map::new())
            .await
    }

    /// Without `fields` the server returns every field the user may read.
    pub async fn read_records<T: DeserializeOwned>(
        &self,
        model: &str,
        ids: impl Into<RecordIds>,
        fields: Option<Vec<&str>>,
    ) -> Result<T> {
        let mut kwargs = Map::new();
        if let Some(fields) = fields {
            kwargs.insert("fields".into(), json!(fields));
        }
        self.execute_kw(model, "read", vec![json!(ids.into().into_vec())], kwargs)
            .await
    }

    /// Field name to metadata. `attributes` narrows the metadata, e.g.
    /// `["string", "help", "type"]`.
    pub async fn list_fields(
        &self,
        model: &str,
        attributes: Option<Vec<&str>>,
    ) -> Result<Map<String, Value>> {
        let mut kwargs = Map::new();
        if let Some(attributes) = attributes {
            kwargs.insert("attributes".into(), json!(attributes));
        }
        self.execute_kw(model, "fields_get", Vec::new(), kwargs).await
    }

    /// `search` and `read` in a single round trip.
    pub async fn search_and_read<T: DeserializeOwned, D: Serialize>(
        &self,
        model: &str,
        domain: D,
        fields: Option<Vec<&str>>,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<T> {
        let mut kwargs = Map::new();
        if let Some(fields) = fields {
            kwargs.insert("fields".into(), json!(fields));
        }
        page(&mut kwargs, offset, limit);
        self.execute_kw(model, "search_read", vec![domain_value(domain)?], kwargs)
            .await
    }

    /// Returns the id of the new record.
    pub async fn create_record(&self, model: &str, values: impl Into<FieldValues>) -> Result<i64> {
        let values = Value::Object(values.into().into_map());
        self.execute_kw(model, "create", vec![values], Map::new())
            .await
    }

    pub async fn update_record(
        &self,
        model: &str,
        ids: impl Into<RecordIds>,
        values: impl Into<FieldValues>,
    ) -> Result<bool> {
        let ids = json!(ids.into().into_vec());
        let values = Value::Object(values.into().into_map());
        self.execute_kw(model, "write", vec![ids, values], Map::new())
            .await
    }

    pub async fn delete_record(&self, model: &str, ids: impl Into<RecordIds>) -> Result<bool> {
        let ids = json!(ids.into().into_vec());
        self.execute_kw(model, "unlink", vec![ids], Map::new()).await
    }
}

impl std::fmt::Debug for Odoo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Odoo")
            .field("url", &self.object.url())
            .field("database", &self.database)
            .field("user", &self.user)
            .field("uid", &self.uid)
            .finish()
    }
}

/// `()` is accepted as the empty domain.
fn domain_value<D: Serialize>(domain: D) -> Result<Value> {
    match api::to_value(domain)? {
        Value::Null => Ok(Value::Array(Vec::new())),
        domain => Ok(domain),
    }
}

fn page(kwargs: &mut Map<String, Value>, offset: Option<u32>, limit: Option<u32>) {
    if let Some(offset) = offset {
        kwargs.insert("offset".into(), json!(offset));
    }
    if let Some(limit) = limit {
        kwargs.insert("limit".into(), json!(limit));
    }
}
