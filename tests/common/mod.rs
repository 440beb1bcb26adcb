//! In-process stand-in for an Odoo server. It speaks XML-RPC through the crate's own
//! codec and keeps records in memory, enough to exercise every client operation.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use odoors_xmlrpc::transport::Transport;
use odoors_xmlrpc::xmlrpc::{self, MethodCall};
use odoors_xmlrpc::{Odoo, OdooConfig, Result};

pub const URL: &str = "http://odoo.test";
pub const DATABASE: &str = "test";
pub const ADMIN_UID: i64 = 2;
pub const DEMO_UID: i64 = 6;

struct User {
    login: &'static str,
    password: &'static str,
    uid: i64,
    read_only: bool,
}

const USERS: &[User] = &[
    User {
        login: "admin",
        password: "admin",
        uid: ADMIN_UID,
        read_only: false,
    },
    User {
        login: "demo",
        password: "demo",
        uid: DEMO_UID,
        read_only: true,
    },
];

/// What the fake answers to one call: a value or a fault `(code, message)`.
type Reply = std::result::Result<Value, (i64, String)>;

#[derive(Default)]
struct State {
    models: HashMap<String, BTreeMap<i64, Map<String, Value>>>,
    next_id: i64,
    calls: Vec<(String, MethodCall)>,
}

#[derive(Default)]
pub struct FakeOdoo {
    state: Mutex<State>,
}

impl FakeOdoo {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeOdoo::default())
    }

    /// Inserts a record and returns its id.
    pub fn seed(&self, model: &str, values: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        let values = values.as_object().cloned().unwrap_or_default();
        state.insert(model, values)
    }

    pub fn calls(&self) -> Vec<(String, MethodCall)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Positional args of the last `execute_kw`.
    pub fn last_args(&self) -> Value {
        let state = self.state.lock().unwrap();
        let (_, call) = state.calls.last().expect("no call recorded");
        call.params[5].clone()
    }

    pub fn last_kwargs(&self) -> Value {
        let state = self.state.lock().unwrap();
        let (_, call) = state.calls.last().expect("no call recorded");
        call.params[6].clone()
    }

    fn handle(&self, url: &str, call: MethodCall) -> Reply {
        let mut state = self.state.lock().unwrap();
        state.calls.push((url.to_owned(), call.clone()));

        if url.ends_with("/xmlrpc/2/common") {
            common(&call)
        } else if url.ends_with("/xmlrpc/2/object") && call.method == "execute_kw" {
            state.execute_kw(&call.params)
        } else {
            Err((1, format!("method {:?} is not supported", call.method)))
        }
    }
}

#[async_trait]
impl Transport for FakeOdoo {
    async fn post_xml(&self, url: &str, body: String) -> Result<String> {
        let call = xmlrpc::decode_call(&body)?;
        match self.handle(url, call) {
            Ok(value) => xmlrpc::encode_response(&value),
            Err((code, message)) => Ok(xmlrpc::encode_fault(code, &message)),
        }
    }
}

pub async fn login(server: &Arc<FakeOdoo>, user: &str, password: &str) -> Result<Odoo> {
    let config = OdooConfig::new(URL, DATABASE, user, password);
    Odoo::login_with_transport(&config, server.clone()).await
}

pub async fn admin(server: &Arc<FakeOdoo>) -> Odoo {
    login(server, "admin", "admin").await.expect("admin login")
}

fn common(call: &MethodCall) -> Reply {
    match call.method.as_str() {
        "authenticate" => {
            let (db, login, password) = (
                call.params[0].as_str(),
                call.params[1].as_str(),
                call.params[2].as_str(),
            );
            let uid = USERS
                .iter()
                .find(|u| db == Some(DATABASE) && login == Some(u.login) && password == Some(u.password))
                .map(|u| json!(u.uid))
                .unwrap_or(json!(false));
            Ok(uid)
        }
        "start" => Ok(json!({
            "host": URL,
            "database": DATABASE,
            "user": "demo",
            "password": "demo",
        })),
        "version" => Ok(json!({
            "server_version": "17.0",
            "server_serie": "17.0",
            "protocol_version": 1,
        })),
        other => Err((1, format!("common has no method {other}"))),
    }
}

fn satisfies(record: &Map<String, Value>, domain: &Value) -> bool {
    let empty = Vec::new();
    let unset = Value::Bool(false);
    domain.as_array().unwrap_or(&empty).iter().all(|term| {
        let field = term[0].as_str().unwrap_or_default();
        let value = record.get(field).unwrap_or(&unset);
        match term[1].as_str().unwrap_or_default() {
            "=" => value == &term[2],
            "!=" => value != &term[2],
            "in" => term[2].as_array().is_some_and(|items| items.contains(value)),
            "ilike" => match (value.as_str(), term[2].as_str()) {
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            _ => false,
        }
    })
}

fn project(record: &Map<String, Value>, fields: Option<&Value>) -> Value {
    match fields.and_then(Value::as_array) {
        Some(fields) => {
            let mut out = Map::new();
            out.insert("id".into(), record["id"].clone());
            for field in fields.iter().filter_map(Value::as_str) {
                out.insert(
                    field.to_owned(),
                    record.get(field).cloned().unwrap_or(Value::Bool(false)),
                );
            }
            Value::Object(out)
        }
        None => Value::Object(record.clone()),
    }
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

impl State {
    fn insert(&mut self, model: &str, mut values: Map<String, Value>) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        values.insert("id".into(), json!(id));
        self.models.entry(model.to_owned()).or_default().insert(id, values);
        id
    }

    fn search(&self, model: &str, domain: &Value, kwargs: &Value) -> Vec<i64> {
        let offset = kwargs.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = kwargs.get("limit").and_then(Value::as_u64).unwrap_or(0) as usize;
        let found = self
            .models
            .get(model)
            .into_iter()
            .flat_map(|records| records.iter())
            .filter(|(_, record)| satisfies(record, domain))
            .map(|(id, _)| *id)
            .skip(offset);
        if limit == 0 {
            found.collect()
        } else {
            found.take(limit).collect()
        }
    }

    fn execute_kw(&mut self, params: &[Value]) -> Reply {
        let uid = params[1].as_i64();
        let user = USERS
            .iter()
            .find(|u| Some(u.uid) == uid && params[2].as_str() == Some(u.password))
            .filter(|_| params[0].as_str() == Some(DATABASE))
            .ok_or((3, "Access Denied".to_owned()))?;

        let model = params[3].as_str().unwrap_or_default().to_owned();
        let method = params[4].as_str().unwrap_or_default();
        let args = params[5].as_array().cloned().unwrap_or_default();
        let kwargs = params.get(6).cloned().unwrap_or(json!({}));
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);

        match method {
            "check_access_rights" => {
                let allowed = !user.read_only || arg(0) == json!("read");
                if !allowed && kwargs["raise_exception"] == json!(true) {
                    return Err((4, format!("You are not allowed to modify '{model}'")));
                }
                Ok(json!(allowed))
            }
            "search" => Ok(json!(self.search(&model, &arg(0), &kwargs))),
            "search_count" => Ok(json!(self.search(&model, &arg(0), &json!({})).len())),
            "read" => {
                let records = self.models.get(&model);
                let found: Vec<Value> = ids(&arg(0))
                    .into_iter()
                    .filter_map(|id| records.and_then(|r| r.get(&id)))
                    .map(|record| project(record, kwargs.get("fields")))
                    .collect();
                Ok(Value::Array(found))
            }
            "search_read" => {
                let records = self.models.get(&model);
                let found: Vec<Value> = self
                    .search(&model, &arg(0), &kwargs)
                    .into_iter()
                    .filter_map(|id| records.and_then(|r| r.get(&id)))
                    .map(|record| project(record, kwargs.get("fields")))
                    .collect();
                Ok(Value::Array(found))
            }
            "fields_get" => {
                let mut fields = Map::new();
                for name in ["id", "name", "street"] {
                    let mut meta = Map::new();
                    meta.insert("string".into(), json!(name.to_uppercase()));
                    meta.insert("type".into(), json!(if name == "id" { "integer" } else { "char" }));
                    meta.insert("help".into(), json!(false));
                    if let Some(wanted) = kwargs.get("attributes").and_then(Value::as_array) {
                        meta.retain(|key, _| wanted.contains(&json!(key)));
                    }
                    fields.insert(name.into(), Value::Object(meta));
                }
                Ok(Value::Object(fields))
            }
            "create" | "write" | "unlink" if user.read_only => {
                Err((4, format!("You are not allowed to modify '{model}'")))
            }
            "create" => {
                let values = arg(0)
                    .as_object()
                    .cloned()
                    .ok_or((2, "create expects a mapping".to_owned()))?;
                Ok(json!(self.insert(&model, values)))
            }
            "write" => {
                let values = arg(1)
                    .as_object()
                    .cloned()
                    .ok_or((2, "write expects a mapping".to_owned()))?;
                let records = self.models.entry(model).or_default();
                for id in ids(&arg(0)) {
                    let record = records
                        .get_mut(&id)
                        .ok_or((2, format!("Record {id} does not exist")))?;
                    record.extend(values.clone());
                }
                Ok(json!(true))
            }
            "unlink" => {
                let records = self.models.entry(model).or_default();
                for id in ids(&arg(0)) {
                    records.remove(&id);
                }
                Ok(json!(true))
            }
            // echoes trailing positional args, then keyword values
            "test_external_method" => {
                let mut echoed: Vec<Value> = args.iter().skip(1).cloned().collect();
                if let Some(kwargs) = kwargs.as_object() {
                    echoed.extend(kwargs.values().cloned());
                }
                Ok(Value::Array(echoed))
            }
            other => Err((
                1,
                format!("'{model}' object has no attribute '{other}'"),
            )),
        }
    }
}
