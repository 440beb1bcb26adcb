//! Request and response shapes shared by the [`Odoo`](crate::odoo::Odoo) client.

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use serde_with::DeserializeAs;

/// Record ids sent to `read`, `write` and `unlink`: one id or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIds {
    One(i64),
    Many(Vec<i64>),
}

impl RecordIds {
    /// A single id becomes a one-element list; a list is passed through untouched.
    pub fn into_vec(self) -> Vec<i64> {
        match self {
            RecordIds::One(id) => vec![id],
            RecordIds::Many(ids) => ids,
        }
    }
}

impl From<i64> for RecordIds {
    fn from(id: i64) -> Self {
        RecordIds::One(id)
    }
}

impl From<Vec<i64>> for RecordIds {
    fn from(ids: Vec<i64>) -> Self {
        RecordIds::Many(ids)
    }
}

impl From<&[i64]> for RecordIds {
    fn from(ids: &[i64]) -> Self {
        RecordIds::Many(ids.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for RecordIds {
    fn from(ids: [i64; N]) -> Self {
        RecordIds::Many(ids.to_vec())
    }
}

/// Values for `create` and `write`: a lone field/value pair or a full mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Field(String, Value),
    Map(Map<String, Value>),
}

impl FieldValues {
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldValues::Field(name.into(), value.into())
    }

    pub fn into_map(self) -> Map<String, Value> {
        match self {
            FieldValues::Field(name, value) => {
                let mut map = Map::new();
                map.insert(name, value);
                map
            }
            FieldValues::Map(map) => map,
        }
    }
}

impl From<Map<String, Value>> for FieldValues {
    fn from(map: Map<String, Value>) -> Self {
        FieldValues::Map(map)
    }
}

impl<V: Into<Value>> From<(&str, V)> for FieldValues {
    fn from((name, value): (&str, V)) -> Self {
        FieldValues::field(name, value)
    }
}

/// One `(field, operator, value)` domain term. Serialized as a three element list,
/// which is what the server expects; operators are passed through uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.field, &self.operator, &self.value).serialize(serializer)
    }
}

/// Argument of `check_access_rights`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
    Create,
    Unlink,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::Create => "create",
            AccessMode::Unlink => "unlink",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relational field value, sent by the server as `[id, display_name]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Many2one(pub i64, pub String);

impl Many2one {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> &str {
        &self.1
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Nullable<T> {
    Value(T),
    Placeholder(bool),
}

/// Odoo answers `false` for unset fields of any type. Maps that placeholder to `None`.
pub fn deserialize_odoo_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Nullable::<T>::deserialize(deserializer)? {
        Nullable::Value(value) => Ok(Some(value)),
        Nullable::Placeholder(false) => Ok(None),
        Nullable::Placeholder(true) => Err(de::Error::custom("expected a value or `false`")),
    }
}

/// `serde_with` adaptor around [`deserialize_odoo_nullable`], for use inside
/// containers: `#[serde_as(as = "Vec<OdooNullable>")]`.
pub struct OdooNullable;

impl<'de, T: Deserialize<'de>> DeserializeAs<'de, Option<T>> for OdooNullable {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<Option<T>, D::Error> {
        deserialize_odoo_nullable(deserializer)
    }
}

/// Serializes anything into the dynamic value the codec understands.
pub(crate) fn to_value<T: Serialize>(value: T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}

/// Decodes a dynamic response into the caller's type.
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}
