//! The slice of the OpenAPI document model that the safety rules look at.
//!
//! A [`Document`] keeps the raw tree around for bracket-path addressing, next to a typed view
//! that is built once, up front. Anything that does not fit the typed view is an input error.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use schemars::schema::Schema as RawSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operations::OperationKey;
use crate::path::{self, KeyPath};
use crate::schema::Schema;
use crate::Error;

/// The only media type whose schema is compared.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// HTTP methods that may key an operation inside a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Every recognized method.
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
    ];

    /// The key used for this method inside a path item.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Head => "head",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Connect => "connect",
            Method::Options => "options",
            Method::Trace => "trace",
            Method::Patch => "patch",
        }
    }

    /// Look up a method by its path item key. Keys are matched exactly, so `GET` is not a method.
    pub fn from_key(key: &str) -> Option<Method> {
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default, deserialize_with = "openapi_schema")]
    pub schema: Option<RawSchema>,
}

impl Parameter {
    /// The parameter schema. A parameter without one accepts anything.
    pub fn schema(&self) -> Schema {
        self.schema.as_ref().map(Schema::from).unwrap_or_default()
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default, deserialize_with = "openapi_schema")]
    pub schema: Option<RawSchema>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

impl Response {
    /// The JSON body schema, or an empty object titled after the description.
    pub fn schema(&self) -> Schema {
        json_schema(&self.content, &self.description)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    /// The JSON body schema, or an empty object titled after the description.
    pub fn schema(&self) -> Schema {
        json_schema(&self.content, &self.description)
    }
}

fn json_schema(content: &IndexMap<String, MediaType>, description: &Option<String>) -> Schema {
    content
        .get(JSON_MEDIA_TYPE)
        .and_then(|media| media.schema.as_ref())
        .map(Schema::from)
        .unwrap_or_else(|| Schema::degenerate(description.clone()))
}

/// Read a schema written in the OpenAPI 3.0 dialect into the JSON Schema AST.
fn openapi_schema<'de, D>(deserializer: D) -> Result<Option<RawSchema>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(mut value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    normalize_exclusive_bounds(&mut value);
    RawSchema::deserialize(value).map(Some).map_err(de::Error::custom)
}

/// OpenAPI 3.0 marks `minimum`/`maximum` exclusive with a boolean flag, JSON Schema puts the
/// bound itself in `exclusiveMinimum`/`exclusiveMaximum`.
fn normalize_exclusive_bounds(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let flags = [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")];
            for (flag, bound) in flags {
                let Some(exclusive) = map.get(flag).and_then(Value::as_bool) else {
                    continue;
                };
                map.remove(flag);
                if exclusive {
                    if let Some(limit) = map.remove(bound) {
                        map.insert(flag.to_owned(), limit);
                    }
                }
            }
            map.values_mut().for_each(normalize_exclusive_bounds);
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_exclusive_bounds),
        _ => (),
    }
}

/// One HTTP method handler under one path template.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    #[serde(default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, rename = "x-internal")]
    pub internal: bool,
}

impl Operation {
    /// Every security scheme named by any of the alternative requirements.
    pub fn security_schemes(&self) -> BTreeSet<&str> {
        self.security
            .iter()
            .flat_map(|requirement| requirement.keys())
            .map(String::as_str)
            .collect()
    }

    /// The request body schema. An operation without a body gets an empty object.
    pub fn request_body_schema(&self) -> Schema {
        self.request_body
            .as_ref()
            .map(RequestBody::schema)
            .unwrap_or_else(|| Schema::degenerate(None))
    }
}

/// The operations of one path template. Keys that are not methods are dropped.
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    #[allow(missing_docs)]
    pub operations: IndexMap<Method, Operation>,
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut operations = IndexMap::new();
        for (key, value) in entries {
            if let Some(method) = Method::from_key(&key) {
                let operation = Operation::deserialize(value).map_err(de::Error::custom)?;
                operations.insert(method, operation);
            }
        }
        Ok(PathItem { operations })
    }
}

/// A parsed API contract document.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Value,
    version: String,
    paths: IndexMap<String, PathItem>,
}

impl Document {
    /// Build the typed view of `raw`.
    ///
    /// Fails if `info.version` is missing or if any operation does not have the expected shape.
    pub fn from_value(raw: Value) -> Result<Self, Error> {
        let version_path: KeyPath = ["info", "version"].into_iter().collect();
        let version = path::get(&raw, &version_path)
            .and_then(Value::as_str)
            .ok_or(Error::MissingVersion)?
            .to_owned();

        let mut paths = IndexMap::new();
        if let Some(Value::Object(entries)) = raw.get("paths") {
            // `x-` extensions may sit next to the path templates
            for (template, item) in entries.iter().filter(|(k, _)| k.starts_with('/')) {
                paths.insert(template.clone(), PathItem::deserialize(item)?);
            }
        }

        Ok(Document {
            raw,
            version,
            paths,
        })
    }

    /// `info.version`
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Path templates in document order.
    pub fn paths(&self) -> &IndexMap<String, PathItem> {
        &self.paths
    }

    /// Look up one operation.
    pub fn operation(&self, key: &OperationKey) -> Option<&Operation> {
        self.paths.get(&key.path)?.operations.get(&key.method)
    }

    /// Read a raw value by bracket path.
    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        path::get(&self.raw, path)
    }
}
