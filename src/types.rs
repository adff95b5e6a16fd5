use std::fmt;
use std::path::PathBuf;

use schemars::schema::InstanceType;
use serde::Serialize;
use thiserror::Error;

use crate::openapi::ParameterLocation;

/// A single unsafe change found by a rule, going from the old document to the new one.
///
/// Renders as `<METHOD> <path> (<location>): <message>.`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// The operation the change belongs to, e.g. `GET /pet/{id}`.
    pub operation: String,
    /// Where inside the operation the change was found. `None` for route-level changes.
    pub location: Option<Location>,
    /// Data specific to the kind of change.
    pub change: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({}): {}.", self.operation, location, self.change),
            None => write!(f, "{}: {}.", self.operation, self.change),
        }
    }
}

/// The part of an operation a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Location {
    /// A response, by status code.
    Status(String),
    /// The request body.
    RequestBody,
    /// A parameter of the given location.
    Parameter(ParameterLocation),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Status(code) => f.write_str(code),
            Location::RequestBody => f.write_str("Request Body"),
            Location::Parameter(location) => write!(f, "parameter::{location}"),
        }
    }
}

/// The kind of unsafe change + data relevant to the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// Security schemes are now demanded that were not before.
    SecurityAdd {
        /// The names of the added schemes.
        schemes: Vec<String>,
    },
    /// Properties have disappeared from an object.
    PropertyRemove {
        /// The names of the removed properties.
        removed: Vec<String>,
        /// Structural path of the object, e.g. `root.owner`.
        path: String,
    },
    /// The whole operation has disappeared.
    RouteRemove,
    /// The operation is now `deprecated: true`.
    RouteDeprecated,
    /// The operation is now `x-internal: true`.
    RouteInternal,
    /// A response status code has disappeared.
    ResponseRemove,
    /// Parameters have disappeared.
    ParameterRemove {
        /// The names of the removed parameters.
        removed: Vec<String>,
    },
    /// A property or parameter changed its type (or object title).
    TypeChange {
        /// The old type label.
        old_type: String,
        /// The new type label.
        new_type: String,
        /// Structural path of the property, or the name of the parameter.
        path: String,
    },
    /// Values were dropped from an enum.
    EnumNarrow {
        /// Where the enum lives, e.g. `status.enum`, or the parameter name.
        path: String,
        /// The values that are no longer allowed.
        removed: Vec<String>,
    },
    /// Properties of an object are now required.
    RequiredPropertyAdd {
        /// The names of the newly required properties.
        added: Vec<String>,
        /// Structural path of the object.
        path: String,
    },
    /// A parameter is now required.
    RequiredParameterAdd {
        /// The parameter in question.
        name: String,
    },
    /// A response property may now be `null`.
    NullableAdd {
        /// Structural path of the property.
        path: String,
    },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecurityAdd { schemes } => write!(
                f,
                "`{}` security has been added to this route",
                schemes.join(", ")
            ),
            Self::PropertyRemove { removed, path } => write!(
                f,
                "`{}` has been removed from `{path}`",
                removed.join(", ")
            ),
            Self::RouteRemove => f.write_str("This route has been removed"),
            Self::RouteDeprecated => f.write_str("This route has been marked as deprecated"),
            Self::RouteInternal => f.write_str("This route has been marked as internal"),
            Self::ResponseRemove => f.write_str("This response has been removed"),
            Self::ParameterRemove { removed } => {
                write!(f, "`{}` has been removed", removed.join(", "))
            }
            Self::TypeChange {
                old_type,
                new_type,
                path,
            } => write!(f, "Type mismatch (`{old_type}`|`{new_type}`) for `{path}`"),
            Self::EnumNarrow { path, removed } => write!(
                f,
                "Enum mismatch at `{path}`, `{}` no longer allowed",
                removed.join(", ")
            ),
            Self::RequiredPropertyAdd { added, path } => write!(
                f,
                "New required properties `{}` at `{path}`",
                added.join(", ")
            ),
            Self::RequiredParameterAdd { name } => write!(f, "New required parameter `{name}`"),
            Self::NullableAdd { path } => write!(f, "`{path}` is now nullable"),
        }
    }
}

/// The errors that can happen in this crate.
///
/// All of them are input errors: they abort a check before any rule runs.
#[derive(Error, Debug)]
pub enum Error {
    /// The document file could not be read.
    #[error("unable to open {}", path.display())]
    Io {
        /// The offending file.
        path: PathBuf,
        /// The underlying cause.
        #[source]
        source: std::io::Error,
    },
    /// The document extension is neither JSON nor YAML.
    #[error("unsupported document format for {}, expected .json, .yaml or .yml", path.display())]
    UnsupportedFormat {
        /// The offending file.
        path: PathBuf,
    },
    /// The document is not valid YAML.
    #[error("failed to parse YAML document")]
    Yaml(#[from] serde_yaml::Error),
    /// The document has no `info.version` string.
    #[error("document has no `info.version`")]
    MissingVersion,
    /// Failed to parse JSON, or the document does not have the shape of an OpenAPI document.
    ///
    /// Any deserialization errors from serde that happen while converting the value into our
    /// typed model end up here.
    #[error("failed to parse document")]
    Serde(#[from] serde_json::Error),
}

/// All primitive types defined in JSON schema.
#[derive(Serialize, Clone, Copy, Ord, Eq, PartialEq, PartialOrd, Debug)]
#[allow(missing_docs)]
pub enum JsonSchemaType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "null")]
    Null,
}

impl JsonSchemaType {
    /// The keyword used for this type in a schema document.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonSchemaType::String => "string",
            JsonSchemaType::Number => "number",
            JsonSchemaType::Integer => "integer",
            JsonSchemaType::Object => "object",
            JsonSchemaType::Array => "array",
            JsonSchemaType::Boolean => "boolean",
            JsonSchemaType::Null => "null",
        }
    }
}

impl fmt::Display for JsonSchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<InstanceType> for JsonSchemaType {
    fn from(t: InstanceType) -> Self {
        match t {
            InstanceType::String => JsonSchemaType::String,
            InstanceType::Number => JsonSchemaType::Number,
            InstanceType::Integer => JsonSchemaType::Integer,
            InstanceType::Object => JsonSchemaType::Object,
            InstanceType::Array => JsonSchemaType::Array,
            InstanceType::Boolean => JsonSchemaType::Boolean,
            InstanceType::Null => JsonSchemaType::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_rendering() {
        let diagnostic = Diagnostic {
            operation: "GET /pet/{id}".into(),
            location: Some(Location::Status("200".into())),
            change: DiagnosticKind::PropertyRemove {
                removed: vec!["id".into()],
                path: "root".into(),
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "GET /pet/{id} (200): `id` has been removed from `root`."
        );

        let diagnostic = Diagnostic {
            operation: "DELETE /pet".into(),
            location: None,
            change: DiagnosticKind::RouteRemove,
        };
        assert_eq!(diagnostic.to_string(), "DELETE /pet: This route has been removed.");

        let diagnostic = Diagnostic {
            operation: "GET /pet".into(),
            location: Some(Location::Parameter(ParameterLocation::Query)),
            change: DiagnosticKind::RequiredParameterAdd {
                name: "limit".into(),
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "GET /pet (parameter::query): New required parameter `limit`."
        );
    }

    #[test]
    fn request_body_location() {
        assert_eq!(Location::RequestBody.to_string(), "Request Body");
    }
}
