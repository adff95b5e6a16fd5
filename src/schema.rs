//! Schemas as a sum type, and their flattened projections.
//!
//! Two schema trees are never compared node by node. Each one is projected into flat maps
//! keyed by structural path (`root`, `root.owner`, `root.tags.array[items]`), one map per
//! axis of comparison, and the rules diff those maps.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::schema::{InstanceType, Schema as RawSchema, SchemaObject, SingleOrVec};
use serde_json::Value;

use crate::JsonSchemaType;

/// Structural path of the top-level schema node.
pub const ROOT: &str = "root";

/// A schema node, reduced to what the safety rules compare.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    #[allow(missing_docs)]
    Object {
        title: Option<String>,
        properties: BTreeMap<String, Schema>,
        required: BTreeSet<String>,
        nullable: bool,
    },
    #[allow(missing_docs)]
    Array { items: Box<Schema>, nullable: bool },
    /// Anything else. `ty` is `None` when the type is unknown or ambiguous.
    #[allow(missing_docs)]
    Scalar {
        ty: Option<JsonSchemaType>,
        nullable: bool,
    },
}

impl Default for Schema {
    fn default() -> Self {
        Schema::Scalar {
            ty: None,
            nullable: false,
        }
    }
}

impl Schema {
    /// An object with no properties, standing in for a body that has no JSON schema.
    pub fn degenerate(title: Option<String>) -> Self {
        Schema::Object {
            title,
            properties: BTreeMap::new(),
            required: BTreeSet::new(),
            nullable: false,
        }
    }

    /// Whether `null` is an accepted value.
    pub fn is_nullable(&self) -> bool {
        match self {
            Schema::Object { nullable, .. }
            | Schema::Array { nullable, .. }
            | Schema::Scalar { nullable, .. } => *nullable,
        }
    }

    /// The declared (or inferred) type of this node.
    pub fn ty(&self) -> Option<JsonSchemaType> {
        match self {
            Schema::Object { .. } => Some(JsonSchemaType::Object),
            Schema::Array { .. } => Some(JsonSchemaType::Array),
            Schema::Scalar { ty, .. } => *ty,
        }
    }

    /// Visit every node with its structural path, parents before children.
    fn walk<'a>(&'a self, prefix: &str, visit: &mut impl FnMut(&str, &'a Schema)) {
        visit(prefix, self);
        match self {
            Schema::Object { properties, .. } => {
                for (name, property) in properties {
                    property.walk(&format!("{prefix}.{name}"), visit);
                }
            }
            Schema::Array { items, .. } => items.walk(&format!("{prefix}.array[items]"), visit),
            Schema::Scalar { .. } => (),
        }
    }

    /// For every object: the sorted names of its immediate properties.
    pub fn property_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        self.walk(ROOT, &mut |path, node| {
            if let Schema::Object { properties, .. } = node {
                map.insert(path.to_owned(), properties.keys().cloned().collect());
            }
        });
        map
    }

    /// For every object its title, for every scalar its type.
    pub fn type_map(&self) -> BTreeMap<String, TypeLabel> {
        let mut map = BTreeMap::new();
        self.walk(ROOT, &mut |path, node| {
            let label = match node {
                Schema::Object { title, .. } => TypeLabel::Object(title.clone()),
                Schema::Scalar { ty, .. } => TypeLabel::Scalar(*ty),
                Schema::Array { .. } => return,
            };
            map.insert(path.to_owned(), label);
        });
        map
    }

    /// For every object: the names it requires. Missing `required` is the empty set.
    pub fn required_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut map = BTreeMap::new();
        self.walk(ROOT, &mut |path, node| {
            if let Schema::Object { required, .. } = node {
                map.insert(path.to_owned(), required.clone());
            }
        });
        map
    }

    /// For every node: whether it accepts `null`.
    pub fn nullable_map(&self) -> BTreeMap<String, bool> {
        let mut map = BTreeMap::new();
        self.walk(ROOT, &mut |path, node| {
            map.insert(path.to_owned(), node.is_nullable());
        });
        map
    }
}

/// The value recorded by [`Schema::type_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLabel {
    /// An object, labelled by its title.
    Object(Option<String>),
    /// A scalar, labelled by its type.
    Scalar(Option<JsonSchemaType>),
}

impl TypeLabel {
    #[allow(missing_docs)]
    pub fn is_object(&self) -> bool {
        matches!(self, TypeLabel::Object(_))
    }

    /// Whether going from `self` to `new` changes the type.
    ///
    /// Labels that are unknown on either side (no title, no type) only count when the node
    /// flipped between object and scalar and the other side is known.
    pub fn changed_to(&self, new: &TypeLabel) -> bool {
        match (self, new) {
            (TypeLabel::Object(Some(old)), TypeLabel::Object(Some(new))) => old != new,
            (TypeLabel::Scalar(Some(old)), TypeLabel::Scalar(Some(new))) => old != new,
            (TypeLabel::Object(_), TypeLabel::Scalar(new)) => new.is_some(),
            (TypeLabel::Scalar(old), TypeLabel::Object(_)) => old.is_some(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLabel::Object(Some(title)) => f.write_str(title),
            TypeLabel::Object(None) => f.write_str("object"),
            TypeLabel::Scalar(Some(ty)) => write!(f, "{ty}"),
            TypeLabel::Scalar(None) => f.write_str("any"),
        }
    }
}

impl From<&RawSchema> for Schema {
    fn from(schema: &RawSchema) -> Self {
        match schema {
            RawSchema::Bool(_) => Schema::default(),
            RawSchema::Object(schema_object) => schema_object.into(),
        }
    }
}

impl From<&SchemaObject> for Schema {
    fn from(schema_object: &SchemaObject) -> Self {
        let (ty, mut nullable) = declared_type(schema_object);
        nullable |= schema_object
            .extensions
            .get("nullable")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let has_properties = schema_object
            .object
            .as_ref()
            .map_or(false, |object| !object.properties.is_empty());

        match ty {
            Some(InstanceType::Object) => object_schema(schema_object, nullable),
            None if has_properties => object_schema(schema_object, nullable),
            Some(InstanceType::Array) => {
                let items = match schema_object.array.as_ref().and_then(|a| a.items.as_ref()) {
                    Some(SingleOrVec::Single(items)) => Schema::from(&**items),
                    Some(SingleOrVec::Vec(items)) => {
                        items.first().map(Schema::from).unwrap_or_default()
                    }
                    None => Schema::default(),
                };
                Schema::Array {
                    items: Box::new(items),
                    nullable,
                }
            }
            other => Schema::Scalar {
                ty: other.map(JsonSchemaType::from),
                nullable,
            },
        }
    }
}

/// The single non-null type of a schema, and whether `null` was listed next to it.
fn declared_type(schema_object: &SchemaObject) -> (Option<InstanceType>, bool) {
    match &schema_object.instance_type {
        None => (None, false),
        Some(SingleOrVec::Single(ty)) if **ty == InstanceType::Null => (None, true),
        Some(SingleOrVec::Single(ty)) => (Some(**ty), false),
        Some(SingleOrVec::Vec(types)) => {
            let nullable = types.contains(&InstanceType::Null);
            let mut rest = types.iter().filter(|ty| **ty != InstanceType::Null);
            match (rest.next(), rest.next()) {
                (Some(ty), None) => (Some(*ty), nullable),
                _ => (None, nullable),
            }
        }
    }
}

fn object_schema(schema_object: &SchemaObject, nullable: bool) -> Schema {
    let title = schema_object
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.title.clone());
    let (properties, required) = match &schema_object.object {
        Some(object) => (
            object
                .properties
                .iter()
                .map(|(name, property)| (name.clone(), Schema::from(property)))
                .collect(),
            object.required.iter().cloned().collect(),
        ),
        None => (BTreeMap::new(), BTreeSet::new()),
    };
    Schema::Object {
        title,
        properties,
        required,
        nullable,
    }
}
