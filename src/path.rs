//! Bracket-path addressing into untyped document trees.
//!
//! A path such as `[paths][/pet][get][responses][200]` names a value inside a nested
//! document without any knowledge of its schema. Paths are held as a sequence of
//! [`Segment`]s and only rendered back into the bracket form for display.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// One step into a mapping or an array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// A mapping key. Decimal keys also address array elements.
    Key(String),
    /// An array position.
    Index(usize),
}

impl Segment {
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(key) => key.parse().ok(),
            Segment::Index(i) => Some(*i),
        }
    }

    /// The segment as it would appear as a mapping key.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_owned())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// An address into a document. The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    /// The path to the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: impl Into<Segment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    #[allow(missing_docs)]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<Segment>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeyPath(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "[{segment}]")?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('[').unwrap_or(s);
        let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(KeyPath::root());
        }
        Ok(trimmed.split("][").collect())
    }
}

/// Read the value at `path`, or `None` if any segment is missing.
pub fn get<'a>(doc: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |node, segment| match node {
            Value::Object(map) => map.get(&segment.as_key()),
            Value::Array(items) => items.get(segment.as_index()?),
            _ => None,
        })
}

/// Return a copy of `doc` with `value` written at `path`.
///
/// Missing intermediate nodes are created as empty mappings. Scalars in the way, and arrays
/// addressed by anything but an in-bounds index, are replaced by mappings.
pub fn set(doc: &Value, path: &KeyPath, value: Value) -> Value {
    let mut out = doc.clone();
    set_in_place(&mut out, path.segments(), value);
    out
}

fn set_in_place(node: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if let Value::Array(items) = node {
        if let Some(child) = head.as_index().and_then(|i| items.get_mut(i)) {
            set_in_place(child, rest, value);
            return;
        }
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.as_key()).or_insert(Value::Null);
        set_in_place(child, rest, value);
    }
}

/// Every `(path, value)` pair in `tree` whose final key is `key`, depth-first and in document
/// order. Array indices never match.
pub fn find_recursive<'a>(tree: &'a Value, key: &str) -> Vec<(KeyPath, &'a Value)> {
    let mut found = vec![];
    walk(tree, key, &KeyPath::root(), &mut found);
    found
}

fn walk<'a>(node: &'a Value, key: &str, at: &KeyPath, found: &mut Vec<(KeyPath, &'a Value)>) {
    match node {
        Value::Object(map) => {
            for (k, child) in map {
                let child_path = at.join(k.as_str());
                if k == key {
                    found.push((child_path.clone(), child));
                }
                walk(child, key, &child_path, found);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, key, &at.join(i), found);
            }
        }
        _ => (),
    }
}

/// Whether a value carries nothing: `null`, `false`, `""`, `[]` or `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
