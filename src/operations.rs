use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::openapi::{Document, Method, Operation, Parameter, ParameterLocation, Response};
use crate::path::{self, KeyPath};

/// Identifies one operation by path template and method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationKey {
    #[allow(missing_docs)]
    pub path: String,
    #[allow(missing_docs)]
    pub method: Method,
}

impl OperationKey {
    /// `[paths][<path>][<method>]`
    pub fn key_path(&self) -> KeyPath {
        ["paths", self.path.as_str(), self.method.as_str()]
            .into_iter()
            .collect()
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Every operation of `doc`, in document order.
pub fn operation_keys(doc: &Document) -> Vec<OperationKey> {
    doc.paths()
        .iter()
        .flat_map(|(path, item)| {
            item.operations.keys().map(move |method| OperationKey {
                path: path.clone(),
                method: *method,
            })
        })
        .collect()
}

/// Operations of `old` that still resolve to something non-empty in `new`.
///
/// Only ever looks from old into new: operations that are new in `new` are not part of the
/// domain.
pub fn matching_keys(old: &Document, new: &Document) -> Vec<OperationKey> {
    operation_keys(old)
        .into_iter()
        .filter(|key| {
            new.get(&key.key_path())
                .map_or(false, |value| !path::is_empty_value(value))
        })
        .collect()
}

/// One operation present on both sides.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'a> {
    #[allow(missing_docs)]
    pub key: &'a OperationKey,
    #[allow(missing_docs)]
    pub old: &'a Operation,
    #[allow(missing_docs)]
    pub new: &'a Operation,
}

impl<'a> Matched<'a> {
    /// Responses by status code, for codes that exist on both sides.
    pub fn responses(&self) -> impl Iterator<Item = (&'a str, &'a Response, &'a Response)> + 'a {
        let (old, new) = (self.old, self.new);
        old.responses
            .iter()
            .filter_map(move |(code, old)| Some((code.as_str(), old, new.responses.get(code)?)))
    }
}

/// Run `f` over every operation in the correlated domain of `old` and `new`.
pub fn for_each_matching<F>(old: &Document, new: &Document, mut f: F)
where
    F: FnMut(Matched<'_>),
{
    for key in matching_keys(old, new) {
        if let (Some(old_op), Some(new_op)) = (old.operation(&key), new.operation(&key)) {
            f(Matched {
                key: &key,
                old: old_op,
                new: new_op,
            });
        }
    }
}

/// Parameters of `op` carried in `location`, by name.
pub fn parameters(op: &Operation, location: ParameterLocation) -> IndexMap<&str, &Parameter> {
    op.parameters
        .iter()
        .filter(|parameter| parameter.location == location)
        .map(|parameter| (parameter.name.as_str(), parameter))
        .collect()
}
