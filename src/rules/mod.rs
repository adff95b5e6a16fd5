//! The battery of safety rules.
//!
//! Every rule is a pure function of the old and new document that returns zero or more
//! [`Diagnostic`]s. Rules never fail and never depend on each other, so one finding never
//! prevents the rest of the report.

use std::fmt;

use serde::Serialize;

use crate::openapi::Document;
use crate::Diagnostic;

mod additions;
mod optionality;
mod removals;
mod type_changes;

/// The group a rule reports under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub enum Category {
    Additions,
    Removals,
    TypeChanges,
    Optionality,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Additions => "Additions",
            Category::Removals => "Removals",
            Category::TypeChanges => "Type Changes",
            Category::Optionality => "Optionality",
        })
    }
}

/// A named check over two documents.
pub struct Rule {
    /// Display name, e.g. `Response Property Removals`.
    pub name: &'static str,
    #[allow(missing_docs)]
    pub category: Category,
    check: fn(&Document, &Document) -> Vec<Diagnostic>,
}

impl Rule {
    /// Run the rule over `old` and `new`.
    pub fn run(&self, old: &Document, new: &Document) -> RuleResult {
        let diagnostics = (self.check)(old, new);
        tracing::debug!(
            rule = self.name,
            diagnostics = diagnostics.len(),
            "rule finished"
        );
        RuleResult {
            name: self.name,
            category: self.category,
            diagnostics,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

/// The outcome of running one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    #[allow(missing_docs)]
    pub name: &'static str,
    #[allow(missing_docs)]
    pub category: Category,
    /// Empty when the rule found nothing unsafe.
    pub diagnostics: Vec<Diagnostic>,
}

impl RuleResult {
    #[allow(missing_docs)]
    pub fn is_pass(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Every rule, in report order.
pub static RULES: [Rule; 18] = [
    Rule {
        name: "Route Security Additions",
        category: Category::Additions,
        check: additions::security_additions,
    },
    Rule {
        name: "Response Property Removals",
        category: Category::Removals,
        check: removals::response_property_removals,
    },
    Rule {
        name: "Request Body Property Removals",
        category: Category::Removals,
        check: removals::request_body_property_removals,
    },
    Rule {
        name: "Route Removals",
        category: Category::Removals,
        check: removals::route_removals,
    },
    Rule {
        name: "Routes Marked Deprecated",
        category: Category::Removals,
        check: removals::routes_marked_deprecated,
    },
    Rule {
        name: "Routes Marked Internal",
        category: Category::Removals,
        check: removals::routes_marked_internal,
    },
    Rule {
        name: "Response Removals",
        category: Category::Removals,
        check: removals::response_removals,
    },
    Rule {
        name: "Query Parameter Removals",
        category: Category::Removals,
        check: removals::query_parameter_removals,
    },
    Rule {
        name: "Header Removals",
        category: Category::Removals,
        check: removals::header_removals,
    },
    Rule {
        name: "Response Property Type Changes",
        category: Category::TypeChanges,
        check: type_changes::response_property_type_changes,
    },
    Rule {
        name: "Request Body Property Type Changes",
        category: Category::TypeChanges,
        check: type_changes::request_body_property_type_changes,
    },
    Rule {
        name: "Query Parameter Type Changes",
        category: Category::TypeChanges,
        check: type_changes::query_parameter_type_changes,
    },
    Rule {
        name: "Header Type Changes",
        category: Category::TypeChanges,
        check: type_changes::header_type_changes,
    },
    Rule {
        name: "Check Enums Changed",
        category: Category::TypeChanges,
        check: type_changes::enums_changed,
    },
    Rule {
        name: "Request Body Property Optionality",
        category: Category::Optionality,
        check: optionality::request_body_property_now_required,
    },
    Rule {
        name: "Query Parameter Optionality",
        category: Category::Optionality,
        check: optionality::query_parameter_now_required,
    },
    Rule {
        name: "Header Optionality",
        category: Category::Optionality,
        check: optionality::header_now_required,
    },
    Rule {
        name: "Response Property Optionality",
        category: Category::Optionality,
        check: optionality::response_property_now_nullable,
    },
];

/// Run every rule in order.
pub fn run_all(old: &Document, new: &Document) -> Vec<RuleResult> {
    RULES.iter().map(|rule| rule.run(old, new)).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    use crate::openapi::Document;

    /// A document with a single `GET /pet/{id}` operation.
    pub fn pet_spec() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1.0.0"},
            "paths": {
                "/pet/{id}": {
                    "get": {
                        "security": [{"api_key": []}],
                        "parameters": [
                            {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}},
                            {"name": "fields", "in": "query", "schema": {"type": "string", "enum": ["all", "summary"]}},
                            {"name": "X-Request-Id", "in": "header", "schema": {"type": "string"}}
                        ],
                        "responses": {
                            "200": {
                                "description": "A pet",
                                "content": {"application/json": {"schema": {
                                    "type": "object",
                                    "title": "Pet",
                                    "required": ["name"],
                                    "properties": {
                                        "id": {"type": "integer"},
                                        "name": {"type": "string"},
                                        "tag": {"type": "string", "nullable": false},
                                        "status": {"type": "string", "enum": ["available", "pending", "sold"]}
                                    }
                                }}}
                            },
                            "404": {"description": "Not found"}
                        }
                    },
                    "put": {
                        "requestBody": {
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "title": "PetUpdate",
                                "required": ["name"],
                                "properties": {
                                    "name": {"type": "string"},
                                    "tag": {"type": "string"}
                                }
                            }}}
                        },
                        "responses": {"204": {"description": "Updated"}}
                    }
                }
            }
        })
    }

    /// `pet_spec` with `value` written at `path`.
    pub fn with(spec: &Value, path: &str, value: Value) -> Value {
        crate::path::set(spec, &path.parse().unwrap(), value)
    }

    /// `spec` with the entry named by the last segment of `path` removed.
    pub fn without(spec: &Value, path: &str) -> Value {
        let (parent_path, key) = path.trim_end_matches(']').rsplit_once('[').unwrap();
        let parent_path = parent_path.parse().unwrap();
        let mut parent = crate::path::get(spec, &parent_path).unwrap().clone();
        match &mut parent {
            Value::Object(map) => {
                map.remove(key);
            }
            Value::Array(items) => {
                items.remove(key.parse().unwrap());
            }
            _ => panic!("cannot remove from a scalar"),
        }
        crate::path::set(spec, &parent_path, parent)
    }

    pub fn docs(old: Value, new: Value) -> (Document, Document) {
        (
            Document::from_value(old).unwrap(),
            Document::from_value(new).unwrap(),
        )
    }

    /// Render the diagnostics of one rule function.
    pub fn rendered(
        check: fn(&Document, &Document) -> Vec<crate::Diagnostic>,
        old: Value,
        new: Value,
    ) -> Vec<String> {
        let (old, new) = docs(old, new);
        check(&old, &new).iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = RULES.iter().map(|rule| rule.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn identical_documents_pass_every_rule() {
        let (old, new) = docs(pet_spec(), pet_spec());
        for result in run_all(&old, &new) {
            assert!(result.is_pass(), "{}: {:?}", result.name, result.diagnostics);
        }
    }

    #[test]
    fn test_support_editing() {
        let spec = pet_spec();
        let edited = without(&spec, "[paths][/pet/{id}][get][responses][404]");
        assert!(edited["paths"]["/pet/{id}"]["get"]["responses"].get("404").is_none());
        assert!(edited["paths"]["/pet/{id}"]["get"]["responses"].get("200").is_some());

        let edited = with(&spec, "[info][version]", "2.0.0".into());
        assert_eq!(edited["info"]["version"], "2.0.0");
    }
}
