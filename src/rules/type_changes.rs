use serde_json::Value;

use crate::openapi::{Document, ParameterLocation};
use crate::operations::{for_each_matching, parameters};
use crate::path::{self, KeyPath, Segment};
use crate::schema::{Schema, ROOT};
use crate::{Diagnostic, DiagnosticKind, Location};

pub(super) fn response_property_type_changes(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        for (code, old_response, new_response) in matched.responses() {
            property_type_changes(
                &matched.key.to_string(),
                Location::Status(code.to_owned()),
                &old_response.schema(),
                &new_response.schema(),
                &mut diagnostics,
            );
        }
    });
    diagnostics
}

pub(super) fn request_body_property_type_changes(
    old: &Document,
    new: &Document,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        property_type_changes(
            &matched.key.to_string(),
            Location::RequestBody,
            &matched.old.request_body_schema(),
            &matched.new.request_body_schema(),
            &mut diagnostics,
        );
    });
    diagnostics
}

fn property_type_changes(
    operation: &str,
    location: Location,
    old: &Schema,
    new: &Schema,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let new_map = new.type_map();
    for (path, old_label) in old.type_map() {
        let Some(new_label) = new_map.get(&path) else {
            continue;
        };
        // the root title is a label, not part of the contract
        if path == ROOT && old_label.is_object() && new_label.is_object() {
            continue;
        }
        if old_label.changed_to(new_label) {
            diagnostics.push(Diagnostic {
                operation: operation.to_owned(),
                location: Some(location.clone()),
                change: DiagnosticKind::TypeChange {
                    old_type: old_label.to_string(),
                    new_type: new_label.to_string(),
                    path,
                },
            });
        }
    }
}

pub(super) fn query_parameter_type_changes(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_type_changes(old, new, ParameterLocation::Query)
}

pub(super) fn header_type_changes(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_type_changes(old, new, ParameterLocation::Header)
}

fn parameter_type_changes(
    old: &Document,
    new: &Document,
    location: ParameterLocation,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let new_parameters = parameters(matched.new, location);
        for (name, old_parameter) in parameters(matched.old, location) {
            let Some(new_parameter) = new_parameters.get(name) else {
                continue;
            };
            if let (Some(old_type), Some(new_type)) =
                (old_parameter.schema().ty(), new_parameter.schema().ty())
            {
                if old_type != new_type {
                    diagnostics.push(Diagnostic {
                        operation: matched.key.to_string(),
                        location: Some(Location::Parameter(location)),
                        change: DiagnosticKind::TypeChange {
                            old_type: old_type.to_string(),
                            new_type: new_type.to_string(),
                            path: name.to_owned(),
                        },
                    });
                }
            }
        }
    });
    diagnostics
}

/// Enums may grow but never lose values. Looks at every `enum` keyword inside responses and
/// parameters, wherever it sits.
pub(super) fn enums_changed(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let operation_path = matched.key.key_path();
        let operation = matched.key.to_string();

        for (code, _, _) in matched.responses() {
            let response_path = operation_path.join("responses").join(code);
            let (Some(old_response), Some(new_response)) =
                (old.get(&response_path), new.get(&response_path))
            else {
                continue;
            };
            for (enum_path, old_values) in path::find_recursive(old_response, "enum") {
                let Some(new_values) = path::get(new_response, &enum_path) else {
                    continue;
                };
                let removed = removed_enum_values(old_values, new_values);
                if !removed.is_empty() {
                    diagnostics.push(Diagnostic {
                        operation: operation.clone(),
                        location: Some(Location::Status(code.to_owned())),
                        change: DiagnosticKind::EnumNarrow {
                            path: format_enum_path(&enum_path),
                            removed,
                        },
                    });
                }
            }
        }

        // parameters are correlated by name and location, not by list position
        for (old_index, old_parameter) in matched.old.parameters.iter().enumerate() {
            let Some(new_index) = matched.new.parameters.iter().position(|candidate| {
                candidate.name == old_parameter.name && candidate.location == old_parameter.location
            }) else {
                continue;
            };
            let parameters_path = operation_path.join("parameters");
            let (Some(old_raw), Some(new_raw)) = (
                old.get(&parameters_path.join(old_index)),
                new.get(&parameters_path.join(new_index)),
            ) else {
                continue;
            };
            for (enum_path, old_values) in path::find_recursive(old_raw, "enum") {
                let Some(new_values) = path::get(new_raw, &enum_path) else {
                    continue;
                };
                let removed = removed_enum_values(old_values, new_values);
                if !removed.is_empty() {
                    diagnostics.push(Diagnostic {
                        operation: operation.clone(),
                        location: Some(Location::Parameter(old_parameter.location)),
                        change: DiagnosticKind::EnumNarrow {
                            path: old_parameter.name.clone(),
                            removed,
                        },
                    });
                }
            }
        }
    });
    diagnostics
}

/// Values of `old` missing from `new`. Anything that is not a pair of arrays (say, a property
/// that happens to be called `enum`) has nothing to compare.
fn removed_enum_values(old: &Value, new: &Value) -> Vec<String> {
    let (Value::Array(old), Value::Array(new)) = (old, new) else {
        return vec![];
    };
    old.iter()
        .filter(|value| !new.contains(value))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// `[content][application/json][schema][properties][status][enum]` becomes `status.enum`.
fn format_enum_path(enum_path: &KeyPath) -> String {
    let mut segments = enum_path.segments();
    if let [Segment::Key(content), _, Segment::Key(schema), rest @ ..] = segments {
        if content == "content" && schema == "schema" {
            segments = rest;
        }
    }
    if let [Segment::Key(properties), rest @ ..] = segments {
        if properties == "properties" && !rest.is_empty() {
            segments = rest;
        }
    }
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use serde_json::json;

    const PET_200: &str = "[paths][/pet/{id}][get][responses][200][content][application/json][schema]";
    const PUT_BODY: &str = "[paths][/pet/{id}][put][requestBody][content][application/json][schema]";

    #[test]
    fn response_property_type_changed() {
        let old = pet_spec();
        let new = with(&old, &format!("{PET_200}[properties][id][type]"), json!("string"));
        assert_eq!(
            rendered(response_property_type_changes, old, new),
            vec!["GET /pet/{id} (200): Type mismatch (`integer`|`string`) for `root.id`."]
        );
    }

    #[test]
    fn nested_object_retitled() {
        let old = with(
            &pet_spec(),
            &format!("{PET_200}[properties][owner]"),
            json!({"type": "object", "title": "Owner", "properties": {}}),
        );
        let new = with(&old, &format!("{PET_200}[properties][owner][title]"), json!("Person"));
        assert_eq!(
            rendered(response_property_type_changes, old, new),
            vec!["GET /pet/{id} (200): Type mismatch (`Owner`|`Person`) for `root.owner`."]
        );
    }

    #[test]
    fn root_title_is_ignored() {
        let old = pet_spec();
        let new = with(&old, &format!("{PET_200}[title]"), json!("Animal"));
        assert!(rendered(response_property_type_changes, old, new).is_empty());
    }

    #[test]
    fn array_items_type_changed() {
        let old = with(
            &pet_spec(),
            &format!("{PUT_BODY}[properties][photos]"),
            json!({"type": "array", "items": {"type": "string"}}),
        );
        let new = with(
            &old,
            &format!("{PUT_BODY}[properties][photos][items][type]"),
            json!("integer"),
        );
        assert_eq!(
            rendered(request_body_property_type_changes, old, new),
            vec![
                "PUT /pet/{id} (Request Body): Type mismatch (`string`|`integer`) for `root.photos.array[items]`."
            ]
        );
    }

    #[test]
    fn parameter_type_changed() {
        let old = pet_spec();
        let new = with(
            &old,
            "[paths][/pet/{id}][get][parameters][1][schema][type]",
            json!("integer"),
        );
        assert_eq!(
            rendered(query_parameter_type_changes, old.clone(), new.clone()),
            vec!["GET /pet/{id} (parameter::query): Type mismatch (`string`|`integer`) for `fields`."]
        );
        assert!(rendered(header_type_changes, old, new).is_empty());
    }

    #[test]
    fn header_type_changed() {
        let old = pet_spec();
        let new = with(
            &old,
            "[paths][/pet/{id}][get][parameters][2][schema][type]",
            json!("number"),
        );
        assert_eq!(
            rendered(header_type_changes, old, new),
            vec!["GET /pet/{id} (parameter::header): Type mismatch (`string`|`number`) for `X-Request-Id`."]
        );
    }

    #[test]
    fn response_enum_narrowed() {
        let old = pet_spec();
        let new = with(
            &old,
            &format!("{PET_200}[properties][status][enum]"),
            json!(["available", "pending"]),
        );
        assert_eq!(
            rendered(enums_changed, old, new),
            vec!["GET /pet/{id} (200): Enum mismatch at `status.enum`, `sold` no longer allowed."]
        );
    }

    #[test]
    fn response_enum_widened() {
        let old = pet_spec();
        let new = with(
            &old,
            &format!("{PET_200}[properties][status][enum]"),
            json!(["available", "pending", "sold", "adopted"]),
        );
        assert!(rendered(enums_changed, old, new).is_empty());
    }

    #[test]
    fn parameter_enum_narrowed_after_reordering() {
        let old = pet_spec();
        let new = with(
            &old,
            "[paths][/pet/{id}][get][parameters]",
            json!([
                {"name": "X-Request-Id", "in": "header", "schema": {"type": "string"}},
                {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}},
                {"name": "fields", "in": "query", "schema": {"type": "string", "enum": ["all"]}}
            ]),
        );
        assert_eq!(
            rendered(enums_changed, old, new),
            vec!["GET /pet/{id} (parameter::query): Enum mismatch at `fields`, `summary` no longer allowed."]
        );
    }

    #[test]
    fn enum_paths() {
        let path: KeyPath = "[content][application/json][schema][properties][status][enum]"
            .parse()
            .unwrap();
        assert_eq!(format_enum_path(&path), "status.enum");

        let path: KeyPath = "[content][application/json][schema][items][enum]".parse().unwrap();
        assert_eq!(format_enum_path(&path), "items.enum");

        let path: KeyPath = "[content][application/json][schema][enum]".parse().unwrap();
        assert_eq!(format_enum_path(&path), "enum");
    }

    #[test]
    fn non_array_enums_are_ignored() {
        assert!(removed_enum_values(&json!({"type": "string"}), &json!({})).is_empty());
        assert_eq!(removed_enum_values(&json!([1, 2]), &json!([2])), vec!["1"]);
    }
}
