use std::collections::BTreeSet;

use crate::openapi::{Document, ParameterLocation};
use crate::operations::{for_each_matching, operation_keys, parameters};
use crate::schema::Schema;
use crate::{Diagnostic, DiagnosticKind, Location};

pub(super) fn response_property_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        for (code, old_response, new_response) in matched.responses() {
            property_removals(
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

pub(super) fn request_body_property_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        if let Some(old_body) = &matched.old.request_body {
            property_removals(
                &matched.key.to_string(),
                Location::RequestBody,
                &old_body.schema(),
                &matched.new.request_body_schema(),
                &mut diagnostics,
            );
        }
    });
    diagnostics
}

/// One diagnostic per object path that lost properties. Paths missing from `new` altogether
/// are skipped.
fn property_removals(
    operation: &str,
    location: Location,
    old: &Schema,
    new: &Schema,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let new_map = new.property_map();
    for (path, old_properties) in old.property_map() {
        let Some(new_properties) = new_map.get(&path) else {
            continue;
        };
        let removed: Vec<String> = old_properties
            .into_iter()
            .filter(|property| !new_properties.contains(property))
            .collect();

        if !removed.is_empty() {
            diagnostics.push(Diagnostic {
                operation: operation.to_owned(),
                location: Some(location.clone()),
                change: DiagnosticKind::PropertyRemove { removed, path },
            });
        }
    }
}

/// Compares the full operation sets, not just the correlated domain.
pub(super) fn route_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let new_keys: BTreeSet<_> = operation_keys(new).into_iter().collect();
    operation_keys(old)
        .into_iter()
        .filter(|key| !new_keys.contains(key))
        .map(|key| Diagnostic {
            operation: key.to_string(),
            location: None,
            change: DiagnosticKind::RouteRemove,
        })
        .collect()
}

pub(super) fn routes_marked_deprecated(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        if !matched.old.deprecated && matched.new.deprecated {
            diagnostics.push(Diagnostic {
                operation: matched.key.to_string(),
                location: None,
                change: DiagnosticKind::RouteDeprecated,
            });
        }
    });
    diagnostics
}

pub(super) fn routes_marked_internal(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        if !matched.old.internal && matched.new.internal {
            diagnostics.push(Diagnostic {
                operation: matched.key.to_string(),
                location: None,
                change: DiagnosticKind::RouteInternal,
            });
        }
    });
    diagnostics
}

pub(super) fn response_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        for code in matched.old.responses.keys() {
            if !matched.new.responses.contains_key(code) {
                diagnostics.push(Diagnostic {
                    operation: matched.key.to_string(),
                    location: Some(Location::Status(code.clone())),
                    change: DiagnosticKind::ResponseRemove,
                });
            }
        }
    });
    diagnostics
}

pub(super) fn query_parameter_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_removals(old, new, ParameterLocation::Query)
}

pub(super) fn header_removals(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_removals(old, new, ParameterLocation::Header)
}

fn parameter_removals(
    old: &Document,
    new: &Document,
    location: ParameterLocation,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let new_parameters = parameters(matched.new, location);
        let removed: Vec<String> = parameters(matched.old, location)
            .into_keys()
            .filter(|name| !new_parameters.contains_key(name))
            .map(str::to_owned)
            .collect();

        if !removed.is_empty() {
            diagnostics.push(Diagnostic {
                operation: matched.key.to_string(),
                location: Some(Location::Parameter(location)),
                change: DiagnosticKind::ParameterRemove { removed },
            });
        }
    });
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use serde_json::json;

    const PET_200: &str = "[paths][/pet/{id}][get][responses][200][content][application/json][schema]";
    const PUT_BODY: &str = "[paths][/pet/{id}][put][requestBody][content][application/json][schema]";

    #[test]
    fn response_property_removed() {
        let old = pet_spec();
        let new = without(&old, &format!("{PET_200}[properties][id]"));
        assert_eq!(
            rendered(response_property_removals, old, new),
            vec!["GET /pet/{id} (200): `id` has been removed from `root`."]
        );
    }

    #[test]
    fn optional_response_property_added() {
        let old = pet_spec();
        let new = with(&old, &format!("{PET_200}[properties][age]"), json!({"type": "integer"}));
        assert!(rendered(response_property_removals, old, new).is_empty());
    }

    #[test]
    fn nested_removals_are_reported_per_object() {
        let old = with(
            &pet_spec(),
            &format!("{PET_200}[properties][owner]"),
            json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}, "email": {"type": "string"}}
            }),
        );
        let new = without(&old, &format!("{PET_200}[properties][owner][properties][email]"));
        let new = without(&new, &format!("{PET_200}[properties][tag]"));
        let new = without(&new, &format!("{PET_200}[properties][status]"));

        assert_eq!(
            rendered(response_property_removals, old, new),
            vec![
                "GET /pet/{id} (200): `status, tag` has been removed from `root`.",
                "GET /pet/{id} (200): `email` has been removed from `root.owner`.",
            ]
        );
    }

    #[test]
    fn diverged_shapes_are_skipped() {
        let old = with(
            &pet_spec(),
            &format!("{PET_200}[properties][owner]"),
            json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
        );
        let new = with(&old, &format!("{PET_200}[properties][owner]"), json!({"type": "string"}));
        assert!(rendered(response_property_removals, old, new).is_empty());
    }

    #[test]
    fn request_body_property_removed() {
        let old = pet_spec();
        let new = without(&old, &format!("{PUT_BODY}[properties][tag]"));
        assert_eq!(
            rendered(request_body_property_removals, old, new),
            vec!["PUT /pet/{id} (Request Body): `tag` has been removed from `root`."]
        );
    }

    #[test]
    fn request_body_removed_entirely() {
        let old = pet_spec();
        let new = without(&old, "[paths][/pet/{id}][put][requestBody]");
        assert_eq!(
            rendered(request_body_property_removals, old, new),
            vec!["PUT /pet/{id} (Request Body): `name, tag` has been removed from `root`."]
        );
    }

    #[test]
    fn route_removed() {
        let old = pet_spec();
        let new = without(&old, "[paths][/pet/{id}][put]");
        assert_eq!(
            rendered(route_removals, old.clone(), new),
            vec!["PUT /pet/{id}: This route has been removed."]
        );

        let new = with(&old, "[paths][/store][get]", json!({"responses": {}}));
        assert!(rendered(route_removals, old, new).is_empty());
    }

    #[test]
    fn marked_deprecated() {
        let old = pet_spec();
        let new = with(&old, "[paths][/pet/{id}][get][deprecated]", json!(true));
        assert_eq!(
            rendered(routes_marked_deprecated, old.clone(), new.clone()),
            vec!["GET /pet/{id}: This route has been marked as deprecated."]
        );
        // already deprecated on both sides
        assert!(rendered(routes_marked_deprecated, new.clone(), new.clone()).is_empty());
        // un-deprecating is fine
        assert!(rendered(routes_marked_deprecated, new, old).is_empty());
    }

    #[test]
    fn marked_internal() {
        let old = pet_spec();
        let new = with(&old, "[paths][/pet/{id}][put][x-internal]", json!(true));
        assert_eq!(
            rendered(routes_marked_internal, old, new),
            vec!["PUT /pet/{id}: This route has been marked as internal."]
        );
    }

    #[test]
    fn response_removed() {
        let old = pet_spec();
        let new = without(&old, "[paths][/pet/{id}][get][responses][404]");
        assert_eq!(
            rendered(response_removals, old, new),
            vec!["GET /pet/{id} (404): This response has been removed."]
        );
    }

    #[test]
    fn parameters_removed() {
        let old = pet_spec();
        let new = with(
            &old,
            "[paths][/pet/{id}][get][parameters]",
            json!([{"name": "id", "in": "path", "required": true}]),
        );
        assert_eq!(
            rendered(query_parameter_removals, old.clone(), new.clone()),
            vec!["GET /pet/{id} (parameter::query): `fields` has been removed."]
        );
        assert_eq!(
            rendered(header_removals, old, new),
            vec!["GET /pet/{id} (parameter::header): `X-Request-Id` has been removed."]
        );
    }

    #[test]
    fn parameter_moved_to_another_location() {
        let old = pet_spec();
        let new = with(&old, "[paths][/pet/{id}][get][parameters][1][in]", json!("header"));
        assert_eq!(
            rendered(query_parameter_removals, old.clone(), new.clone()),
            vec!["GET /pet/{id} (parameter::query): `fields` has been removed."]
        );
        assert!(rendered(header_removals, old, new).is_empty());
    }
}
