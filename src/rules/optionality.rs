use crate::openapi::{Document, ParameterLocation};
use crate::operations::{for_each_matching, parameters};
use crate::{Diagnostic, DiagnosticKind, Location};

/// A request property that becomes required breaks every client that omits it. This includes
/// required properties that did not exist before.
pub(super) fn request_body_property_now_required(
    old: &Document,
    new: &Document,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let new_map = matched.new.request_body_schema().required_map();
        for (path, old_required) in matched.old.request_body_schema().required_map() {
            let Some(new_required) = new_map.get(&path) else {
                continue;
            };
            let added: Vec<String> = new_required.difference(&old_required).cloned().collect();
            if !added.is_empty() {
                diagnostics.push(Diagnostic {
                    operation: matched.key.to_string(),
                    location: Some(Location::RequestBody),
                    change: DiagnosticKind::RequiredPropertyAdd { added, path },
                });
            }
        }
    });
    diagnostics
}

pub(super) fn query_parameter_now_required(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_now_required(old, new, ParameterLocation::Query)
}

pub(super) fn header_now_required(old: &Document, new: &Document) -> Vec<Diagnostic> {
    parameter_now_required(old, new, ParameterLocation::Header)
}

/// Flags required parameters of `new` that were optional, or absent, in `old`.
fn parameter_now_required(
    old: &Document,
    new: &Document,
    location: ParameterLocation,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let old_parameters = parameters(matched.old, location);
        for (name, new_parameter) in parameters(matched.new, location) {
            let was_required = old_parameters
                .get(name)
                .map_or(false, |old_parameter| old_parameter.required);
            if new_parameter.required && !was_required {
                diagnostics.push(Diagnostic {
                    operation: matched.key.to_string(),
                    location: Some(Location::Parameter(location)),
                    change: DiagnosticKind::RequiredParameterAdd {
                        name: name.to_owned(),
                    },
                });
            }
        }
    });
    diagnostics
}

/// Response values that may now be `null` break clients that relied on them being present.
pub(super) fn response_property_now_nullable(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        for (code, old_response, new_response) in matched.responses() {
            let new_map = new_response.schema().nullable_map();
            for (path, was_nullable) in old_response.schema().nullable_map() {
                if !was_nullable && new_map.get(&path) == Some(&true) {
                    diagnostics.push(Diagnostic {
                        operation: matched.key.to_string(),
                        location: Some(Location::Status(code.to_owned())),
                        change: DiagnosticKind::NullableAdd { path },
                    });
                }
            }
        }
    });
    diagnostics
}
