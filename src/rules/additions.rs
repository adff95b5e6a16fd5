use crate::openapi::Document;
use crate::operations::for_each_matching;
use crate::{Diagnostic, DiagnosticKind};

/// New security schemes on an existing operation lock out clients that never sent them.
pub(super) fn security_additions(old: &Document, new: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for_each_matching(old, new, |matched| {
        let old_schemes = matched.old.security_schemes();
        let added: Vec<String> = matched
            .new
            .security_schemes()
            .difference(&old_schemes)
            .map(|scheme| scheme.to_string())
            .collect();

        if !added.is_empty() {
            diagnostics.push(Diagnostic {
                operation: matched.key.to_string(),
                location: None,
                change: DiagnosticKind::SecurityAdd { schemes: added },
            });
        }
    });
    diagnostics
}
