#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

use std::path::Path;

use serde_json::Value;

mod loader;
mod report;
mod types;

pub mod openapi;
/// Operation correlation between two documents.
pub mod operations;
pub mod path;
pub mod rules;
pub mod schema;

pub use loader::load;
pub use openapi::Document;
pub use report::*;
pub use rules::{Category, Rule, RuleResult, RULES};
pub use types::*;

/// Compare two API contract documents and report every unsafe change.
///
/// `old` is the published contract, `new` is the candidate replacing it. Documents that
/// declare different `info.version`s are not compared at all.
pub fn check(old: Value, new: Value) -> Result<Report, Error> {
    let old = Document::from_value(old)?;
    let new = Document::from_value(new)?;

    if old.version() != new.version() {
        tracing::info!(
            old_version = old.version(),
            new_version = new.version(),
            "versions differ, skipping comparison"
        );
        return Ok(Report {
            outcome: Outcome::Skipped {
                old_version: old.version().to_owned(),
                new_version: new.version().to_owned(),
            },
        });
    }

    Ok(Report {
        outcome: Outcome::Checked {
            results: rules::run_all(&old, &new),
        },
    })
}

/// Load two documents from disk and [`check`] them.
pub fn check_files(old: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<Report, Error> {
    check(load(old)?, load(new)?)
}
