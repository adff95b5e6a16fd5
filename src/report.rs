use std::fmt;

use serde::Serialize;

use crate::rules::{Category, RuleResult};

/// Everything one comparison produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[allow(missing_docs)]
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Whether the rules ran at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The documents declare different versions, so they were not compared.
    Skipped {
        #[allow(missing_docs)]
        old_version: String,
        #[allow(missing_docs)]
        new_version: String,
    },
    /// Every rule ran, in order.
    Checked {
        #[allow(missing_docs)]
        results: Vec<RuleResult>,
    },
}

/// The overall result of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub enum Verdict {
    Skipped,
    Pass,
    Fail,
}

impl Verdict {
    /// Process exit status for this verdict.
    pub fn exit_code(&self) -> u8 {
        match self {
            Verdict::Skipped | Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

impl Report {
    /// `Fail` as soon as any rule reported anything.
    pub fn verdict(&self) -> Verdict {
        match &self.outcome {
            Outcome::Skipped { .. } => Verdict::Skipped,
            Outcome::Checked { results } if results.iter().all(RuleResult::is_pass) => {
                Verdict::Pass
            }
            Outcome::Checked { .. } => Verdict::Fail,
        }
    }

    /// Per-rule results. Empty when the comparison was skipped.
    pub fn results(&self) -> &[RuleResult] {
        match &self.outcome {
            Outcome::Skipped { .. } => &[],
            Outcome::Checked { results } => results,
        }
    }

    /// The results of the rule called `name`, if it ran.
    pub fn result(&self, name: &str) -> Option<&RuleResult> {
        self.results().iter().find(|result| result.name == name)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let results = match &self.outcome {
            Outcome::Skipped {
                old_version,
                new_version,
            } => {
                return write!(
                    f,
                    "Specs being compared are not the same version ({old_version} vs {new_version}). Exiting quietly."
                )
            }
            Outcome::Checked { results } => results,
        };

        let mut category: Option<Category> = None;
        for result in results {
            if category != Some(result.category) {
                if category.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "{}", result.category)?;
                category = Some(result.category);
            }
            if result.is_pass() {
                writeln!(f, "  PASS: {}.", result.name)?;
            } else {
                writeln!(f, "  FAIL: {}.", result.name)?;
                for diagnostic in &result.diagnostics {
                    writeln!(f, "    - {diagnostic}")?;
                }
            }
        }
        writeln!(f)?;

        match self.verdict() {
            Verdict::Fail => write!(f, "FAIL: Unsafe API changes. Create a new API version!"),
            _ => write!(f, "PASS: All changes are safe!"),
        }
    }
}
