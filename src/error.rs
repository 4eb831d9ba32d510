//! Error taxonomy for the insight pipeline.
//!
//! Only conditions that stop a run are errors. Unparseable cells surface as
//! [`crate::metrics::FieldOutcome::Invalid`] and rules without enough data as
//! [`crate::insights::RuleOutcome::Skipped`]; neither is reported through
//! [`InsightError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::roles::Role;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error(
        "Missing required column role(s): {}. Rename a header so it contains one of: {}",
        join_roles(.roles),
        keyword_hint(.roles)
    )]
    MissingRoles { roles: Vec<Role> },

    #[error(
        "Could not read {path:?} as a spreadsheet: {reason}. \
         Check that the file is not password protected and is a valid .xlsx, .xls or .csv file"
    )]
    Ingestion { path: PathBuf, reason: String },

    #[error(
        "Header layout does not match the expected columns (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    LayoutMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl InsightError {
    pub fn ingestion(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        InsightError::Ingestion {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn keyword_hint(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| format!("{} ({})", role.as_str(), role.keywords().join("/")))
        .collect::<Vec<_>>()
        .join("; ")
}
