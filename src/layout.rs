//! Exact header-set contracts checked before analysis.
//!
//! Some deployments only accept one spreadsheet layout. A contract lists the
//! literal headers that must be present, no more and no fewer; order is not
//! significant. Contracts load from YAML:
//!
//! ```yaml
//! columns:
//!   - Order Number
//!   - Qty Shipped
//!   - Price
//! ```

use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::InsightError;

pub const LEGACY_COLUMNS: &[&str] = &[
    "Order Number",
    "Part Number",
    "Qty Shipped",
    "Product Type",
    "Pieces per Carton",
    "Date Ordered",
    "Price",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutContract {
    pub columns: Vec<String>,
}

impl LayoutContract {
    pub fn legacy() -> Self {
        Self {
            columns: LEGACY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening layout file {path:?}"))?;
        let contract: LayoutContract = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing layout file {path:?}"))?;
        Ok(contract)
    }

    /// Compares trimmed headers against the contract, case-sensitively.
    pub fn validate<S: AsRef<str>>(&self, headers: &[S]) -> Result<(), InsightError> {
        let expected = self
            .columns
            .iter()
            .map(|c| c.trim())
            .collect::<BTreeSet<_>>();
        let actual = headers
            .iter()
            .map(|h| h.as_ref().trim())
            .collect::<BTreeSet<_>>();
        let missing = expected
            .difference(&actual)
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        let unexpected = actual
            .difference(&expected)
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(InsightError::LayoutMismatch {
                missing,
                unexpected,
            })
        }
    }
}
