//! Revenue derivation and grouped aggregates.
//!
//! [`compute`] copies every raw row into a [`DerivedRow`] carrying typed
//! outcomes for the role columns. Revenue is never stored: it is recomputed
//! from quantity and price on each call to [`DerivedRow::revenue`].

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{CellValue, Dataset, parse_date_like, parse_number},
    error::InsightError,
    roles::{ColumnRoleMap, Role},
};

pub const PRODUCT_DISPLAY_LIMIT: usize = 25;
pub const REVENUE_COLUMN: &str = "Revenue";

/// Result of coercing one role cell of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldOutcome<T> {
    Valid(T),
    Missing,
    Invalid { raw: String },
}

impl<T> FieldOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldOutcome::Valid(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldOutcome::Invalid { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    /// 1-based position of the row in the uploaded table (header excluded).
    pub row_number: usize,
    pub cells: Vec<CellValue>,
    pub quantity: FieldOutcome<f64>,
    pub price: FieldOutcome<f64>,
    pub date: FieldOutcome<NaiveDate>,
    pub product: Option<String>,
}

impl DerivedRow {
    pub fn revenue(&self) -> Option<f64> {
        Some(self.quantity.value()? * self.price.value()?)
    }
}

/// A cell that could not be coerced for the role it was assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub role: Role,
    pub column: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub headers: Vec<String>,
    pub rows: Vec<DerivedRow>,
    pub issues: Vec<RowIssue>,
}

impl DerivedTable {
    pub fn revenue_rows(&self) -> impl Iterator<Item = (&DerivedRow, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.revenue().map(|revenue| (row, revenue)))
    }

    pub fn total_revenue(&self) -> f64 {
        self.revenue_rows().map(|(_, revenue)| revenue).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub key_label: String,
    pub value_label: String,
    pub rows: Vec<AggregateRow>,
    /// Number of rows shown by [`AggregateTable::display_rows`], if capped.
    pub display_limit: Option<usize>,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }

    pub fn display_rows(&self) -> &[AggregateRow] {
        match self.display_limit {
            Some(limit) if limit < self.rows.len() => &self.rows[..limit],
            _ => &self.rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTables {
    pub products: Option<AggregateTable>,
    pub monthly: Option<AggregateTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsOutput {
    pub derived: DerivedTable,
    pub aggregates: AggregateTables,
}

pub fn compute(dataset: &Dataset, roles: &ColumnRoleMap) -> Result<MetricsOutput, InsightError> {
    let missing = roles.missing_required();
    if !missing.is_empty() {
        return Err(InsightError::MissingRoles { roles: missing });
    }
    let derived = derive_rows(dataset, roles);
    if !derived.issues.is_empty() {
        warn!(
            "{} cell(s) could not be coerced; affected rows are excluded from the computations that need them",
            derived.issues.len()
        );
    }
    let products = roles
        .get(Role::Product)
        .map(|_| product_aggregate(&derived));
    let monthly = roles.get(Role::Date).map(|_| monthly_aggregate(&derived));
    info!(
        "Derived {} row(s); {} with revenue totalling {:.2}",
        derived.rows.len(),
        derived.revenue_rows().count(),
        derived.total_revenue()
    );
    Ok(MetricsOutput {
        derived,
        aggregates: AggregateTables { products, monthly },
    })
}

pub fn derive_rows(dataset: &Dataset, roles: &ColumnRoleMap) -> DerivedTable {
    let mut headers = dataset.headers().to_vec();
    headers.push(REVENUE_COLUMN.to_string());
    let mut issues = Vec::new();
    let rows = dataset
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, cells)| {
            let row_number = idx + 1;
            let quantity = role_cell(cells, roles, Role::Quantity).map(coerce_number);
            let price = role_cell(cells, roles, Role::Price).map(coerce_number);
            let date = role_cell(cells, roles, Role::Date).map(coerce_date);
            let product = role_cell(cells, roles, Role::Product)
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.as_display().trim().to_string());

            for (role, outcome) in [
                (Role::Quantity, quantity.as_ref().map(FieldOutcome::is_invalid)),
                (Role::Price, price.as_ref().map(FieldOutcome::is_invalid)),
                (Role::Date, date.as_ref().map(FieldOutcome::is_invalid)),
            ] {
                if outcome == Some(true)
                    && let Some(column) = roles.get(role)
                {
                    let raw = cells[column.index].as_display();
                    debug!(
                        "Row {row_number}: '{raw}' in column '{}' is not a valid {role}",
                        column.name
                    );
                    issues.push(RowIssue {
                        row_number,
                        role,
                        column: column.name.clone(),
                        raw,
                    });
                }
            }

            DerivedRow {
                row_number,
                cells: cells.clone(),
                quantity: quantity.unwrap_or(FieldOutcome::Missing),
                price: price.unwrap_or(FieldOutcome::Missing),
                date: date.unwrap_or(FieldOutcome::Missing),
                product,
            }
        })
        .collect();
    DerivedTable {
        headers,
        rows,
        issues,
    }
}

fn role_cell<'a>(cells: &'a [CellValue], roles: &ColumnRoleMap, role: Role) -> Option<&'a CellValue> {
    roles.column_index(role).and_then(|idx| cells.get(idx))
}

pub fn coerce_number(cell: &CellValue) -> FieldOutcome<f64> {
    match cell {
        _ if cell.is_empty() => FieldOutcome::Missing,
        CellValue::Number(n) if n.is_finite() => FieldOutcome::Valid(*n),
        CellValue::Text(text) => match parse_number(text) {
            Some(n) => FieldOutcome::Valid(n),
            None => FieldOutcome::Invalid { raw: text.clone() },
        },
        other => FieldOutcome::Invalid {
            raw: other.as_display(),
        },
    }
}

pub fn coerce_date(cell: &CellValue) -> FieldOutcome<NaiveDate> {
    match cell {
        _ if cell.is_empty() => FieldOutcome::Missing,
        CellValue::DateTime(dt) => FieldOutcome::Valid(dt.date()),
        CellValue::Text(text) => match parse_date_like(text) {
            Some(dt) => FieldOutcome::Valid(dt.date()),
            None => FieldOutcome::Invalid { raw: text.clone() },
        },
        other => FieldOutcome::Invalid {
            raw: other.as_display(),
        },
    }
}

/// Revenue per product over the full product set, largest first.
pub fn product_aggregate(derived: &DerivedTable) -> AggregateTable {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for (row, revenue) in derived.revenue_rows() {
        if let Some(product) = row.product.as_deref() {
            *totals.entry(product).or_insert(0.0) += revenue;
        }
    }
    let rows = totals
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(key, value)| AggregateRow {
            key: key.to_string(),
            value,
        })
        .collect();
    AggregateTable {
        key_label: "Product".to_string(),
        value_label: REVENUE_COLUMN.to_string(),
        rows,
        display_limit: Some(PRODUCT_DISPLAY_LIMIT),
    }
}

/// Calendar month of a date, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: &NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Revenue summed per calendar month, with empty months between the first
/// and last observed month filled as zero.
pub fn monthly_series(derived: &DerivedTable) -> Vec<(YearMonth, f64)> {
    let mut buckets: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for (row, revenue) in derived.revenue_rows() {
        if let Some(date) = row.date.value() {
            *buckets.entry(YearMonth::of(date)).or_insert(0.0) += revenue;
        }
    }
    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };
    let mut series = Vec::with_capacity(buckets.len());
    let mut cursor = first;
    while cursor <= last {
        series.push((cursor, buckets.get(&cursor).copied().unwrap_or(0.0)));
        cursor = cursor.next();
    }
    series
}

pub fn monthly_aggregate(derived: &DerivedTable) -> AggregateTable {
    let rows = monthly_series(derived)
        .into_iter()
        .map(|(month, value)| AggregateRow {
            key: month.label(),
            value,
        })
        .collect();
    AggregateTable {
        key_label: "Month".to_string(),
        value_label: REVENUE_COLUMN.to_string(),
        rows,
        display_limit: None,
    }
}
