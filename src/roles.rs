//! Column role detection from raw, noisy headers.
//!
//! Each role owns a fixed keyword list. A header matches when its trimmed,
//! lowercased form contains any keyword as a substring; the first matching
//! header in column order wins. Product detection is tiered: part-identifier
//! keywords are tried across all headers before the generic ones.

use std::fmt;

use serde::{Deserialize, Serialize};

const QUANTITY_KEYWORDS: &[&str] = &["qty", "quantity", "ship", "units"];
const PRICE_KEYWORDS: &[&str] = &["price", "cost", "amount"];
const DATE_KEYWORDS: &[&str] = &["date", "time", "day", "month"];
const PRODUCT_PART_KEYWORDS: &[&str] = &["part", "sku", "model"];
const PRODUCT_GENERIC_KEYWORDS: &[&str] = &["product", "item", "name"];
const ORDER_KEYWORDS: &[&str] = &["order", "po", "transaction"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Quantity,
    Price,
    Date,
    Product,
    Order,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Quantity,
        Role::Price,
        Role::Date,
        Role::Product,
        Role::Order,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Quantity => "quantity",
            Role::Price => "price",
            Role::Date => "date",
            Role::Product => "product",
            Role::Order => "order",
        }
    }

    /// Keyword tiers in priority order.
    fn keyword_tiers(&self) -> &'static [&'static [&'static str]] {
        match self {
            Role::Quantity => &[QUANTITY_KEYWORDS],
            Role::Price => &[PRICE_KEYWORDS],
            Role::Date => &[DATE_KEYWORDS],
            Role::Product => &[PRODUCT_PART_KEYWORDS, PRODUCT_GENERIC_KEYWORDS],
            Role::Order => &[ORDER_KEYWORDS],
        }
    }

    pub fn keywords(&self) -> Vec<&'static str> {
        self.keyword_tiers()
            .iter()
            .flat_map(|tier| tier.iter().copied())
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The header that was matched for a role, with its position in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    pub quantity: Option<ColumnMatch>,
    pub price: Option<ColumnMatch>,
    pub date: Option<ColumnMatch>,
    pub product: Option<ColumnMatch>,
    pub order: Option<ColumnMatch>,
}

impl ColumnRoleMap {
    pub fn get(&self, role: Role) -> Option<&ColumnMatch> {
        match role {
            Role::Quantity => self.quantity.as_ref(),
            Role::Price => self.price.as_ref(),
            Role::Date => self.date.as_ref(),
            Role::Product => self.product.as_ref(),
            Role::Order => self.order.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<ColumnMatch> {
        match role {
            Role::Quantity => &mut self.quantity,
            Role::Price => &mut self.price,
            Role::Date => &mut self.date,
            Role::Product => &mut self.product,
            Role::Order => &mut self.order,
        }
    }

    pub fn column_name(&self, role: Role) -> Option<&str> {
        self.get(role).map(|m| m.name.as_str())
    }

    pub fn column_index(&self, role: Role) -> Option<usize> {
        self.get(role).map(|m| m.index)
    }

    /// Roles the revenue computation cannot proceed without.
    pub fn missing_required(&self) -> Vec<Role> {
        [Role::Quantity, Role::Price]
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }

    /// Rows suitable for display: one `(role, column)` pair per role.
    pub fn render_rows(&self) -> Vec<Vec<String>> {
        Role::ALL
            .iter()
            .map(|role| {
                vec![
                    role.to_string(),
                    self.column_name(*role).unwrap_or("-").to_string(),
                ]
            })
            .collect()
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

pub fn classify<S: AsRef<str>>(headers: &[S]) -> ColumnRoleMap {
    let normalized = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect::<Vec<_>>();
    let mut roles = ColumnRoleMap::default();
    for role in Role::ALL {
        *roles.slot_mut(role) = match_role(role, &normalized).map(|index| ColumnMatch {
            index,
            name: headers[index].as_ref().to_string(),
        });
    }
    roles
}

fn match_role(role: Role, normalized: &[String]) -> Option<usize> {
    role.keyword_tiers().iter().find_map(|tier| {
        normalized
            .iter()
            .position(|header| tier.iter().any(|keyword| header.contains(keyword)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_legacy_layout() {
        let headers = [
            "Order Number",
            "Part Number",
            "Qty Shipped",
            "Product Type",
            "Pieces per Carton",
            "Date Ordered",
            "Price",
        ];
        let roles = classify(&headers);
        assert_eq!(roles.column_name(Role::Order), Some("Order Number"));
        assert_eq!(roles.column_name(Role::Product), Some("Part Number"));
        assert_eq!(roles.column_name(Role::Quantity), Some("Qty Shipped"));
        assert_eq!(roles.column_name(Role::Date), Some("Date Ordered"));
        assert_eq!(roles.column_name(Role::Price), Some("Price"));
    }

    #[test]
    fn part_keywords_outrank_earlier_generic_headers() {
        let roles = classify(&["Item Name", "Model"]);
        assert_eq!(roles.column_name(Role::Product), Some("Model"));
        let fallback = classify(&["Item Name", "Colour"]);
        assert_eq!(fallback.column_name(Role::Product), Some("Item Name"));
    }

    #[test]
    fn first_matching_header_wins() {
        let roles = classify(&["Unit Cost", "Price"]);
        assert_eq!(roles.column_index(Role::Price), Some(0));
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let roles = classify(&["  QTY  ", "PRICE\t"]);
        assert_eq!(roles.column_name(Role::Quantity), Some("  QTY  "));
        assert_eq!(roles.column_name(Role::Price), Some("PRICE\t"));
        assert!(roles.missing_required().is_empty());
    }

    #[test]
    fn unmatched_roles_are_absent() {
        let roles = classify(&["colour", "weight"]);
        assert_eq!(roles, ColumnRoleMap::default());
        assert_eq!(roles.missing_required(), vec![Role::Quantity, Role::Price]);
    }
}
