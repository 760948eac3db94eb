//! Menu Entities
//!
//! The menu is a three level tree: categories own subcategories and direct
//! items, subcategories own items. Persisted rows carry durable ids; the
//! `*Input` types mirror what the admin UI submits, where ids may still be
//! client-generated temporary ids.

use serde::{Deserialize, Deserializer, Serialize};
use super::entity::{DomainError, DomainResult};

pub const DEFAULT_BG_COLOR: &str = "#000000";
pub const DEFAULT_BADGE_TEXT: &str = "Special";

/// Level of a node in the menu tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Category,
    Subcategory,
    Item,
}

impl NodeKind {
    /// Prefix the admin UI puts in front of ids it generates locally
    pub fn temp_prefix(&self) -> &'static str {
        match self {
            NodeKind::Category => "cat-",
            NodeKind::Subcategory => "sub-",
            NodeKind::Item => "item-",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            NodeKind::Category => "categories",
            NodeKind::Subcategory => "subcategories",
            NodeKind::Item => "items",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Category => "category",
            NodeKind::Subcategory => "subcategory",
            NodeKind::Item => "item",
        }
    }
}

/// A persisted menu category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_special: bool,
    /// Background color (hex, e.g., "#ffe08a")
    pub bg_color: String,
    /// Badge shown on special categories
    pub badge_text: String,
    pub order_index: i32,
}

/// A persisted subcategory, always owned by one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub order_index: i32,
}

/// A persisted menu item
///
/// `subcategory_id` is None for items listed directly under their category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub unit: String,
    pub info: String,
    pub allergens: String,
    pub order_index: i32,
}

/// Category with its children, as returned by the menu read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<SubcategoryNode>,
    /// Direct items (no subcategory)
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryNode {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    pub items: Vec<MenuItem>,
}

// ========================
// Submitted tree
// ========================

/// An id as submitted: a durable number, a numeric string, or a temporary id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    /// An empty or whitespace string, which the admin UI sends for "no id"
    pub fn is_blank(&self) -> bool {
        matches!(self, RawId::Text(s) if s.trim().is_empty())
    }

    /// Stable textual key, used to match item -> subcategory references
    pub fn key(&self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Float(f) => f.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        }
    }
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A submitted price: a JSON number or a numeric string ("8.5", "8,50")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    pub fn amount(&self) -> DomainResult<f64> {
        let value = match self {
            RawPrice::Number(n) => *n,
            RawPrice::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| DomainError::validation(format!("invalid price '{}'", s)))?,
        };
        if !value.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        Ok(round_price(value))
    }
}

/// Round to cents
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub id: Option<RawId>,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_special: bool,
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub badge_text: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryInput>,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcategoryInput {
    #[serde(default)]
    pub id: Option<RawId>,
    pub name: String,
    /// Items nested directly in the subcategory (shape of the menu read)
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub id: Option<RawId>,
    pub name: String,
    pub price: RawPrice,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub allergens: Option<String>,
    /// Links a category-level item to one of its sibling subcategories
    #[serde(default)]
    pub subcategory_id: Option<RawId>,
}

/// Accepts `true`/`false`, `0`/`1` and their string forms
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Number(n) => Ok(n.as_f64().map(|v| v != 0.0).unwrap_or(false)),
        serde_json::Value::String(s) => match s.trim() {
            "1" | "true" => Ok(true),
            "" | "0" | "false" => Ok(false),
            other => Err(D::Error::custom(format!("invalid flag '{}'", other))),
        },
        other => Err(D::Error::custom(format!("invalid flag {}", other))),
    }
}

/// Parse a full-menu submission; the top level must be an array
pub fn parse_menu_payload(body: &[u8]) -> DomainResult<Vec<CategoryInput>> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| DomainError::validation(format!("malformed JSON: {}", e)))?;
    if !value.is_array() {
        return Err(DomainError::validation(
            "menu payload must be a JSON array of categories",
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse a single-category submission; the top level must be an object
pub fn parse_category_payload(body: &[u8]) -> DomainResult<CategoryInput> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| DomainError::validation(format!("malformed JSON: {}", e)))?;
    if !value.is_object() {
        return Err(DomainError::validation("category payload must be a JSON object"));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_menu_payload(br#"{"name": "Cocktails"}"#).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_parse_minimal_tree() {
        let body = br#"[{"name": "Cocktails", "items": [{"name": "Mojito", "price": 8.5, "unit": "0.3l"}]}]"#;
        let cats = parse_menu_payload(body).unwrap();
        assert_eq!(cats.len(), 1);
        assert!(cats[0].id.is_none());
        assert!(!cats[0].is_special);
        assert_eq!(cats[0].items[0].price.amount().unwrap(), 8.5);
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let body = br#"[{"id": 4, "name": "A"}, {"id": "cat-17", "name": "B"}, {"id": "12", "name": "C"}]"#;
        let cats = parse_menu_payload(body).unwrap();
        assert_eq!(cats[0].id, Some(RawId::Int(4)));
        assert_eq!(cats[1].id, Some(RawId::Text("cat-17".to_string())));
        assert_eq!(cats[2].id.as_ref().unwrap().key(), "12");
    }

    #[test]
    fn test_legacy_flags() {
        let body = br#"[{"name": "A", "is_special": 1}, {"name": "B", "is_special": "0"}]"#;
        let cats = parse_menu_payload(body).unwrap();
        assert!(cats[0].is_special);
        assert!(!cats[1].is_special);
    }

    #[test]
    fn test_price_strings() {
        assert_eq!(RawPrice::Text("9,50".to_string()).amount().unwrap(), 9.5);
        assert_eq!(RawPrice::Number(3.456).amount().unwrap(), 3.46);
        assert!(RawPrice::Text("free".to_string()).amount().is_err());
    }

    #[test]
    fn test_temp_prefixes_are_distinct() {
        assert_eq!(NodeKind::Category.temp_prefix(), "cat-");
        assert_eq!(NodeKind::Subcategory.temp_prefix(), "sub-");
        assert_eq!(NodeKind::Item.temp_prefix(), "item-");
    }
}
