//! # Catalog Lookups
//!
//! Read-only collaborators consulted while a BOM is edited:
//!
//! - [`ProductCatalog`]: product code → spec fields, used to prefill the spec step.
//! - [`StockCatalog`]: stock item name/code → unit of measure, used when a raw
//!   material is picked on a material line.
//!
//! Product catalogs in the field disagree on column names (`totalLength` vs
//! `length`, `conductorSize` vs `copper`, ...). [`spec_from_entry`] accepts
//! any alias listed in [`SpecField::aliases`] and takes the first one that is
//! populated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{BomError, BomResult};
use crate::product::{lenient::value_to_text, ProductSpec, SpecField};

/// Product master lookup by product code.
pub trait ProductCatalog {
    fn lookup(&self, product_code: &str) -> Option<ProductSpec>;
}

/// Stock master lookup by item name or code.
pub trait StockCatalog {
    fn unit_for(&self, item: &str) -> Option<String>;
}

/// Build a spec from a catalog entry, tolerating field aliases and
/// numbers stored as JSON numbers.
pub fn spec_from_entry(entry: &Map<String, Value>) -> ProductSpec {
    let mut spec = ProductSpec::default();
    for field in SpecField::ALL {
        let value = field
            .aliases()
            .iter()
            .filter_map(|alias| entry.get(*alias))
            .map(value_to_text)
            .find(|text| !text.trim().is_empty());
        if let Some(value) = value {
            spec.set(field, value);
        }
    }
    spec
}

/// In-memory product catalog keyed by product code (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct MemoryProductCatalog {
    entries: HashMap<String, ProductSpec>,
}

impl MemoryProductCatalog {
    pub fn new() -> Self {
        MemoryProductCatalog::default()
    }

    /// Add one catalog entry given as a JSON object.
    pub fn insert_entry(&mut self, entry: &Value) -> BomResult<()> {
        let map = entry.as_object().ok_or_else(|| {
            BomError::invalid_input("product catalog entry", entry.to_string(), "Expected a JSON object")
        })?;
        let spec = spec_from_entry(map);
        if spec.product_code.trim().is_empty() {
            return Err(BomError::invalid_input(
                "productCode",
                "",
                "Catalog entry has no product code",
            ));
        }
        self.entries.insert(spec.product_code.trim().to_lowercase(), spec);
        Ok(())
    }

    /// Load a JSON array of catalog entries.
    pub fn from_json(json: &str) -> BomResult<Self> {
        let entries: Vec<Value> = serde_json::from_str(json)?;
        let mut catalog = MemoryProductCatalog::new();
        for entry in &entries {
            catalog.insert_entry(entry)?;
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProductCatalog for MemoryProductCatalog {
    fn lookup(&self, product_code: &str) -> Option<ProductSpec> {
        self.entries.get(&product_code.trim().to_lowercase()).cloned()
    }
}

/// One stock master entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(rename = "itemName")]
    pub item_name: String,
    #[serde(rename = "itemCode", default)]
    pub item_code: String,
    pub unit: String,
}

impl StockItem {
    pub fn new(item_name: impl Into<String>, item_code: impl Into<String>, unit: impl Into<String>) -> Self {
        StockItem {
            item_name: item_name.into(),
            item_code: item_code.into(),
            unit: unit.into(),
        }
    }

    fn matches(&self, item: &str) -> bool {
        let item = item.trim();
        self.item_name.trim().eq_ignore_ascii_case(item)
            || (!self.item_code.trim().is_empty() && self.item_code.trim().eq_ignore_ascii_case(item))
    }
}

/// In-memory stock catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStockCatalog {
    items: Vec<StockItem>,
}

impl MemoryStockCatalog {
    pub fn new(items: Vec<StockItem>) -> Self {
        MemoryStockCatalog { items }
    }

    pub fn items(&self) -> &[StockItem] {
        &self.items
    }
}

impl StockCatalog for MemoryStockCatalog {
    fn unit_for(&self, item: &str) -> Option<String> {
        if item.trim().is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|stock| stock.matches(item))
            .map(|stock| stock.unit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_from_aliased_entry() {
        let entry = json!({
            "productCode": "PC-3C-0.5",
            "description": "3 core flexible cable",
            "totalLength": 150,
            "length": "",
            "conductorSize": "0.5",
            "noOfStrands": 7,
            "cores": "3",
            "coreOd": 3.0
        });
        let spec = spec_from_entry(entry.as_object().unwrap());
        assert_eq!(spec.product_description, "3 core flexible cable");
        assert_eq!(spec.length, "150");
        assert_eq!(spec.copper, "0.5");
        assert_eq!(spec.strands, "7");
        assert_eq!(spec.no_of_cores, "3");
        assert_eq!(spec.core_od, "3.0");
    }

    #[test]
    fn test_stored_name_preferred_when_populated() {
        let entry = json!({"productCode": "X", "length": "120", "totalLength": "999"});
        let spec = spec_from_entry(entry.as_object().unwrap());
        assert_eq!(spec.length, "120");
    }

    #[test]
    fn test_product_catalog_lookup() {
        let catalog = MemoryProductCatalog::from_json(
            r#"[{"productCode":"PC-1","length":100},{"code":"PC-2","totalLength":50}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("pc-2").unwrap().length, "50");
        assert!(catalog.lookup("PC-9").is_none());
    }

    #[test]
    fn test_product_entry_requires_code() {
        let mut catalog = MemoryProductCatalog::new();
        assert!(catalog.insert_entry(&json!({"length": 10})).is_err());
        assert!(catalog.insert_entry(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_stock_unit_lookup() {
        let stock = MemoryStockCatalog::new(vec![
            StockItem::new("Copper Wire", "RM-001", "kg"),
            StockItem::new("Plug Pin", "", "nos"),
        ]);
        assert_eq!(stock.unit_for("copper wire"), Some("kg".to_string()));
        assert_eq!(stock.unit_for("RM-001"), Some("kg".to_string()));
        assert_eq!(stock.unit_for("Plug Pin"), Some("nos".to_string()));
        assert_eq!(stock.unit_for(""), None);
        assert_eq!(stock.unit_for("Unknown"), None);
    }
}
