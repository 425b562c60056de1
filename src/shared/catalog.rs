//! Catalog Data Structures
//!
//! The platform sells from two independent catalogs: finished coffee
//! products and coffee supplies. Both share the same shape and each item
//! carries its own stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Which catalog table an item lives in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Finished products (roasted coffee, blends, ...)
    #[serde(alias = "products")]
    Product,
    /// Supplies (equipment, filters, ...)
    #[serde(alias = "supplies")]
    Supply,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Supply => "supply",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "product" | "products" => Some(CatalogKind::Product),
            "supply" | "supplies" => Some(CatalogKind::Supply),
            _ => None,
        }
    }

    /// Table holding items of this kind
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Product => "products",
            CatalogKind::Supply => "supplies",
        }
    }

    /// Foreign-key column referencing this kind in `order_items` and `cart_items`
    pub fn reference_column(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product_id",
            CatalogKind::Supply => "supply_id",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog item as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub kind: CatalogKind,
    pub supplier_id: Uuid,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    /// Unit price in cents
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields a supplier provides when creating or replacing an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItemInput {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
}

impl CatalogItemInput {
    pub fn validate(&self) -> Result<(), SharedError> {
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("brand", &self.brand),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(SharedError::validation(field, "must not be empty"));
            }
        }
        if self.price_cents < 0 {
            return Err(SharedError::validation("price_cents", "must not be negative"));
        }
        if self.stock < 0 {
            return Err(SharedError::validation("stock", "must not be negative"));
        }
        Ok(())
    }
}

/// Body of a stock correction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockUpdate {
    pub stock: i32,
}

impl StockUpdate {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.stock < 0 {
            return Err(SharedError::validation("stock", "must not be negative"));
        }
        Ok(())
    }
}
