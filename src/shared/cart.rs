//! Shopping cart types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::catalog::CatalogKind;
use crate::shared::error::SharedError;

/// Add an item or set its quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItemRequest {
    pub item_id: Uuid,
    pub kind: CatalogKind,
    pub quantity: i32,
}

impl CartItemRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.quantity < 1 {
            return Err(SharedError::validation("quantity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Identifies a cart entry to remove
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItemKey {
    pub item_id: Uuid,
    pub kind: CatalogKind,
}

/// Cart entry joined with the current catalog data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartEntry {
    pub id: i64,
    pub item_id: Uuid,
    pub kind: CatalogKind,
    pub name: String,
    pub brand: String,
    pub price_cents: i64,
    pub stock: i32,
    pub quantity: i32,
}
