//! Inventory domain entity

use chrono::{DateTime, Utc};

use crate::domain::item::Item;
use crate::domain::store::Store;

/// Availability of one item at one store. `(store_id, item_id)` is unique.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub id: i32,
    pub store_id: i32,
    pub item_id: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    pub fn stock_status(&self) -> &'static str {
        if self.is_available {
            "available"
        } else {
            "unavailable"
        }
    }
}

/// Inventory row with its store and item loaded
#[derive(Debug, Clone)]
pub struct InventoryRecord {
    pub inventory: Inventory,
    pub store: Store,
    pub item: Item,
}

#[derive(Debug, Clone)]
pub struct NewInventory {
    pub store_id: i32,
    pub item_id: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryUpdate {
    pub store_id: Option<i32>,
    pub item_id: Option<i32>,
    pub is_available: Option<bool>,
}
