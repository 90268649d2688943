//! Inventory aggregate
//!
//! Links stores to the items they carry.

pub mod model;
pub mod repository;

pub use model::{Inventory, InventoryRecord, InventoryUpdate, NewInventory};
pub use repository::{
    InventoryFilter, InventoryRepository, InventoryStatistics, ItemStoreCounts,
    INVENTORY_ORDERING,
};
