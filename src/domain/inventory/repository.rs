//! Inventory repository interface

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{Inventory, InventoryRecord, InventoryUpdate, NewInventory};
use crate::domain::geo::BoundingBox;
use crate::domain::item::ItemCategory;
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// Sortable columns for inventory listings
pub const INVENTORY_ORDERING: &[&str] = &["item_name", "created_at"];

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub store_id: Option<i32>,
    pub item_id: Option<i32>,
    pub category: Option<ItemCategory>,
    pub is_available: Option<bool>,
    pub item_name_contains: Option<String>,
    /// Case-insensitive match on item name, store name or item brand
    pub search: Option<String>,
    /// Only rows whose store location lies inside this box
    pub store_within: Option<BoundingBox>,
}

/// Per-item counts of stocking stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStoreCounts {
    pub stores: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryStatistics {
    pub total: u64,
    pub available: u64,
    pub unavailable: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_store: BTreeMap<String, u64>,
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Conflict when the store already lists the item.
    async fn create(&self, inventory: NewInventory) -> DomainResult<Inventory>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<InventoryRecord>>;
    async fn update(&self, id: i32, update: InventoryUpdate) -> DomainResult<Inventory>;
    async fn delete(&self, id: i32) -> DomainResult<()>;

    async fn list(
        &self,
        filter: &InventoryFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<InventoryRecord>>;
    async fn find_all(&self, filter: &InventoryFilter) -> DomainResult<Vec<InventoryRecord>>;

    async fn count_by_store_ids(&self, store_ids: &[i32]) -> DomainResult<BTreeMap<i32, u64>>;
    async fn store_counts_by_item_ids(
        &self,
        item_ids: &[i32],
    ) -> DomainResult<BTreeMap<i32, ItemStoreCounts>>;
    async fn store_ids_for_item(&self, item_id: i32) -> DomainResult<Vec<i32>>;
    /// Sorted, distinct names of items available somewhere.
    async fn available_item_names(&self) -> DomainResult<Vec<String>>;

    async fn statistics(&self) -> DomainResult<InventoryStatistics>;
}
