//! Item repository interface

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{Item, ItemCategory, ItemUpdate, NewItem};
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// Sortable columns for item listings
pub const ITEM_ORDERING: &[&str] = &["name", "category", "brand", "created_at"];

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    /// Exact brand
    pub brand: Option<String>,
    pub brand_contains: Option<String>,
    pub name_contains: Option<String>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on name, description, brand or barcode
    pub search: Option<String>,
    /// Only items with at least one available inventory row
    pub available_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStatistics {
    pub total: u64,
    pub active: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_brand: BTreeMap<String, u64>,
    pub in_stock: u64,
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: NewItem) -> DomainResult<Item>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Item>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Item>>;
    async fn update(&self, id: i32, update: ItemUpdate) -> DomainResult<Item>;
    /// Removes the item's inventory rows too.
    async fn delete(&self, id: i32) -> DomainResult<()>;

    async fn list(
        &self,
        filter: &ItemFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Item>>;

    async fn statistics(&self) -> DomainResult<ItemStatistics>;
}
