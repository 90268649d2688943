//! Store repository interface

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{NewStore, Store, StoreType, StoreUpdate};
use crate::domain::geo::BoundingBox;
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// Sortable columns for store listings
pub const STORE_ORDERING: &[&str] = &["name", "city", "rating", "created_at"];

/// Label used for stores with no district in statistics
pub const UNASSIGNED_DISTRICT: &str = "Unassigned";

/// How a `district` query parameter narrows stores
#[derive(Debug, Clone, PartialEq)]
pub enum DistrictMatch {
    /// Exact foreign key
    Id(i32),
    /// Exact free-text district name
    Name(String),
    /// Contains-match on the linked district's name or the free-text name
    NameContains(String),
}

#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub store_type: Option<StoreType>,
    pub city: Option<String>,
    pub district: Option<DistrictMatch>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on name, address or city
    pub search: Option<String>,
    /// Also match `search` against the linked district name
    pub search_district_name: bool,
    /// Only stores with an available inventory row whose item name contains this
    pub inventory_item: Option<String>,
    /// Only stores with a location inside this box
    pub within: Option<BoundingBox>,
    pub located_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStatistics {
    pub total: u64,
    pub active: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_district: BTreeMap<String, u64>,
    pub average_rating: f64,
    pub total_inventory: u64,
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn create(&self, store: NewStore) -> DomainResult<Store>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Store>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Store>>;
    async fn update(&self, id: i32, update: StoreUpdate) -> DomainResult<Store>;
    /// Removes the store's inventory rows too.
    async fn delete(&self, id: i32) -> DomainResult<()>;

    async fn list(
        &self,
        filter: &StoreFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Store>>;
    /// Unpaginated, for in-process distance filtering.
    async fn find_all(&self, filter: &StoreFilter, sort: SortSpec<'_>) -> DomainResult<Vec<Store>>;
    async fn find_by_district_id(&self, district_id: i32) -> DomainResult<Vec<Store>>;
    async fn count_by_district_ids(&self, ids: &[i32]) -> DomainResult<BTreeMap<i32, u64>>;

    async fn statistics(&self) -> DomainResult<StoreStatistics>;
}
