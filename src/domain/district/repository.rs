//! District repository interface

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{District, DistrictType, DistrictUpdate, NewDistrict};
use crate::domain::geo::Coordinate;
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// Sortable columns for district listings
pub const DISTRICT_ORDERING: &[&str] = &[
    "name",
    "city",
    "population",
    "area_km2",
    "avg_income",
    "created_at",
];

/// Query filters; every set field narrows the result
#[derive(Debug, Clone, Default)]
pub struct DistrictFilter {
    pub id: Option<i32>,
    pub city: Option<String>,
    pub district_type: Option<DistrictType>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on name
    pub name_contains: Option<String>,
    /// Case-insensitive match on name, code or city
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictStatistics {
    pub total: u64,
    pub active: u64,
    pub by_type: BTreeMap<String, u64>,
    pub total_population: i64,
    pub average_area_km2: f64,
    pub average_income: f64,
}

#[async_trait]
pub trait DistrictRepository: Send + Sync {
    async fn create(&self, district: NewDistrict) -> DomainResult<District>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<District>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<District>>;
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<District>>;
    async fn update(&self, id: i32, update: DistrictUpdate) -> DomainResult<District>;
    /// Stores keep their rows; their `district_id` is cleared.
    async fn delete(&self, id: i32) -> DomainResult<()>;

    async fn list(
        &self,
        filter: &DistrictFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<District>>;
    async fn find_all(&self, filter: &DistrictFilter) -> DomainResult<Vec<District>>;

    /// Active districts whose boundary bounding box contains `point`.
    /// Candidates still need an exact containment test.
    async fn find_boundary_candidates(&self, point: &Coordinate) -> DomainResult<Vec<District>>;

    async fn statistics(&self) -> DomainResult<DistrictStatistics>;
}
