//! Catalog use-cases: districts, stores, items, inventory and the spatial
//! queries that join them.
//!
//! Services return *views*: domain entities plus the derived figures the
//! API shows next to them (store counts, district summaries, distances).

pub mod districts;
pub mod inventory;
pub mod items;
pub mod spatial;
pub mod stores;

pub use districts::{DistrictDensity, DistrictSearch, DistrictService};
pub use inventory::{InventorySearch, InventoryService};
pub use items::ItemService;
pub use spatial::{SpatialOverview, SpatialService};
pub use stores::{StoreSearch, StoreService};

use std::collections::BTreeMap;

use crate::domain::district::District;
use crate::domain::geo::{km_to_m, Coordinate};
use crate::domain::inventory::InventoryRecord;
use crate::domain::item::Item;
use crate::domain::store::{Store, StoreFilter, STORE_ORDERING};
use crate::domain::{DistrictType, DomainError, DomainResult, RepositoryProvider};
use crate::shared::SortSpec;

/// Radius bounds for distance searches, kilometres
pub const MIN_RADIUS_KM: f64 = 0.1;
pub const MAX_RADIUS_KM: f64 = 100.0;

/// Short district reference embedded in store views
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictSummary {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub district_type: DistrictType,
}

impl From<&District> for DistrictSummary {
    fn from(d: &District) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            code: d.code.clone(),
            district_type: d.district_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistrictView {
    pub district: District,
    pub store_count: u64,
}

#[derive(Debug, Clone)]
pub struct StoreView {
    pub store: Store,
    pub district: Option<DistrictSummary>,
    pub inventory_count: u64,
    /// Metres from the query's reference point
    pub distance_m: Option<f64>,
}

impl StoreView {
    /// Linked district name, falling back to the free-text one.
    pub fn district_name(&self) -> Option<&str> {
        self.district
            .as_ref()
            .map(|d| d.name.as_str())
            .or(self.store.district.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: Item,
    pub store_count: u64,
    pub available_stores: u64,
}

#[derive(Debug, Clone)]
pub struct InventoryView {
    pub record: InventoryRecord,
    pub distance_m: Option<f64>,
}

/// Validate a search radius and convert it to metres.
pub fn radius_m(radius_km: f64) -> DomainResult<f64> {
    if !radius_km.is_finite() || !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        return Err(DomainError::Validation(format!(
            "radius_km must be between {} and {}",
            MIN_RADIUS_KM, MAX_RADIUS_KM
        )));
    }
    Ok(km_to_m(radius_km))
}

fn by_name() -> SortSpec<'static> {
    SortSpec::parse(None, STORE_ORDERING, "name")
}

/// Attach district summaries, inventory counts and distances to stores.
pub(crate) async fn enrich_stores(
    repos: &dyn RepositoryProvider,
    stores: Vec<Store>,
    reference: Option<&Coordinate>,
) -> DomainResult<Vec<StoreView>> {
    let store_ids: Vec<i32> = stores.iter().map(|s| s.id).collect();
    let mut district_ids: Vec<i32> = stores.iter().filter_map(|s| s.district_id).collect();
    district_ids.sort_unstable();
    district_ids.dedup();

    let districts: BTreeMap<i32, DistrictSummary> = repos
        .districts()
        .find_by_ids(&district_ids)
        .await?
        .iter()
        .map(|d| (d.id, DistrictSummary::from(d)))
        .collect();
    let counts = repos.inventory().count_by_store_ids(&store_ids).await?;

    Ok(stores
        .into_iter()
        .map(|store| StoreView {
            district: store.district_id.and_then(|id| districts.get(&id).cloned()),
            inventory_count: counts.get(&store.id).copied().unwrap_or(0),
            distance_m: reference.and_then(|p| store.distance_to(p)),
            store,
        })
        .collect())
}

pub(crate) async fn enrich_store(
    repos: &dyn RepositoryProvider,
    store: Store,
) -> DomainResult<StoreView> {
    enrich_stores(repos, vec![store], None)
        .await?
        .pop()
        .ok_or_else(|| DomainError::Database("store view lost during enrichment".into()))
}

/// Stores belonging to a district: by containment when it has a boundary,
/// otherwise by foreign key.
pub(crate) async fn stores_in(
    repos: &dyn RepositoryProvider,
    district: &District,
) -> DomainResult<Vec<Store>> {
    let Some(boundary) = &district.boundary else {
        return repos.stores().find_by_district_id(district.id).await;
    };

    let filter = StoreFilter {
        within: Some(boundary.bounding_box()),
        located_only: true,
        ..Default::default()
    };
    let candidates = repos.stores().find_all(&filter, by_name()).await?;
    Ok(candidates
        .into_iter()
        .filter(|s| s.location.is_some_and(|p| boundary.contains(&p)))
        .collect())
}

/// `store_count` for each district, using the same rule as [`stores_in`].
pub(crate) async fn district_store_counts(
    repos: &dyn RepositoryProvider,
    districts: &[District],
) -> DomainResult<BTreeMap<i32, u64>> {
    let without_boundary: Vec<i32> = districts
        .iter()
        .filter(|d| d.boundary.is_none())
        .map(|d| d.id)
        .collect();
    let mut counts = repos.stores().count_by_district_ids(&without_boundary).await?;

    for district in districts.iter().filter(|d| d.boundary.is_some()) {
        let n = stores_in(repos, district).await?.len() as u64;
        counts.insert(district.id, n);
    }
    Ok(counts)
}

pub(crate) async fn district_views(
    repos: &dyn RepositoryProvider,
    districts: Vec<District>,
) -> DomainResult<Vec<DistrictView>> {
    let counts = district_store_counts(repos, &districts).await?;
    Ok(districts
        .into_iter()
        .map(|district| DistrictView {
            store_count: counts.get(&district.id).copied().unwrap_or(0),
            district,
        })
        .collect())
}

/// The active district whose boundary contains `point`.
pub(crate) async fn containing_district(
    repos: &dyn RepositoryProvider,
    point: &Coordinate,
) -> DomainResult<Option<District>> {
    let candidates = repos.districts().find_boundary_candidates(point).await?;
    Ok(candidates.into_iter().find(|d| d.contains(point)))
}

/// Order by distance; entries without one go last, ties by id.
pub(crate) fn sort_by_distance<T>(items: &mut [T], key: impl Fn(&T) -> (Option<f64>, i32)) {
    items.sort_by(|a, b| {
        let (da, ia) = key(a);
        let (db, ib) = key(b);
        match (da, db) {
            (Some(x), Some(y)) => x.total_cmp(&y).then(ia.cmp(&ib)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ia.cmp(&ib),
        }
    });
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared seed data for catalog service tests.

    use std::sync::Arc;

    use crate::domain::district::NewDistrict;
    use crate::domain::geo::{Boundary, Coordinate};
    use crate::domain::item::{ItemCategory, NewItem};
    use crate::domain::store::{NewStore, StoreType};
    use crate::domain::{DistrictType, RepositoryProvider};
    use crate::infrastructure::database::testing::memory_db;
    use crate::infrastructure::SeaOrmRepositoryProvider;

    pub async fn repos() -> Arc<dyn RepositoryProvider> {
        Arc::new(SeaOrmRepositoryProvider::new(memory_db().await))
    }

    /// Axis-aligned square, `size` degrees wide.
    pub fn square(min_lng: f64, min_lat: f64, size: f64) -> Boundary {
        let geojson = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[
                [min_lng, min_lat],
                [min_lng + size, min_lat],
                [min_lng + size, min_lat + size],
                [min_lng, min_lat + size],
                [min_lng, min_lat]
            ]]
        });
        Boundary::from_geojson(&geojson).unwrap()
    }

    pub fn district(name: &str, code: &str, boundary: Option<Boundary>) -> NewDistrict {
        NewDistrict {
            name: name.into(),
            code: code.into(),
            boundary,
            city: None,
            population: Some(100_000),
            area_km2: Some(5.0),
            district_type: DistrictType::Urban,
            avg_income: None,
            is_active: true,
        }
    }

    pub fn store(name: &str, lat: f64, lng: f64) -> NewStore {
        NewStore {
            name: name.into(),
            address: format!("{name} street"),
            phone: None,
            email: None,
            location: Some(Coordinate::new(lat, lng).unwrap()),
            store_type: StoreType::detect_from_name(name),
            district: None,
            district_id: None,
            city: None,
            opening_hours: None,
            is_active: true,
            rating: Some(4.0),
        }
    }

    pub fn item(name: &str, category: ItemCategory) -> NewItem {
        NewItem {
            name: name.into(),
            description: None,
            category,
            brand: None,
            barcode: None,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_bounds_are_inclusive() {
        assert_eq!(radius_m(0.1).unwrap(), 100.0);
        assert_eq!(radius_m(100.0).unwrap(), 100_000.0);
        assert!(radius_m(0.05).is_err());
        assert!(radius_m(100.5).is_err());
        assert!(radius_m(f64::NAN).is_err());
    }

    #[test]
    fn distance_sort_puts_unknown_last() {
        let mut rows = vec![(Some(5.0), 1), (None, 2), (Some(1.0), 3), (None, 0)];
        sort_by_distance(&mut rows, |r| (r.0, r.1));
        assert_eq!(
            rows,
            vec![(Some(1.0), 3), (Some(5.0), 1), (None, 0), (None, 2)]
        );
    }
}
