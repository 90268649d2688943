//! Store use-cases, including distance search

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    by_name, containing_district, enrich_store, enrich_stores, radius_m, sort_by_distance,
    StoreView,
};
use crate::domain::geo::{BoundingBox, Coordinate};
use crate::domain::inventory::{InventoryFilter, INVENTORY_ORDERING};
use crate::domain::store::{
    NewStore, Store, StoreFilter, StoreStatistics, StoreType, StoreUpdate, STORE_ORDERING,
};
use crate::domain::{DomainError, DomainResult, InventoryRecord, RepositoryProvider};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// Default and maximum result size for nearest-store queries
pub const DEFAULT_NEAREST_LIMIT: u32 = 10;
pub const MAX_NEAREST_LIMIT: u32 = 100;

/// Advanced store search
#[derive(Debug, Clone, Default)]
pub struct StoreSearch {
    pub filter: StoreFilter,
    /// Point distances are measured from
    pub reference: Option<Coordinate>,
    pub radius_km: Option<f64>,
    pub sort_by_distance: bool,
}

pub struct StoreService {
    repos: Arc<dyn RepositoryProvider>,
}

impl StoreService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Check an explicit `district_id`, or derive one from the location.
    ///
    /// Returns the district id to store and, when the district was derived,
    /// its name for the free-text field.
    async fn resolve_district(
        &self,
        district_id: Option<i32>,
        location: Option<&Coordinate>,
    ) -> DomainResult<(Option<i32>, Option<String>)> {
        if let Some(id) = district_id {
            if self.repos.districts().find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!(
                    "District with id {} does not exist",
                    id
                )));
            }
            return Ok((Some(id), None));
        }
        let Some(point) = location else {
            return Ok((None, None));
        };
        match containing_district(self.repos.as_ref(), point).await? {
            Some(district) => {
                debug!(district_id = district.id, "Store assigned to district by location");
                Ok((Some(district.id), Some(district.name)))
            }
            None => Ok((None, None)),
        }
    }

    pub async fn create(&self, mut new: NewStore) -> DomainResult<StoreView> {
        new.validate()?;
        let (district_id, derived_name) = self
            .resolve_district(new.district_id, new.location.as_ref())
            .await?;
        new.district_id = district_id;
        if new.district.as_deref().map_or(true, str::is_empty) {
            new.district = derived_name.or(new.district);
        }

        let store = self.repos.stores().create(new).await?;
        info!(store_id = store.id, name = %store.name, store_type = %store.store_type, "Store created");
        enrich_store(self.repos.as_ref(), store).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<StoreView> {
        let store = self.find(id).await?;
        enrich_store(self.repos.as_ref(), store).await
    }

    async fn find(&self, id: i32) -> DomainResult<Store> {
        self.repos
            .stores()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Store", id))
    }

    pub async fn update(&self, id: i32, mut update: StoreUpdate) -> DomainResult<StoreView> {
        update.validate()?;
        self.find(id).await?;

        if update.district_id.is_some() {
            self.resolve_district(update.district_id, None).await?;
        } else if let Some(location) = update.location.as_ref() {
            // A move re-derives both district fields from the new point
            let (district_id, derived_name) = self.resolve_district(None, Some(location)).await?;
            match district_id {
                Some(id) => {
                    update.district_id = Some(id);
                    if update.district.is_none() {
                        update.district = derived_name;
                    }
                }
                None => update.clear_district = true,
            }
        }

        let store = self.repos.stores().update(id, update).await?;
        info!(store_id = id, "Store updated");
        enrich_store(self.repos.as_ref(), store).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos.stores().delete(id).await?;
        info!(store_id = id, "Store deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &StoreFilter,
        ordering: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<StoreView>> {
        let sort = SortSpec::parse(ordering, STORE_ORDERING, "name");
        let result = self.repos.stores().list(filter, sort, page).await?;
        let views = enrich_stores(self.repos.as_ref(), result.items, None).await?;
        Ok(PaginatedResult::new(views, result.total, result.page, result.limit))
    }

    /// Filtered search with optional distance annotation, radius cut-off and
    /// distance ordering.
    pub async fn search(
        &self,
        search: StoreSearch,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<StoreView>> {
        let StoreSearch {
            mut filter,
            reference,
            radius_km,
            sort_by_distance: by_distance,
        } = search;

        let Some(point) = reference else {
            if radius_km.is_some() {
                return Err(DomainError::Validation(
                    "radius_km requires latitude and longitude".into(),
                ));
            }
            return self.list(&filter, None, page).await;
        };

        let max_m = radius_km.map(radius_m).transpose()?;
        if let Some(max_m) = max_m {
            filter.within = Some(BoundingBox::around(&point, max_m));
        }

        let mut stores: Vec<(Store, Option<f64>)> = self
            .repos
            .stores()
            .find_all(&filter, by_name())
            .await?
            .into_iter()
            .map(|s| {
                let d = s.distance_to(&point);
                (s, d)
            })
            .filter(|(_, d)| match (max_m, d) {
                (Some(max), Some(d)) => *d <= max,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();
        if by_distance {
            sort_by_distance(&mut stores, |(s, d)| (*d, s.id));
        }

        let window = PaginatedResult::from_vec(stores, page);
        let items = window.items.into_iter().map(|(s, _)| s).collect();
        let views = enrich_stores(self.repos.as_ref(), items, Some(&point)).await?;
        Ok(PaginatedResult::new(views, window.total, window.page, window.limit))
    }

    /// Closest active stores to `point`.
    pub async fn nearest(
        &self,
        point: &Coordinate,
        limit: Option<u32>,
        store_type: Option<StoreType>,
    ) -> DomainResult<Vec<StoreView>> {
        let limit = limit.unwrap_or(DEFAULT_NEAREST_LIMIT).clamp(1, MAX_NEAREST_LIMIT) as usize;
        let filter = StoreFilter {
            store_type,
            is_active: Some(true),
            located_only: true,
            ..Default::default()
        };
        let mut stores = self.repos.stores().find_all(&filter, by_name()).await?;
        sort_by_distance(&mut stores, |s| (s.distance_to(point), s.id));
        stores.truncate(limit);
        enrich_stores(self.repos.as_ref(), stores, Some(point)).await
    }

    /// Active stores within `radius_km` of `point`, closest first.
    pub async fn within_radius(
        &self,
        point: &Coordinate,
        radius_km: f64,
        store_type: Option<StoreType>,
    ) -> DomainResult<Vec<StoreView>> {
        let max_m = radius_m(radius_km)?;
        let filter = StoreFilter {
            store_type,
            is_active: Some(true),
            within: Some(BoundingBox::around(point, max_m)),
            located_only: true,
            ..Default::default()
        };
        let mut stores: Vec<Store> = self
            .repos
            .stores()
            .find_all(&filter, by_name())
            .await?
            .into_iter()
            .filter(|s| s.distance_to(point).is_some_and(|d| d <= max_m))
            .collect();
        sort_by_distance(&mut stores, |s| (s.distance_to(point), s.id));
        enrich_stores(self.repos.as_ref(), stores, Some(point)).await
    }

    pub async fn statistics(&self) -> DomainResult<StoreStatistics> {
        self.repos.stores().statistics().await
    }

    /// Inventory of one store.
    pub async fn inventory(
        &self,
        id: i32,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<InventoryRecord>> {
        self.find(id).await?;
        let filter = InventoryFilter {
            store_id: Some(id),
            ..Default::default()
        };
        let sort = SortSpec::parse(None, INVENTORY_ORDERING, "item_name");
        self.repos.inventory().list(&filter, sort, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures::{district, item, repos, square, store};
    use crate::domain::inventory::NewInventory;
    use crate::domain::item::ItemCategory;
    use crate::domain::store::DistrictMatch;

    const BEN_THANH: (f64, f64) = (10.7725, 106.6980);

    fn ben_thanh() -> Coordinate {
        Coordinate::new(BEN_THANH.0, BEN_THANH.1).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_district_by_location() {
        let repos = repos().await;
        let d1 = repos
            .districts()
            .create(district("Quận 1", "Q1", Some(square(106.69, 10.76, 0.02))))
            .await
            .unwrap();
        let svc = StoreService::new(repos);

        let view = svc.create(store("Circle K Lê Lợi", 10.7725, 106.6980)).await.unwrap();
        assert_eq!(view.store.district_id, Some(d1.id));
        assert_eq!(view.store.district.as_deref(), Some("Quận 1"));
        assert_eq!(view.district_name(), Some("Quận 1"));
        assert_eq!(view.inventory_count, 0);

        let far = svc.create(store("GS25 Thủ Đức", 10.85, 106.77)).await.unwrap();
        assert_eq!(far.store.district_id, None);
    }

    #[tokio::test]
    async fn unknown_district_id_is_a_validation_error() {
        let svc = StoreService::new(repos().await);
        let mut new = store("Ministop", 10.77, 106.70);
        new.district_id = Some(999);
        assert!(matches!(svc.create(new).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn within_radius_orders_by_distance() {
        let svc = StoreService::new(repos().await);
        svc.create(store("Far", 10.8188, 106.6520)).await.unwrap(); // ~7 km
        svc.create(store("Near", 10.7730, 106.6990)).await.unwrap();
        svc.create(store("Mid", 10.7800, 106.7000)).await.unwrap();

        let hits = svc.within_radius(&ben_thanh(), 2.0, None).await.unwrap();
        let names: Vec<_> = hits.iter().map(|v| v.store.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Mid"]);
        assert!(hits[0].distance_m.unwrap() < hits[1].distance_m.unwrap());

        assert!(svc.within_radius(&ben_thanh(), 0.0, None).await.is_err());
        assert_eq!(svc.nearest(&ben_thanh(), Some(1), None).await.unwrap()[0].store.name, "Near");
    }

    #[tokio::test]
    async fn search_filters_by_available_inventory_and_sorts_by_distance() {
        let repos = repos().await;
        let svc = StoreService::new(repos.clone());
        let near = svc.create(store("Circle K Near", 10.7730, 106.6990)).await.unwrap();
        let far = svc.create(store("Circle K Far", 10.7900, 106.7100)).await.unwrap();
        let other = svc.create(store("GS25", 10.7731, 106.6991)).await.unwrap();
        let coke = repos.items().create(item("Coca-Cola", ItemCategory::Beverages)).await.unwrap();

        for (store_id, available) in [(near.store.id, true), (far.store.id, true), (other.store.id, false)] {
            repos
                .inventory()
                .create(NewInventory { store_id, item_id: coke.id, is_available: available })
                .await
                .unwrap();
        }

        let result = svc
            .search(
                StoreSearch {
                    filter: StoreFilter {
                        inventory_item: Some("coca".into()),
                        ..Default::default()
                    },
                    reference: Some(ben_thanh()),
                    radius_km: None,
                    sort_by_distance: true,
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        let names: Vec<_> = result.items.iter().map(|v| v.store.name.as_str()).collect();
        assert_eq!(names, vec!["Circle K Near", "Circle K Far"]);
        assert_eq!(result.items[0].inventory_count, 1);
    }

    #[tokio::test]
    async fn search_radius_requires_point() {
        let svc = StoreService::new(repos().await);
        let err = svc
            .search(
                StoreSearch {
                    radius_km: Some(1.0),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn search_by_district_name_matches_linked_district() {
        let repos = repos().await;
        let d1 = repos.districts().create(district("Quận 1", "Q1", None)).await.unwrap();
        let svc = StoreService::new(repos);
        let mut linked = store("Ministop", 10.77, 106.70);
        linked.district_id = Some(d1.id);
        svc.create(linked).await.unwrap();
        svc.create(store("GS25", 10.80, 106.70)).await.unwrap();

        let page = svc
            .search(
                StoreSearch {
                    filter: StoreFilter {
                        district: Some(DistrictMatch::NameContains("quận".into())),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].store.name, "Ministop");
    }

    #[tokio::test]
    async fn inventory_of_missing_store_is_not_found() {
        let svc = StoreService::new(repos().await);
        assert!(matches!(
            svc.inventory(42, PageRequest::default()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn moving_a_store_rederives_its_district() {
        let repos = repos().await;
        let q1 = repos
            .districts()
            .create(district("Quận 1", "Q1", Some(square(106.69, 10.76, 0.02))))
            .await
            .unwrap();
        let q3 = repos
            .districts()
            .create(district("Quận 3", "Q3", Some(square(106.67, 10.78, 0.02))))
            .await
            .unwrap();
        let svc = StoreService::new(repos);
        let created = svc.create(store("Circle K Lê Lợi", 10.7725, 106.6980)).await.unwrap();
        assert_eq!(created.store.district_id, Some(q1.id));

        let moved = svc
            .update(
                created.store.id,
                StoreUpdate {
                    location: Some(Coordinate::new(10.785, 106.68).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.store.district_id, Some(q3.id));
        assert_eq!(moved.store.district.as_deref(), Some("Quận 3"));

        let outside = svc
            .update(
                created.store.id,
                StoreUpdate {
                    location: Some(Coordinate::new(10.85, 106.77).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outside.store.district_id, None);
        assert_eq!(outside.store.district, None);
    }

    #[tokio::test]
    async fn text_search_folds_vietnamese_case() {
        let svc = StoreService::new(repos().await);
        let mut new = store("CIRCLE K ĐIỆN BIÊN PHỦ", 10.80, 106.70);
        new.address = "12 ĐƯỜNG NGUYỄN HUỆ".into();
        svc.create(new).await.unwrap();
        svc.create(store("GS25", 10.80, 106.71)).await.unwrap();

        for text in ["điện biên", "nguyễn huệ"] {
            let page = svc
                .list(
                    &StoreFilter {
                        search: Some(text.into()),
                        ..Default::default()
                    },
                    None,
                    PageRequest::default(),
                )
                .await
                .unwrap();
            assert_eq!(page.total, 1, "search {text:?}");
        }
    }
}
