//! Inventory use-cases

use std::sync::Arc;

use tracing::info;

use super::{radius_m, sort_by_distance, InventoryView};
use crate::domain::geo::{BoundingBox, Coordinate};
use crate::domain::inventory::{
    InventoryFilter, InventoryStatistics, InventoryUpdate, NewInventory, INVENTORY_ORDERING,
};
use crate::domain::item::ItemCategory;
use crate::domain::{DomainError, DomainResult, InventoryRecord, RepositoryProvider};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// `/inventory/search` criteria
#[derive(Debug, Clone, Default)]
pub struct InventorySearch {
    pub item_name: Option<String>,
    pub category: Option<ItemCategory>,
    pub available_only: bool,
}

pub struct InventoryService {
    repos: Arc<dyn RepositoryProvider>,
}

impl InventoryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    async fn check_refs(&self, store_id: Option<i32>, item_id: Option<i32>) -> DomainResult<()> {
        if let Some(id) = store_id {
            if self.repos.stores().find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!("Store with id {} does not exist", id)));
            }
        }
        if let Some(id) = item_id {
            if self.repos.items().find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!("Item with id {} does not exist", id)));
            }
        }
        Ok(())
    }

    async fn record(&self, id: i32) -> DomainResult<InventoryRecord> {
        self.repos
            .inventory()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Inventory", id))
    }

    pub async fn create(&self, new: NewInventory) -> DomainResult<InventoryRecord> {
        self.check_refs(Some(new.store_id), Some(new.item_id)).await?;
        let row = self.repos.inventory().create(new).await?;
        info!(inventory_id = row.id, store_id = row.store_id, item_id = row.item_id, "Inventory created");
        self.record(row.id).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<InventoryRecord> {
        self.record(id).await
    }

    pub async fn update(&self, id: i32, update: InventoryUpdate) -> DomainResult<InventoryRecord> {
        self.check_refs(update.store_id, update.item_id).await?;
        self.repos.inventory().update(id, update).await?;
        info!(inventory_id = id, "Inventory updated");
        self.record(id).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos.inventory().delete(id).await?;
        info!(inventory_id = id, "Inventory deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &InventoryFilter,
        ordering: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<InventoryRecord>> {
        let sort = SortSpec::parse(ordering, INVENTORY_ORDERING, "item_name");
        self.repos.inventory().list(filter, sort, page).await
    }

    pub async fn search(
        &self,
        search: InventorySearch,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<InventoryRecord>> {
        let filter = InventoryFilter {
            item_name_contains: search.item_name.filter(|n| !n.trim().is_empty()),
            category: search.category,
            is_available: search.available_only.then_some(true),
            ..Default::default()
        };
        self.list(&filter, None, page).await
    }

    /// Rows whose store lies within `radius_km` of `point`, closest first.
    pub async fn nearby(
        &self,
        point: &Coordinate,
        radius_km: f64,
        category: Option<ItemCategory>,
    ) -> DomainResult<Vec<InventoryView>> {
        let max_m = radius_m(radius_km)?;
        let filter = InventoryFilter {
            category,
            store_within: Some(BoundingBox::around(point, max_m)),
            ..Default::default()
        };
        let mut rows: Vec<InventoryView> = self
            .repos
            .inventory()
            .find_all(&filter)
            .await?
            .into_iter()
            .filter_map(|record| {
                let d = record.store.distance_to(point)?;
                (d <= max_m).then_some(InventoryView {
                    record,
                    distance_m: Some(d),
                })
            })
            .collect();
        sort_by_distance(&mut rows, |v| (v.distance_m, v.record.inventory.id));
        Ok(rows)
    }

    pub async fn statistics(&self) -> DomainResult<InventoryStatistics> {
        self.repos.inventory().statistics().await
    }

    pub async fn available_items(&self) -> DomainResult<Vec<String>> {
        self.repos.inventory().available_item_names().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures::{item, repos, store};

    #[tokio::test]
    async fn create_requires_existing_store_and_item() {
        let repos = repos().await;
        let svc = InventoryService::new(repos.clone());
        let shop = repos.stores().create(store("GS25", 10.77, 106.70)).await.unwrap();

        let err = svc
            .create(NewInventory { store_id: shop.id, item_id: 99, is_available: true })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_pair_conflicts() {
        let repos = repos().await;
        let svc = InventoryService::new(repos.clone());
        let shop = repos.stores().create(store("GS25", 10.77, 106.70)).await.unwrap();
        let snack = repos.items().create(item("Oishi", ItemCategory::Snacks)).await.unwrap();
        let new = NewInventory { store_id: shop.id, item_id: snack.id, is_available: true };

        let record = svc.create(new.clone()).await.unwrap();
        assert_eq!(record.inventory.stock_status(), "available");
        assert_eq!(record.store.name, "GS25");
        assert!(matches!(svc.create(new).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn nearby_keeps_rows_inside_radius() {
        let repos = repos().await;
        let svc = InventoryService::new(repos.clone());
        let near = repos.stores().create(store("Near", 10.7730, 106.6990)).await.unwrap();
        let far = repos.stores().create(store("Far", 10.8188, 106.6520)).await.unwrap();
        let snack = repos.items().create(item("Oishi", ItemCategory::Snacks)).await.unwrap();
        let drink = repos.items().create(item("Pepsi", ItemCategory::Beverages)).await.unwrap();
        for (store_id, item_id) in [(near.id, snack.id), (far.id, snack.id), (near.id, drink.id)] {
            svc.create(NewInventory { store_id, item_id, is_available: true })
                .await
                .unwrap();
        }

        let point = Coordinate::new(10.7725, 106.6980).unwrap();
        let rows = svc.nearby(&point, 1.0, Some(ItemCategory::Snacks)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.store.name, "Near");
        assert!(rows[0].distance_m.unwrap() < 1_000.0);

        assert!(svc.nearby(&point, 200.0, None).await.is_err());
        assert_eq!(svc.available_items().await.unwrap(), vec!["Oishi", "Pepsi"]);
    }
}
