//! Item use-cases

use std::sync::Arc;

use tracing::info;

use super::{enrich_stores, ItemView, StoreView};
use crate::domain::item::{Item, ItemFilter, ItemStatistics, ItemUpdate, NewItem, ITEM_ORDERING};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

pub struct ItemService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ItemService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    async fn views(&self, items: Vec<Item>) -> DomainResult<Vec<ItemView>> {
        let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
        let counts = self.repos.inventory().store_counts_by_item_ids(&ids).await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let c = counts.get(&item.id).copied().unwrap_or_default();
                ItemView {
                    item,
                    store_count: c.stores,
                    available_stores: c.available,
                }
            })
            .collect())
    }

    async fn view(&self, item: Item) -> DomainResult<ItemView> {
        self.views(vec![item])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Database("item view lost during enrichment".into()))
    }

    async fn find(&self, id: i32) -> DomainResult<Item> {
        self.repos
            .items()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", id))
    }

    pub async fn create(&self, new: NewItem) -> DomainResult<ItemView> {
        new.validate()?;
        let item = self.repos.items().create(new).await?;
        info!(item_id = item.id, name = %item.name, "Item created");
        self.view(item).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<ItemView> {
        let item = self.find(id).await?;
        self.view(item).await
    }

    pub async fn update(&self, id: i32, update: ItemUpdate) -> DomainResult<ItemView> {
        update.validate()?;
        let item = self.repos.items().update(id, update).await?;
        info!(item_id = id, "Item updated");
        self.view(item).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos.items().delete(id).await?;
        info!(item_id = id, "Item deleted");
        Ok(())
    }

    /// Listing and `/items/search` share this; the caller fills the filter.
    pub async fn list(
        &self,
        filter: &ItemFilter,
        ordering: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<ItemView>> {
        let sort = SortSpec::parse(ordering, ITEM_ORDERING, "name");
        let result = self.repos.items().list(filter, sort, page).await?;
        let views = self.views(result.items).await?;
        Ok(PaginatedResult::new(views, result.total, result.page, result.limit))
    }

    pub async fn statistics(&self) -> DomainResult<ItemStatistics> {
        self.repos.items().statistics().await
    }

    /// Stores that list the item, available or not.
    pub async fn stores(&self, id: i32) -> DomainResult<Vec<StoreView>> {
        self.find(id).await?;
        let store_ids = self.repos.inventory().store_ids_for_item(id).await?;
        let mut stores = self.repos.stores().find_by_ids(&store_ids).await?;
        stores.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        enrich_stores(self.repos.as_ref(), stores, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures::{item, repos, store};
    use crate::domain::inventory::NewInventory;
    use crate::domain::item::ItemCategory;

    #[tokio::test]
    async fn views_count_stocking_stores() {
        let repos = repos().await;
        let svc = ItemService::new(repos.clone());
        let milk = svc.create(item("Vinamilk", ItemCategory::Dairy)).await.unwrap();
        assert_eq!(milk.store_count, 0);

        let a = repos.stores().create(store("Circle K A", 10.77, 106.70)).await.unwrap();
        let b = repos.stores().create(store("Circle K B", 10.78, 106.70)).await.unwrap();
        for (store_id, is_available) in [(a.id, true), (b.id, false)] {
            repos
                .inventory()
                .create(NewInventory { store_id, item_id: milk.item.id, is_available })
                .await
                .unwrap();
        }

        let view = svc.get(milk.item.id).await.unwrap();
        assert_eq!(view.store_count, 2);
        assert_eq!(view.available_stores, 1);

        let stores = svc.stores(milk.item.id).await.unwrap();
        let names: Vec<_> = stores.iter().map(|s| s.store.name.as_str()).collect();
        assert_eq!(names, vec!["Circle K A", "Circle K B"]);
    }

    #[tokio::test]
    async fn available_only_hides_unstocked_items() {
        let repos = repos().await;
        let svc = ItemService::new(repos.clone());
        let stocked = svc.create(item("Pepsi", ItemCategory::Beverages)).await.unwrap();
        svc.create(item("Sting", ItemCategory::Beverages)).await.unwrap();
        let shop = repos.stores().create(store("GS25", 10.77, 106.70)).await.unwrap();
        repos
            .inventory()
            .create(NewInventory { store_id: shop.id, item_id: stocked.item.id, is_available: true })
            .await
            .unwrap();

        let filter = ItemFilter {
            category: Some(ItemCategory::Beverages),
            available_only: true,
            ..Default::default()
        };
        let page = svc.list(&filter, None, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].item.name, "Pepsi");
    }

    #[tokio::test]
    async fn stores_of_missing_item_is_not_found() {
        let svc = ItemService::new(repos().await);
        assert!(matches!(svc.stores(7).await, Err(DomainError::NotFound { .. })));
    }
}
