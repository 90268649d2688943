//! SeaORM implementation of InventoryRepository

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};

use super::item_repository::item_model_to_domain;
use super::store_repository::store_model_to_domain;
use super::{counts_to_map, db_err, fetch_page, folded_contains, order, unique_err};
use crate::domain::inventory::{
    Inventory, InventoryFilter, InventoryRecord, InventoryRepository, InventoryStatistics,
    InventoryUpdate, ItemStoreCounts, NewInventory,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{inventory, item, store};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

const DUPLICATE: &str = "This item is already listed for this store";

pub struct SeaOrmInventoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmInventoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach stores and items to inventory rows, keeping row order.
    async fn load_records(&self, rows: Vec<inventory::Model>) -> DomainResult<Vec<InventoryRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let store_ids: Vec<i32> = rows.iter().map(|r| r.store_id).collect();
        let item_ids: Vec<i32> = rows.iter().map(|r| r.item_id).collect();

        let stores: HashMap<i32, store::Model> = store::Entity::find()
            .filter(store::Column::Id.is_in(store_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let items: HashMap<i32, item::Model> = item::Entity::find()
            .filter(item::Column::Id.is_in(item_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        rows.into_iter()
            .map(|row| {
                let store = stores
                    .get(&row.store_id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("Store", row.store_id))?;
                let item = items
                    .get(&row.item_id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("Item", row.item_id))?;
                Ok(InventoryRecord {
                    inventory: inventory_model_to_domain(row),
                    store: store_model_to_domain(store),
                    item: item_model_to_domain(item),
                })
            })
            .collect()
    }
}

fn inventory_model_to_domain(model: inventory::Model) -> Inventory {
    Inventory {
        id: model.id,
        store_id: model.store_id,
        item_id: model.item_id,
        is_available: model.is_available,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn joined() -> Select<inventory::Entity> {
    inventory::Entity::find()
        .join(JoinType::InnerJoin, inventory::Relation::Store.def())
        .join(JoinType::InnerJoin, inventory::Relation::Item.def())
}

fn apply_filter(
    mut query: Select<inventory::Entity>,
    filter: &InventoryFilter,
) -> Select<inventory::Entity> {
    if let Some(store_id) = filter.store_id {
        query = query.filter(inventory::Column::StoreId.eq(store_id));
    }
    if let Some(item_id) = filter.item_id {
        query = query.filter(inventory::Column::ItemId.eq(item_id));
    }
    if let Some(category) = filter.category {
        query = query.filter(item::Column::Category.eq(category.as_str()));
    }
    if let Some(is_available) = filter.is_available {
        query = query.filter(inventory::Column::IsAvailable.eq(is_available));
    }
    if let Some(name) = &filter.item_name_contains {
        query = query.filter(folded_contains(item::Column::NameFolded, name));
    }
    if let Some(search) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(folded_contains(item::Column::NameFolded, search))
                .add(folded_contains(store::Column::NameFolded, search))
                .add(folded_contains(item::Column::BrandFolded, search)),
        );
    }
    if let Some(bbox) = filter.store_within {
        query = query
            .filter(store::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
            .filter(store::Column::Longitude.between(bbox.min_lng, bbox.max_lng));
    }
    query
}

fn apply_sort(query: Select<inventory::Entity>, sort: &SortSpec<'_>) -> Select<inventory::Entity> {
    let query = match sort.field {
        "created_at" => query.order_by(inventory::Column::CreatedAt, order(sort)),
        _ => query.order_by(item::Column::Name, order(sort)),
    };
    query.order_by_asc(inventory::Column::Id)
}

#[async_trait]
impl InventoryRepository for SeaOrmInventoryRepository {
    async fn create(&self, new: NewInventory) -> DomainResult<Inventory> {
        let now = Utc::now();
        let active = inventory::ActiveModel {
            store_id: Set(new.store_id),
            item_id: Set(new.item_id),
            is_available: Set(new.is_available),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;
        Ok(inventory_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<InventoryRecord>> {
        let Some(model) = inventory::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(self.load_records(vec![model]).await?.into_iter().next())
    }

    async fn update(&self, id: i32, update: InventoryUpdate) -> DomainResult<Inventory> {
        let existing = inventory::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Inventory", id))?;

        let mut active: inventory::ActiveModel = existing.into();
        if let Some(store_id) = update.store_id {
            active.store_id = Set(store_id);
        }
        if let Some(item_id) = update.item_id {
            active.item_id = Set(item_id);
        }
        if let Some(is_available) = update.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;
        Ok(inventory_model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = inventory::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Inventory", id));
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &InventoryFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<InventoryRecord>> {
        let query = apply_sort(apply_filter(joined(), filter), &sort);
        let (rows, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        let items = self.load_records(rows).await?;
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn find_all(&self, filter: &InventoryFilter) -> DomainResult<Vec<InventoryRecord>> {
        let rows = apply_filter(joined(), filter)
            .order_by_asc(item::Column::Name)
            .order_by_asc(inventory::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.load_records(rows).await
    }

    async fn count_by_store_ids(&self, store_ids: &[i32]) -> DomainResult<BTreeMap<i32, u64>> {
        if store_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let rows: Vec<(i32, i64)> = inventory::Entity::find()
            .select_only()
            .column(inventory::Column::StoreId)
            .column_as(Expr::col(inventory::Column::Id).count(), "count")
            .filter(inventory::Column::StoreId.is_in(store_ids.iter().copied()))
            .group_by(inventory::Column::StoreId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(counts_to_map(rows))
    }

    async fn store_counts_by_item_ids(
        &self,
        item_ids: &[i32],
    ) -> DomainResult<BTreeMap<i32, ItemStoreCounts>> {
        if item_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        // (store_id, item_id) is unique: rows per item == stores per item
        let per_item = |available_only: bool| {
            let mut query = inventory::Entity::find()
                .select_only()
                .column(inventory::Column::ItemId)
                .column_as(Expr::col(inventory::Column::StoreId).count(), "count")
                .filter(inventory::Column::ItemId.is_in(item_ids.iter().copied()));
            if available_only {
                query = query.filter(inventory::Column::IsAvailable.eq(true));
            }
            query.group_by(inventory::Column::ItemId)
        };

        let totals: Vec<(i32, i64)> = per_item(false)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let available: Vec<(i32, i64)> = per_item(true)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut counts: BTreeMap<i32, ItemStoreCounts> = BTreeMap::new();
        for (item_id, n) in totals {
            counts.entry(item_id).or_default().stores = n.max(0) as u64;
        }
        for (item_id, n) in available {
            counts.entry(item_id).or_default().available = n.max(0) as u64;
        }
        Ok(counts)
    }

    async fn store_ids_for_item(&self, item_id: i32) -> DomainResult<Vec<i32>> {
        inventory::Entity::find()
            .select_only()
            .column(inventory::Column::StoreId)
            .filter(inventory::Column::ItemId.eq(item_id))
            .order_by_asc(inventory::Column::StoreId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn available_item_names(&self) -> DomainResult<Vec<String>> {
        joined()
            .select_only()
            .column(item::Column::Name)
            .distinct()
            .filter(inventory::Column::IsAvailable.eq(true))
            .order_by_asc(item::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn statistics(&self) -> DomainResult<InventoryStatistics> {
        let total = inventory::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;
        let available = inventory::Entity::find()
            .filter(inventory::Column::IsAvailable.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let by_category: Vec<(String, i64)> = joined()
            .select_only()
            .column(item::Column::Category)
            .column_as(Expr::col((inventory::Entity, inventory::Column::Id)).count(), "count")
            .group_by(item::Column::Category)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let by_store: Vec<(String, i64)> = joined()
            .select_only()
            .column(store::Column::Name)
            .column_as(Expr::col((inventory::Entity, inventory::Column::Id)).count(), "count")
            .group_by(store::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(InventoryStatistics {
            total,
            available,
            unavailable: total.saturating_sub(available),
            by_category: counts_to_map(by_category),
            by_store: counts_to_map(by_store),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::Coordinate;
    use crate::domain::inventory::INVENTORY_ORDERING;
    use crate::domain::item::{ItemCategory, ItemRepository, NewItem};
    use crate::domain::store::{NewStore, StoreRepository, StoreType};
    use crate::infrastructure::database::repositories::item_repository::SeaOrmItemRepository;
    use crate::infrastructure::database::repositories::store_repository::SeaOrmStoreRepository;
    use crate::infrastructure::database::testing::memory_db;

    struct Fixture {
        inventory: SeaOrmInventoryRepository,
        stores: SeaOrmStoreRepository,
        items: SeaOrmItemRepository,
    }

    async fn fixture() -> Fixture {
        let db = memory_db().await;
        Fixture {
            inventory: SeaOrmInventoryRepository::new(db.clone()),
            stores: SeaOrmStoreRepository::new(db.clone()),
            items: SeaOrmItemRepository::new(db),
        }
    }

    async fn store(f: &Fixture, name: &str) -> i32 {
        f.stores
            .create(NewStore {
                name: name.into(),
                address: "12 Nguyễn Huệ".into(),
                phone: None,
                email: None,
                location: Some(Coordinate::new(10.7745, 106.7038).unwrap()),
                store_type: StoreType::detect_from_name(name),
                district: None,
                district_id: None,
                city: None,
                opening_hours: None,
                is_active: true,
                rating: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn item(f: &Fixture, name: &str, category: ItemCategory) -> i32 {
        f.items
            .create(NewItem {
                name: name.into(),
                description: None,
                category,
                brand: None,
                barcode: None,
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    async fn stock(f: &Fixture, store_id: i32, item_id: i32, is_available: bool) -> Inventory {
        f.inventory
            .create(NewInventory {
                store_id,
                item_id,
                is_available,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_store_item_pair_is_a_conflict() {
        let f = fixture().await;
        let s = store(&f, "Circle K").await;
        let i = item(&f, "Water", ItemCategory::Beverages).await;
        stock(&f, s, i, true).await;

        let err = f
            .inventory
            .create(NewInventory {
                store_id: s,
                item_id: i,
                is_available: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_joins_store_and_item_and_sorts_by_item_name() {
        let f = fixture().await;
        let s = store(&f, "Circle K").await;
        let water = item(&f, "Water", ItemCategory::Beverages).await;
        let chips = item(&f, "Chips", ItemCategory::Snacks).await;
        stock(&f, s, water, true).await;
        stock(&f, s, chips, false).await;

        let page = f
            .inventory
            .list(
                &InventoryFilter::default(),
                SortSpec::parse(None, INVENTORY_ORDERING, "item_name"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].item.name, "Chips");
        assert_eq!(page.items[0].store.name, "Circle K");
        assert_eq!(page.items[0].inventory.stock_status(), "unavailable");

        let snacks = f
            .inventory
            .find_all(&InventoryFilter {
                category: Some(ItemCategory::Snacks),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(snacks.len(), 1);
    }

    #[tokio::test]
    async fn counts_and_available_names() {
        let f = fixture().await;
        let a = store(&f, "Circle K").await;
        let b = store(&f, "GS25").await;
        let water = item(&f, "Water", ItemCategory::Beverages).await;
        let chips = item(&f, "Chips", ItemCategory::Snacks).await;
        stock(&f, a, water, true).await;
        stock(&f, b, water, false).await;
        stock(&f, a, chips, false).await;

        let per_store = f.inventory.count_by_store_ids(&[a, b]).await.unwrap();
        assert_eq!(per_store.get(&a), Some(&2));
        assert_eq!(per_store.get(&b), Some(&1));

        let per_item = f.inventory.store_counts_by_item_ids(&[water, chips]).await.unwrap();
        assert_eq!(per_item[&water], ItemStoreCounts { stores: 2, available: 1 });
        assert_eq!(per_item[&chips], ItemStoreCounts { stores: 1, available: 0 });

        assert_eq!(f.inventory.available_item_names().await.unwrap(), vec!["Water"]);

        let stats = f.inventory.statistics().await.unwrap();
        assert_eq!((stats.total, stats.available, stats.unavailable), (3, 1, 2));
        assert_eq!(stats.by_category.get("beverages"), Some(&2));
        assert_eq!(stats.by_store.get("Circle K"), Some(&2));
    }

    #[tokio::test]
    async fn deleting_a_store_removes_its_inventory() {
        let f = fixture().await;
        let s = store(&f, "Circle K").await;
        let i = item(&f, "Water", ItemCategory::Beverages).await;
        let row = stock(&f, s, i, true).await;

        f.stores.delete(s).await.unwrap();
        assert!(f.inventory.find_by_id(row.id).await.unwrap().is_none());
    }
}
