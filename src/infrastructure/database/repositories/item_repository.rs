//! SeaORM implementation of ItemRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use super::{counts_to_map, db_err, fetch_page, folded_contains, order, unique_err};
use crate::domain::item::{
    Item, ItemFilter, ItemRepository, ItemStatistics, ItemUpdate, NewItem,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{inventory, item};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

const DUPLICATE_BARCODE: &str = "Item with this barcode already exists";

pub struct SeaOrmItemRepository {
    db: DatabaseConnection,
}

impl SeaOrmItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn item_model_to_domain(model: item::Model) -> Item {
    Item {
        id: model.id,
        name: model.name,
        description: model.description,
        category: model.category.parse().unwrap_or_default(),
        brand: model.brand,
        barcode: model.barcode,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Blank barcodes are stored as NULL so the unique index ignores them.
fn normalize_barcode(barcode: Option<String>) -> Option<String> {
    barcode
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
}

fn available_item_ids() -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(inventory::Column::ItemId)
        .from(inventory::Entity)
        .and_where(inventory::Column::IsAvailable.eq(true))
        .to_owned()
}

fn apply_filter(mut query: Select<item::Entity>, filter: &ItemFilter) -> Select<item::Entity> {
    if let Some(category) = filter.category {
        query = query.filter(item::Column::Category.eq(category.as_str()));
    }
    if let Some(brand) = &filter.brand {
        query = query.filter(item::Column::Brand.eq(brand.as_str()));
    }
    if let Some(brand) = &filter.brand_contains {
        query = query.filter(folded_contains(item::Column::BrandFolded, brand));
    }
    if let Some(name) = &filter.name_contains {
        query = query.filter(folded_contains(item::Column::NameFolded, name));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(item::Column::IsActive.eq(is_active));
    }
    if let Some(search) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(folded_contains(item::Column::NameFolded, search))
                .add(folded_contains(item::Column::DescriptionFolded, search))
                .add(folded_contains(item::Column::BrandFolded, search))
                .add(folded_contains(item::Column::BarcodeFolded, search)),
        );
    }
    if filter.available_only {
        query = query.filter(item::Column::Id.in_subquery(available_item_ids()));
    }
    query
}

fn sort_column(sort: &SortSpec<'_>) -> item::Column {
    match sort.field {
        "category" => item::Column::Category,
        "brand" => item::Column::Brand,
        "created_at" => item::Column::CreatedAt,
        _ => item::Column::Name,
    }
}

#[async_trait]
impl ItemRepository for SeaOrmItemRepository {
    async fn create(&self, new: NewItem) -> DomainResult<Item> {
        let now = Utc::now();
        let active = item::ActiveModel {
            name: Set(new.name.trim().to_string()),
            description: Set(new.description),
            category: Set(new.category.as_str().to_string()),
            brand: Set(new.brand),
            barcode: Set(normalize_barcode(new.barcode)),
            is_active: Set(new.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE_BARCODE))?;
        Ok(item_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Item>> {
        let model = item::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(item_model_to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = item::Entity::find()
            .filter(item::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(item_model_to_domain).collect())
    }

    async fn update(&self, id: i32, update: ItemUpdate) -> DomainResult<Item> {
        let existing = item::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Item", id))?;

        let mut active: item::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = update.category {
            active.category = Set(category.as_str().to_string());
        }
        if let Some(brand) = update.brand {
            active.brand = Set(Some(brand));
        }
        if update.barcode.is_some() {
            active.barcode = Set(normalize_barcode(update.barcode));
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE_BARCODE))?;
        Ok(item_model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        inventory::Entity::delete_many()
            .filter(inventory::Column::ItemId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let result = item::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Item", id));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &ItemFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Item>> {
        let query = apply_filter(item::Entity::find(), filter)
            .order_by(sort_column(&sort), order(&sort))
            .order_by_asc(item::Column::Id);

        let (models, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        let items = models.into_iter().map(item_model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn statistics(&self) -> DomainResult<ItemStatistics> {
        let total = item::Entity::find().count(&self.db).await.map_err(db_err)?;
        let active = item::Entity::find()
            .filter(item::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let by_category: Vec<(String, i64)> = item::Entity::find()
            .select_only()
            .column(item::Column::Category)
            .column_as(Expr::col(item::Column::Id).count(), "count")
            .group_by(item::Column::Category)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let by_brand: Vec<(String, i64)> = item::Entity::find()
            .select_only()
            .column(item::Column::Brand)
            .column_as(Expr::col(item::Column::Id).count(), "count")
            .filter(item::Column::Brand.is_not_null())
            .filter(item::Column::Brand.ne(""))
            .group_by(item::Column::Brand)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let in_stock = item::Entity::find()
            .filter(item::Column::Id.in_subquery(available_item_ids()))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(ItemStatistics {
            total,
            active,
            by_category: counts_to_map(by_category),
            by_brand: counts_to_map(by_brand),
            in_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemCategory, ITEM_ORDERING};
    use crate::infrastructure::database::testing::memory_db;

    fn new_item(name: &str, category: ItemCategory, brand: &str, barcode: Option<&str>) -> NewItem {
        NewItem {
            name: name.into(),
            description: None,
            category,
            brand: Some(brand.into()),
            barcode: barcode.map(str::to_string),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn barcode_must_be_unique_but_blank_is_allowed_twice() {
        let repo = SeaOrmItemRepository::new(memory_db().await);
        repo.create(new_item("Coca-Cola 330ml", ItemCategory::Beverages, "Coca-Cola", Some("8935049500")))
            .await
            .unwrap();
        let err = repo
            .create(new_item("Coke Zero", ItemCategory::Beverages, "Coca-Cola", Some("8935049500")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        repo.create(new_item("Oishi", ItemCategory::Snacks, "Oishi", Some(" ")))
            .await
            .unwrap();
        repo.create(new_item("Lay's", ItemCategory::Snacks, "PepsiCo", None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn statistics_group_by_category_and_brand() {
        let repo = SeaOrmItemRepository::new(memory_db().await);
        repo.create(new_item("Pepsi", ItemCategory::Beverages, "PepsiCo", None)).await.unwrap();
        repo.create(new_item("Lay's", ItemCategory::Snacks, "PepsiCo", None)).await.unwrap();
        repo.create(new_item("Vinamilk", ItemCategory::Dairy, "Vinamilk", None)).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_brand.get("PepsiCo"), Some(&2));
        assert_eq!(stats.by_category.get("dairy"), Some(&1));
        assert_eq!(stats.in_stock, 0);
    }

    #[tokio::test]
    async fn list_search_matches_brand() {
        let repo = SeaOrmItemRepository::new(memory_db().await);
        repo.create(new_item("Pepsi", ItemCategory::Beverages, "PepsiCo", None)).await.unwrap();
        repo.create(new_item("Vinamilk", ItemCategory::Dairy, "Vinamilk", None)).await.unwrap();

        let page = repo
            .list(
                &ItemFilter {
                    search: Some("pepsico".into()),
                    ..Default::default()
                },
                SortSpec::parse(None, ITEM_ORDERING, "name"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Pepsi");
    }
}
