//! SeaORM implementation of StoreRepository

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::warn;

use super::{counts_to_map, db_err, fetch_page, folded_contains, order};
use crate::domain::district::DEFAULT_CITY;
use crate::domain::geo::Coordinate;
use crate::domain::store::{
    DistrictMatch, NewStore, Store, StoreFilter, StoreRepository, StoreStatistics, StoreUpdate,
    UNASSIGNED_DISTRICT,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{district, inventory, item, store};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

pub struct SeaOrmStoreRepository {
    db: DatabaseConnection,
}

impl SeaOrmStoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn store_model_to_domain(model: store::Model) -> Store {
    let location = Coordinate::from_parts(model.latitude, model.longitude)
        .map_err(|e| warn!(store_id = model.id, error = %e, "Stored location is invalid"))
        .ok()
        .flatten();

    Store {
        id: model.id,
        name: model.name,
        address: model.address,
        phone: model.phone,
        email: model.email,
        location,
        store_type: model.store_type.parse().unwrap_or_default(),
        district: model.district,
        district_id: model.district_id,
        city: model.city,
        opening_hours: model.opening_hours,
        is_active: model.is_active,
        rating: model.rating,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn district_ids_named_like(text: &str) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(district::Column::Id)
        .from(district::Entity)
        .and_where(folded_contains(district::Column::NameFolded, text))
        .to_owned()
}

fn apply_filter(mut query: Select<store::Entity>, filter: &StoreFilter) -> Select<store::Entity> {
    if let Some(store_type) = filter.store_type {
        query = query.filter(store::Column::StoreType.eq(store_type.as_str()));
    }
    if let Some(city) = &filter.city {
        query = query.filter(store::Column::City.eq(city.as_str()));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(store::Column::IsActive.eq(is_active));
    }
    match &filter.district {
        Some(DistrictMatch::Id(id)) => {
            query = query.filter(store::Column::DistrictId.eq(*id));
        }
        Some(DistrictMatch::Name(name)) => {
            query = query.filter(store::Column::District.eq(name.as_str()));
        }
        Some(DistrictMatch::NameContains(text)) => {
            query = query.filter(
                Condition::any()
                    .add(folded_contains(store::Column::DistrictFolded, text))
                    .add(store::Column::DistrictId.in_subquery(district_ids_named_like(text))),
            );
        }
        None => {}
    }
    if let Some(search) = &filter.search {
        let mut any = Condition::any()
            .add(folded_contains(store::Column::NameFolded, search))
            .add(folded_contains(store::Column::AddressFolded, search))
            .add(folded_contains(store::Column::CityFolded, search));
        if filter.search_district_name {
            any = any
                .add(folded_contains(store::Column::DistrictFolded, search))
                .add(store::Column::DistrictId.in_subquery(district_ids_named_like(search)));
        }
        query = query.filter(any);
    }
    if let Some(item_name) = &filter.inventory_item {
        let stocking = Query::select()
            .column((inventory::Entity, inventory::Column::StoreId))
            .from(inventory::Entity)
            .inner_join(
                item::Entity,
                Expr::col((item::Entity, item::Column::Id))
                    .equals((inventory::Entity, inventory::Column::ItemId)),
            )
            .and_where(inventory::Column::IsAvailable.eq(true))
            .and_where(folded_contains(item::Column::NameFolded, item_name))
            .to_owned();
        query = query.filter(store::Column::Id.in_subquery(stocking));
    }
    if filter.located_only || filter.within.is_some() {
        query = query
            .filter(store::Column::Latitude.is_not_null())
            .filter(store::Column::Longitude.is_not_null());
    }
    if let Some(bbox) = filter.within {
        query = query
            .filter(store::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
            .filter(store::Column::Longitude.between(bbox.min_lng, bbox.max_lng));
    }
    query
}

fn sort_column(sort: &SortSpec<'_>) -> store::Column {
    match sort.field {
        "city" => store::Column::City,
        "rating" => store::Column::Rating,
        "created_at" => store::Column::CreatedAt,
        _ => store::Column::Name,
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl StoreRepository for SeaOrmStoreRepository {
    async fn create(&self, new: NewStore) -> DomainResult<Store> {
        let now = Utc::now();
        let active = store::ActiveModel {
            name: Set(new.name.trim().to_string()),
            address: Set(new.address.trim().to_string()),
            phone: Set(new.phone),
            email: Set(new.email),
            latitude: Set(new.location.map(|c| c.latitude())),
            longitude: Set(new.location.map(|c| c.longitude())),
            store_type: Set(new.store_type.as_str().to_string()),
            district: Set(new.district),
            district_id: Set(new.district_id),
            city: Set(new.city.unwrap_or_else(|| DEFAULT_CITY.to_string())),
            opening_hours: Set(new.opening_hours),
            is_active: Set(new.is_active),
            rating: Set(new.rating),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.db).await.map_err(db_err)?;
        Ok(store_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Store>> {
        let model = store::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(store_model_to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Store>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = store::Entity::find()
            .filter(store::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(store_model_to_domain).collect())
    }

    async fn update(&self, id: i32, update: StoreUpdate) -> DomainResult<Store> {
        let existing = store::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Store", id))?;

        let mut active: store::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = update.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(phone) = update.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = update.email {
            active.email = Set(Some(email));
        }
        if let Some(location) = update.location {
            active.latitude = Set(Some(location.latitude()));
            active.longitude = Set(Some(location.longitude()));
        }
        if let Some(store_type) = update.store_type {
            active.store_type = Set(store_type.as_str().to_string());
        }
        if update.clear_district {
            active.district = Set(None);
            active.district_id = Set(None);
        }
        if let Some(district) = update.district {
            active.district = Set(Some(district));
        }
        if let Some(district_id) = update.district_id {
            active.district_id = Set(Some(district_id));
        }
        if let Some(city) = update.city {
            active.city = Set(city);
        }
        if let Some(hours) = update.opening_hours {
            active.opening_hours = Set(Some(hours));
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(rating) = update.rating {
            active.rating = Set(Some(rating));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(db_err)?;
        Ok(store_model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        inventory::Entity::delete_many()
            .filter(inventory::Column::StoreId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let result = store::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Store", id));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &StoreFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Store>> {
        let query = apply_filter(store::Entity::find(), filter)
            .order_by(sort_column(&sort), order(&sort))
            .order_by_asc(store::Column::Id);

        let (models, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        let items = models.into_iter().map(store_model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn find_all(&self, filter: &StoreFilter, sort: SortSpec<'_>) -> DomainResult<Vec<Store>> {
        let models = apply_filter(store::Entity::find(), filter)
            .order_by(sort_column(&sort), order(&sort))
            .order_by_asc(store::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(store_model_to_domain).collect())
    }

    async fn find_by_district_id(&self, district_id: i32) -> DomainResult<Vec<Store>> {
        let models = store::Entity::find()
            .filter(store::Column::DistrictId.eq(district_id))
            .order_by_asc(store::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(store_model_to_domain).collect())
    }

    async fn count_by_district_ids(&self, ids: &[i32]) -> DomainResult<BTreeMap<i32, u64>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let rows: Vec<(i32, i64)> = store::Entity::find()
            .select_only()
            .column(store::Column::DistrictId)
            .column_as(Expr::col(store::Column::Id).count(), "count")
            .filter(store::Column::DistrictId.is_in(ids.iter().copied()))
            .group_by(store::Column::DistrictId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(counts_to_map(rows))
    }

    async fn statistics(&self) -> DomainResult<StoreStatistics> {
        let total = store::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;
        let active = store::Entity::find()
            .filter(store::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let by_type: Vec<(String, i64)> = store::Entity::find()
            .select_only()
            .column(store::Column::StoreType)
            .column_as(Expr::col(store::Column::Id).count(), "count")
            .group_by(store::Column::StoreType)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let by_district_rows: Vec<(Option<i32>, Option<String>, i64)> = store::Entity::find()
            .select_only()
            .column(store::Column::DistrictId)
            .column(store::Column::District)
            .column_as(Expr::col(store::Column::Id).count(), "count")
            .group_by(store::Column::DistrictId)
            .group_by(store::Column::District)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let linked: Vec<i32> = by_district_rows.iter().filter_map(|(id, _, _)| *id).collect();
        let names: BTreeMap<i32, String> = if linked.is_empty() {
            BTreeMap::new()
        } else {
            district::Entity::find()
                .select_only()
                .column(district::Column::Id)
                .column(district::Column::Name)
                .filter(district::Column::Id.is_in(linked))
                .into_tuple::<(i32, String)>()
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .collect()
        };

        let mut by_district: BTreeMap<String, u64> = BTreeMap::new();
        for (district_id, free_text, count) in by_district_rows {
            let label = district_id
                .and_then(|id| names.get(&id).cloned())
                .or(free_text.filter(|name| !name.trim().is_empty()))
                .unwrap_or_else(|| UNASSIGNED_DISTRICT.to_string());
            *by_district.entry(label).or_default() += count.max(0) as u64;
        }

        let average_rating: Option<Option<f64>> = store::Entity::find()
            .select_only()
            .column_as(SimpleExpr::from(Func::avg(Expr::col(store::Column::Rating))), "rating")
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let total_inventory = inventory::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(StoreStatistics {
            total,
            active,
            by_type: counts_to_map(by_type),
            by_district,
            average_rating: average_rating.flatten().unwrap_or(0.0),
            total_inventory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::BoundingBox;
    use crate::domain::store::{StoreType, STORE_ORDERING};
    use crate::infrastructure::database::testing::memory_db;

    fn new_store(name: &str, lat: f64, lng: f64) -> NewStore {
        NewStore {
            name: name.into(),
            address: "1 Lê Lợi".into(),
            phone: None,
            email: None,
            location: Some(Coordinate::new(lat, lng).unwrap()),
            store_type: StoreType::detect_from_name(name),
            district: None,
            district_id: None,
            city: None,
            opening_hours: Some("24/7".into()),
            is_active: true,
            rating: None,
        }
    }

    #[tokio::test]
    async fn location_round_trips() {
        let repo = SeaOrmStoreRepository::new(memory_db().await);
        let created = repo.create(new_store("Circle K Lê Lợi", 10.7725, 106.698)).await.unwrap();
        let loaded = repo.find_by_id(created.id).await.unwrap().unwrap();
        let loc = loaded.location.unwrap();
        assert_eq!((loc.latitude(), loc.longitude()), (10.7725, 106.698));
        assert_eq!(loaded.store_type, StoreType::CircleK);
        assert_eq!(loaded.city, DEFAULT_CITY);
    }

    #[tokio::test]
    async fn bounding_box_filter_excludes_far_and_unlocated_stores() {
        let repo = SeaOrmStoreRepository::new(memory_db().await);
        repo.create(new_store("7-Eleven A", 10.77, 106.70)).await.unwrap();
        repo.create(new_store("7-Eleven B", 10.95, 106.50)).await.unwrap();
        let mut nowhere = new_store("GS25 C", 0.0, 0.0);
        nowhere.location = None;
        repo.create(nowhere).await.unwrap();

        let center = Coordinate::new(10.77, 106.70).unwrap();
        let filter = StoreFilter {
            within: Some(BoundingBox::around(&center, 5_000.0)),
            ..Default::default()
        };
        let found = repo
            .find_all(&filter, SortSpec::parse(None, STORE_ORDERING, "name"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "7-Eleven A");
    }

    #[tokio::test]
    async fn statistics_label_unassigned_stores() {
        let repo = SeaOrmStoreRepository::new(memory_db().await);
        let mut rated = new_store("Ministop 1", 10.77, 106.70);
        rated.rating = Some(4.0);
        rated.district = Some("Quận 1".into());
        repo.create(rated).await.unwrap();
        let mut other = new_store("Ministop 2", 10.78, 106.71);
        other.rating = Some(2.0);
        repo.create(other).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_type.get("ministop"), Some(&2));
        assert_eq!(stats.by_district.get("Quận 1"), Some(&1));
        assert_eq!(stats.by_district.get(UNASSIGNED_DISTRICT), Some(&1));
        assert!((stats.average_rating - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn search_matches_name_address_and_city_case_insensitively() {
        let repo = SeaOrmStoreRepository::new(memory_db().await);
        repo.create(new_store("Circle K Downtown", 10.77, 106.70)).await.unwrap();
        repo.create(new_store("FamilyMart Uptown", 10.78, 106.71)).await.unwrap();

        let filter = StoreFilter {
            search: Some("circle".into()),
            ..Default::default()
        };
        let page = repo
            .list(&filter, SortSpec::parse(None, STORE_ORDERING, "name"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Circle K Downtown");
    }

    #[tokio::test]
    async fn delete_unknown_store_is_not_found() {
        let repo = SeaOrmStoreRepository::new(memory_db().await);
        assert!(matches!(
            repo.delete(9).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
