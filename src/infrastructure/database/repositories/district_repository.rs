//! SeaORM implementation of DistrictRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::warn;

use super::{counts_to_map, db_err, fetch_page, folded_contains, order, unique_err};
use crate::domain::district::{
    District, DistrictFilter, DistrictRepository, DistrictStatistics, DistrictUpdate, NewDistrict,
    DEFAULT_CITY,
};
use crate::domain::geo::{Boundary, BoundingBox, Coordinate};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{district, store};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

const DUPLICATE: &str = "District with this name or code already exists";

pub struct SeaOrmDistrictRepository {
    db: DatabaseConnection,
}

impl SeaOrmDistrictRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn district_model_to_domain(model: district::Model) -> District {
    let boundary = model.boundary.as_deref().and_then(|raw| {
        Boundary::from_geojson_str(raw)
            .map_err(|e| warn!(district_id = model.id, error = %e, "Stored boundary is unreadable"))
            .ok()
    });

    District {
        id: model.id,
        name: model.name,
        code: model.code,
        boundary,
        city: model.city,
        population: model.population,
        area_km2: model.area_km2,
        district_type: model.district_type.parse().unwrap_or_default(),
        avg_income: model.avg_income,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn set_boundary(active: &mut district::ActiveModel, boundary: Option<&Boundary>) {
    let bbox: Option<BoundingBox> = boundary.map(Boundary::bounding_box);
    active.boundary = Set(boundary.map(|b| b.to_geojson().to_string()));
    active.min_lng = Set(bbox.map(|b| b.min_lng));
    active.min_lat = Set(bbox.map(|b| b.min_lat));
    active.max_lng = Set(bbox.map(|b| b.max_lng));
    active.max_lat = Set(bbox.map(|b| b.max_lat));
}

fn apply_filter(mut query: Select<district::Entity>, filter: &DistrictFilter) -> Select<district::Entity> {
    if let Some(id) = filter.id {
        query = query.filter(district::Column::Id.eq(id));
    }
    if let Some(city) = &filter.city {
        query = query.filter(district::Column::City.eq(city.as_str()));
    }
    if let Some(district_type) = filter.district_type {
        query = query.filter(district::Column::DistrictType.eq(district_type.as_str()));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(district::Column::IsActive.eq(is_active));
    }
    if let Some(name) = &filter.name_contains {
        query = query.filter(folded_contains(district::Column::NameFolded, name));
    }
    if let Some(search) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(folded_contains(district::Column::NameFolded, search))
                .add(folded_contains(district::Column::CodeFolded, search))
                .add(folded_contains(district::Column::CityFolded, search)),
        );
    }
    query
}

fn sort_column(sort: &SortSpec<'_>) -> district::Column {
    match sort.field {
        "city" => district::Column::City,
        "population" => district::Column::Population,
        "area_km2" => district::Column::AreaKm2,
        "avg_income" => district::Column::AvgIncome,
        "created_at" => district::Column::CreatedAt,
        _ => district::Column::Name,
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl DistrictRepository for SeaOrmDistrictRepository {
    async fn create(&self, new: NewDistrict) -> DomainResult<District> {
        let now = Utc::now();
        let mut active = district::ActiveModel {
            name: Set(new.name.trim().to_string()),
            code: Set(new.code.trim().to_string()),
            city: Set(new.city.unwrap_or_else(|| DEFAULT_CITY.to_string())),
            population: Set(new.population),
            area_km2: Set(new.area_km2),
            district_type: Set(new.district_type.as_str().to_string()),
            avg_income: Set(new.avg_income),
            is_active: Set(new.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        set_boundary(&mut active, new.boundary.as_ref());

        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;
        Ok(district_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<District>> {
        let model = district::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(district_model_to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<District>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = district::Entity::find()
            .filter(district::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(district_model_to_domain).collect())
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<District>> {
        let model = district::Entity::find()
            .filter(district::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(district_model_to_domain))
    }

    async fn update(&self, id: i32, update: DistrictUpdate) -> DomainResult<District> {
        let existing = district::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("District", id))?;

        let mut active: district::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(code) = update.code {
            active.code = Set(code.trim().to_string());
        }
        if let Some(boundary) = update.boundary.as_ref() {
            set_boundary(&mut active, Some(boundary));
        }
        if let Some(city) = update.city {
            active.city = Set(city);
        }
        if let Some(population) = update.population {
            active.population = Set(Some(population));
        }
        if let Some(area) = update.area_km2 {
            active.area_km2 = Set(Some(area));
        }
        if let Some(district_type) = update.district_type {
            active.district_type = Set(district_type.as_str().to_string());
        }
        if let Some(income) = update.avg_income {
            active.avg_income = Set(Some(income));
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;
        Ok(district_model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        store::Entity::update_many()
            .col_expr(store::Column::DistrictId, Expr::value(Option::<i32>::None))
            .filter(store::Column::DistrictId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let result = district::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("District", id));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &DistrictFilter,
        sort: SortSpec<'_>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<District>> {
        let query = apply_filter(district::Entity::find(), filter)
            .order_by(sort_column(&sort), order(&sort))
            .order_by_asc(district::Column::Id);

        let (models, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        let items = models.into_iter().map(district_model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn find_all(&self, filter: &DistrictFilter) -> DomainResult<Vec<District>> {
        let models = apply_filter(district::Entity::find(), filter)
            .order_by_asc(district::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(district_model_to_domain).collect())
    }

    async fn find_boundary_candidates(&self, point: &Coordinate) -> DomainResult<Vec<District>> {
        let (lng, lat) = (point.longitude(), point.latitude());
        let models = district::Entity::find()
            .filter(district::Column::IsActive.eq(true))
            .filter(district::Column::Boundary.is_not_null())
            .filter(district::Column::MinLng.lte(lng))
            .filter(district::Column::MaxLng.gte(lng))
            .filter(district::Column::MinLat.lte(lat))
            .filter(district::Column::MaxLat.gte(lat))
            .order_by_asc(district::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(district_model_to_domain).collect())
    }

    async fn statistics(&self) -> DomainResult<DistrictStatistics> {
        let total = district::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;
        let active = district::Entity::find()
            .filter(district::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let by_type: Vec<(String, i64)> = district::Entity::find()
            .select_only()
            .column(district::Column::DistrictType)
            .column_as(Expr::col(district::Column::Id).count(), "count")
            .group_by(district::Column::DistrictType)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let aggregates: Option<(Option<i64>, Option<f64>, Option<f64>)> = district::Entity::find()
            .select_only()
            .column_as(Expr::col(district::Column::Population).sum(), "population")
            .column_as(SimpleExpr::from(Func::avg(Expr::col(district::Column::AreaKm2))), "area")
            .column_as(SimpleExpr::from(Func::avg(Expr::col(district::Column::AvgIncome))), "income")
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_err)?;
        let (population, area, income) = aggregates.unwrap_or_default();

        Ok(DistrictStatistics {
            total,
            active,
            by_type: counts_to_map(by_type),
            total_population: population.unwrap_or(0),
            average_area_km2: area.unwrap_or(0.0),
            average_income: income.unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::district::DistrictType;
    use crate::infrastructure::database::testing::memory_db;

    fn square(min_lng: f64, min_lat: f64, size: f64) -> Boundary {
        Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[
                [min_lng, min_lat],
                [min_lng + size, min_lat],
                [min_lng + size, min_lat + size],
                [min_lng, min_lat + size],
                [min_lng, min_lat]
            ]]
        }))
        .unwrap()
    }

    fn new_district(name: &str, code: &str, boundary: Option<Boundary>) -> NewDistrict {
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

    #[tokio::test]
    async fn create_persists_boundary_and_defaults() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        let created = repo
            .create(new_district("Quận 1", "Q1", Some(square(106.69, 10.76, 0.02))))
            .await
            .unwrap();

        assert_eq!(created.city, DEFAULT_CITY);
        let loaded = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert!(loaded.boundary.is_some());
        assert!(loaded.contains(&Coordinate::new(10.77, 106.70).unwrap()));
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        repo.create(new_district("Quận 1", "Q1", None)).await.unwrap();
        let err = repo.create(new_district("Quận Một", "Q1", None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn boundary_candidates_use_bounding_box() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        let q1 = repo
            .create(new_district("Quận 1", "Q1", Some(square(106.69, 10.76, 0.02))))
            .await
            .unwrap();
        repo.create(new_district("Quận 7", "Q7", Some(square(106.70, 10.70, 0.03))))
            .await
            .unwrap();
        repo.create(new_district("Quận 3", "Q3", None)).await.unwrap();

        let hits = repo
            .find_boundary_candidates(&Coordinate::new(10.77, 106.70).unwrap())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, q1.id);
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        let mut rural = new_district("Huyện Củ Chi", "CC", None);
        rural.district_type = DistrictType::Rural;
        rural.population = Some(450_000);
        repo.create(rural).await.unwrap();
        repo.create(new_district("Quận 1", "Q1", None)).await.unwrap();

        let urban = repo
            .list(
                &DistrictFilter {
                    district_type: Some(DistrictType::Urban),
                    ..Default::default()
                },
                SortSpec::parse(None, crate::domain::district::DISTRICT_ORDERING, "name"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(urban.total, 1);
        assert_eq!(urban.items[0].code, "Q1");

        let by_population = repo
            .list(
                &DistrictFilter::default(),
                SortSpec::parse(Some("-population"), crate::domain::district::DISTRICT_ORDERING, "name"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_population.items[0].code, "CC");
    }

    #[tokio::test]
    async fn statistics_sum_population() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        repo.create(new_district("Quận 1", "Q1", None)).await.unwrap();
        let mut other = new_district("Quận 3", "Q3", None);
        other.population = Some(50_000);
        other.area_km2 = Some(3.0);
        other.is_active = false;
        repo.create(other).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.total_population, 150_000);
        assert!((stats.average_area_km2 - 4.0).abs() < 1e-9);
        assert_eq!(stats.average_income, 0.0);
        assert_eq!(stats.by_type.get("urban"), Some(&2));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let repo = SeaOrmDistrictRepository::new(memory_db().await);
        let err = repo.delete(404).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
