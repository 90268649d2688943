//! District entity

use sea_orm::entity::prelude::*;
use sea_orm::ConnectionTrait;

use super::refold;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "districts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,

    /// MultiPolygon as GeoJSON text
    #[sea_orm(column_type = "Text", nullable)]
    pub boundary: Option<String>,

    /// Boundary bounding box, used to prefilter containment queries
    #[sea_orm(nullable)]
    pub min_lng: Option<f64>,
    #[sea_orm(nullable)]
    pub min_lat: Option<f64>,
    #[sea_orm(nullable)]
    pub max_lng: Option<f64>,
    #[sea_orm(nullable)]
    pub max_lat: Option<f64>,

    pub city: String,
    #[sea_orm(nullable)]
    pub population: Option<i64>,
    #[sea_orm(nullable)]
    pub area_km2: Option<f64>,
    /// urban, suburban, rural, industrial, tourist, other
    pub district_type: String,
    #[sea_orm(nullable)]
    pub avg_income: Option<f64>,
    pub is_active: bool,

    /// Lowercased name, code and city for text search
    pub name_folded: String,
    pub code_folded: String,
    pub city_folded: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::store::Entity")]
    Stores,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        refold(&self.name, &mut self.name_folded);
        refold(&self.code, &mut self.code_folded);
        refold(&self.city, &mut self.city_folded);
        Ok(self)
    }
}
