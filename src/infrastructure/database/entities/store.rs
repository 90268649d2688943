//! Store entity

use sea_orm::entity::prelude::*;
use sea_orm::ConnectionTrait;

use super::{refold, refold_opt};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// WGS84; both set or both null
    #[sea_orm(nullable)]
    pub latitude: Option<f64>,
    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    /// Chain identifier (7-eleven, circle-k, ...)
    pub store_type: String,
    /// Free-text district name
    #[sea_orm(nullable)]
    pub district: Option<String>,
    #[sea_orm(nullable)]
    pub district_id: Option<i32>,
    pub city: String,
    #[sea_orm(nullable)]
    pub opening_hours: Option<String>,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub rating: Option<f64>,

    /// Lowercased copies for text search
    pub name_folded: String,
    pub address_folded: String,
    pub city_folded: String,
    pub district_folded: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::district::Entity",
        from = "Column::DistrictId",
        to = "super::district::Column::Id",
        on_delete = "SetNull"
    )]
    District,
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::district::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::District.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        refold(&self.name, &mut self.name_folded);
        refold(&self.address, &mut self.address_folded);
        refold(&self.city, &mut self.city_folded);
        refold_opt(&self.district, &mut self.district_folded);
        Ok(self)
    }
}
