//! Item (product) entity

use sea_orm::entity::prelude::*;
use sea_orm::ConnectionTrait;

use super::{refold, refold_opt};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// beverages, snacks, dairy, frozen, household, personal_care, other
    pub category: String,
    #[sea_orm(nullable)]
    pub brand: Option<String>,
    #[sea_orm(unique, nullable)]
    pub barcode: Option<String>,
    pub is_active: bool,

    /// Lowercased copies for text search
    pub name_folded: String,
    pub description_folded: String,
    pub brand_folded: String,
    pub barcode_folded: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
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
        refold_opt(&self.description, &mut self.description_folded);
        refold_opt(&self.brand, &mut self.brand_folded);
        refold_opt(&self.barcode, &mut self.barcode_folded);
        Ok(self)
    }
}
