//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::district::DistrictRepository;
use crate::domain::inventory::InventoryRepository;
use crate::domain::item::ItemRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::store::StoreRepository;
use crate::domain::user::{RevokedTokenRepository, UserRepositoryInterface};

use super::district_repository::SeaOrmDistrictRepository;
use super::inventory_repository::SeaOrmInventoryRepository;
use super::item_repository::SeaOrmItemRepository;
use super::revoked_token_repository::SeaOrmRevokedTokenRepository;
use super::store_repository::SeaOrmStoreRepository;
use super::user_repository::UserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let store = repos.stores().find_by_id(42).await?;
/// let district = repos.districts().find_by_name("Quận 1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    districts: SeaOrmDistrictRepository,
    stores: SeaOrmStoreRepository,
    items: SeaOrmItemRepository,
    inventory: SeaOrmInventoryRepository,
    users: UserRepository,
    revoked_tokens: SeaOrmRevokedTokenRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            districts: SeaOrmDistrictRepository::new(db.clone()),
            stores: SeaOrmStoreRepository::new(db.clone()),
            items: SeaOrmItemRepository::new(db.clone()),
            inventory: SeaOrmInventoryRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            revoked_tokens: SeaOrmRevokedTokenRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn districts(&self) -> &dyn DistrictRepository {
        &self.districts
    }

    fn stores(&self) -> &dyn StoreRepository {
        &self.stores
    }

    fn items(&self) -> &dyn ItemRepository {
        &self.items
    }

    fn inventory(&self) -> &dyn InventoryRepository {
        &self.inventory
    }

    fn users(&self) -> &dyn UserRepositoryInterface {
        &self.users
    }

    fn revoked_tokens(&self) -> &dyn RevokedTokenRepository {
        &self.revoked_tokens
    }
}
