//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::district::DistrictRepository;
use super::inventory::InventoryRepository;
use super::item::ItemRepository;
use super::store::StoreRepository;
use super::user::{RevokedTokenRepository, UserRepositoryInterface};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let store = repos.stores().find_by_id(42).await?;
///     let counts = repos.inventory().count_by_store_ids(&[42]).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn districts(&self) -> &dyn DistrictRepository;
    fn stores(&self) -> &dyn StoreRepository;
    fn items(&self) -> &dyn ItemRepository;
    fn inventory(&self) -> &dyn InventoryRepository;
    fn users(&self) -> &dyn UserRepositoryInterface;
    fn revoked_tokens(&self) -> &dyn RevokedTokenRepository;
}
