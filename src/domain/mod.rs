//! Domain layer
//!
//! Aggregates, value objects and repository interfaces. Nothing here
//! knows about HTTP or the database driver.

pub mod district;
pub mod geo;
pub mod inventory;
pub mod item;
pub mod repositories;
pub mod store;
pub mod user;

// Re-export commonly used types
pub use district::{District, DistrictType};
pub use geo::{Boundary, BoundingBox, Coordinate, GeoError};
pub use inventory::{Inventory, InventoryRecord};
pub use item::{Item, ItemCategory};
pub use repositories::{DomainResult, RepositoryProvider};
pub use store::{Store, StoreType};
pub use user::{
    CreateUserDto, GetUserDto, Permission, UpdateUserDto, User, UserChangePasswordDto, UserRole,
    UserRepositoryInterface,
};

pub use crate::shared::errors::DomainError;
