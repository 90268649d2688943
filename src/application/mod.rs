//! Application layer: use-case services over the repository traits.

pub mod catalog;
pub mod identity;
pub mod import;

pub use catalog::{
    DistrictService, InventoryService, ItemService, SpatialService, StoreService,
};
pub use identity::{AuthResult, NewUserRequest, UserService};
pub use import::{ImportReport, ImportService};
