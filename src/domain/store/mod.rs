//! Store aggregate

pub mod model;
pub mod repository;

pub use model::{NewStore, Store, StoreType, StoreUpdate};
pub use repository::{
    DistrictMatch, StoreFilter, StoreRepository, StoreStatistics, STORE_ORDERING,
    UNASSIGNED_DISTRICT,
};
