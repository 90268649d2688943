//! Item aggregate

pub mod model;
pub mod repository;

pub use model::{Item, ItemCategory, ItemUpdate, NewItem};
pub use repository::{ItemFilter, ItemRepository, ItemStatistics, ITEM_ORDERING};
