//! Inventory module: stock rows linking stores and items
pub mod dto;
pub mod handlers;
pub use dto::*;
pub use handlers::*;
