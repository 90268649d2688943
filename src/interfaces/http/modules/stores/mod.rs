//! Store module: CRUD, advanced search, nearest stores and store inventory
pub mod dto;
pub mod handlers;
pub use dto::*;
pub use handlers::*;
