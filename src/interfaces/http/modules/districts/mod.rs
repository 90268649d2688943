//! District module: CRUD, search, containment lookup and density
pub mod dto;
pub mod handlers;
pub use dto::*;
pub use handlers::*;
