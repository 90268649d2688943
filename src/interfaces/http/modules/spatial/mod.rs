//! Spatial module: city overview and radius search
pub mod dto;
pub mod handlers;
pub use dto::*;
pub use handlers::*;
