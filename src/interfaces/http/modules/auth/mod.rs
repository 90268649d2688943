//! Auth module: login, token refresh, logout and verification

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
