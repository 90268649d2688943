//! HTTP REST API
//!
//! - `common`: response envelope, error mapping and query parsing
//! - `middleware`: JWT authentication and role guards
//! - `modules`: DTOs and handlers per resource
//! - `router`: route table, OpenAPI document and layers

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::create_api_router;
