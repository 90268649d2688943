//! Identity: user management and authentication
//!
//! Contains the `UserService` which orchestrates all user-related
//! use-cases: login, token refresh/revocation, role-scoped user CRUD,
//! role changes and password changes.

pub mod service;

pub use service::{AuthResult, NewUserRequest, UserService};
