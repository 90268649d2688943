//! User aggregate
//!
//! Contains the User entity, role permissions, DTOs, and repository interfaces.

pub mod model;
pub mod repository;

mod dto_change_password;
mod dto_create;
mod dto_get;
mod dto_update;

// Re-export model types
pub use model::{
    is_valid_phone_number, Permission, User, UserRole, UserVisibility, MIN_PASSWORD_LEN,
};

// Re-export DTOs
pub use dto_change_password::UserChangePasswordDto;
pub use dto_create::CreateUserDto;
pub use dto_get::GetUserDto;
pub use dto_update::UpdateUserDto;

// Re-export repository traits
pub use repository::{RevokedTokenRepository, UserRepositoryInterface, USER_ORDERING};
