//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{CreateUserDto, UpdateUserDto, User, UserChangePasswordDto, UserRole};

/// User API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            full_name: u.full_name(),
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            phone_number: u.phone_number,
            address: u.address,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
            last_login_at: u.last_login_at,
        }
    }
}

/// Create user request (administrators only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 150, message = "username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    pub password_confirm: String,
    /// Defaults to `guest`
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl CreateUserRequest {
    pub fn into_parts(self) -> (CreateUserDto, String) {
        (
            CreateUserDto {
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                first_name: self.first_name,
                last_name: self.last_name,
                role: self.role,
                phone_number: self.phone_number,
                address: self.address,
                password: self.password,
            },
            self.password_confirm,
        )
    }
}

/// Update user request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    /// Administrators only
    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UpdateUserDto {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            phone_number: r.phone_number,
            address: r.address,
            is_active: r.is_active,
        }
    }
}

/// Profile update for the current user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUserDto {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            phone_number: r.phone_number,
            address: r.address,
            is_active: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, max = 128, message = "new password must be 8-128 characters"))]
    pub new_password: String,
    pub new_password_confirm: String,
}

impl From<ChangePasswordRequest> for UserChangePasswordDto {
    fn from(r: ChangePasswordRequest) -> Self {
        Self {
            old_password: r.old_password,
            new_password: r.new_password,
            new_password_confirm: r.new_password_confirm,
        }
    }
}

/// List users query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Search by username, email, first or last name
    pub search: Option<String>,
    /// Filter by role (guest, administrator, brand_manager, store_manager)
    pub role: Option<String>,
    /// true/1/yes
    pub is_active: Option<String>,
    /// username, email, created_at or role; prefix `-` for descending
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
