use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CreateUserDto, GetUserDto, UpdateUserDto, User, UserRole};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

/// Sortable columns for user listings
pub const USER_ORDERING: &[&str] = &["username", "email", "created_at", "role"];

#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User>;

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>>;
    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn count_users(&self) -> DomainResult<u64>;

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>>;
    async fn update_user_password(&self, id: &str, new_password_hash: &str) -> DomainResult<()>;
    async fn update_user_role(&self, id: &str, role: UserRole) -> DomainResult<User>;
    async fn touch_last_login(&self, id: &str) -> DomainResult<()>;
    async fn delete_user(&self, id: &str) -> DomainResult<()>;
}

/// Refresh tokens revoked by logout, keyed by `jti`
#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> DomainResult<()>;
    async fn is_revoked(&self, jti: &str) -> DomainResult<bool>;
    /// Drop entries whose token has expired anyway. Returns rows removed.
    async fn purge_expired(&self) -> DomainResult<u64>;
}
