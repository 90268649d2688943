//! User management service
//!
//! All user-related business logic lives here.
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::user::{is_valid_phone_number, MIN_PASSWORD_LEN};
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, RepositoryProvider, UpdateUserDto, User,
    UserChangePasswordDto, UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig, TokenClaims, TokenType};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::PaginatedResult;

/// Tokens issued by a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access: String,
    pub refresh: String,
    pub expires_in: i64,
    pub user: User,
}

/// Administrator-submitted account
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    pub user: CreateUserDto,
    pub password_confirm: String,
}

/// Login, token lifecycle and role-scoped user management.
pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self { repos, jwt_config }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by username or email and issue an access/refresh pair.
    pub async fn login(&self, username_or_email: &str, password: &str) -> DomainResult<AuthResult> {
        let users = self.repos.users();
        let user = match users.get_user_by_username(username_or_email).await? {
            Some(user) => Some(user),
            None => users.get_user_by_email(username_or_email).await?,
        };

        let Some(user) = user else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            warn!(username = %user.username, "Failed login attempt");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let access = self.issue(&user, TokenType::Access)?;
        let refresh = self.issue(&user, TokenType::Refresh)?;
        users.touch_last_login(&user.id).await?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(AuthResult {
            access,
            refresh,
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<String> {
        let claims = verify_token(refresh_token, &self.jwt_config)
            .map_err(|_| DomainError::Unauthorized("Invalid or expired refresh token".into()))?;
        if claims.token_type != TokenType::Refresh {
            return Err(DomainError::Unauthorized("Not a refresh token".into()));
        }
        if self.repos.revoked_tokens().is_revoked(&claims.jti).await? {
            return Err(DomainError::Unauthorized("Refresh token has been revoked".into()));
        }

        let user = self
            .repos
            .users()
            .get_user_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| DomainError::Unauthorized("User no longer active".into()))?;

        self.issue(&user, TokenType::Access)
    }

    /// Revoke a refresh token.
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        let claims = verify_token(refresh_token, &self.jwt_config)
            .map_err(|_| DomainError::Validation("Invalid refresh token".into()))?;
        if claims.token_type != TokenType::Refresh {
            return Err(DomainError::Validation("Not a refresh token".into()));
        }

        let revoked = self.repos.revoked_tokens();
        revoked.revoke(&claims.jti, claims.expires_at()).await?;
        let purged = revoked.purge_expired().await?;
        if purged > 0 {
            info!(purged, "Purged expired revoked tokens");
        }

        info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    /// Check any token (access or refresh) for validity.
    pub async fn verify(&self, token: &str) -> DomainResult<TokenClaims> {
        let claims = verify_token(token, &self.jwt_config)
            .map_err(|_| DomainError::Unauthorized("Token is invalid or expired".into()))?;
        if claims.token_type == TokenType::Refresh
            && self.repos.revoked_tokens().is_revoked(&claims.jti).await?
        {
            return Err(DomainError::Unauthorized("Token has been revoked".into()));
        }
        Ok(claims)
    }

    fn issue(&self, user: &User, token_type: TokenType) -> DomainResult<String> {
        create_token(
            &user.id,
            &user.username,
            user.role.as_str(),
            token_type,
            &self.jwt_config,
        )
        .map_err(|e| DomainError::Validation(format!("Failed to create token: {}", e)))
    }

    // ── Queries ─────────────────────────────────────────────────

    /// The authenticated user behind a token subject.
    pub async fn current_user(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| DomainError::Unauthorized("User not found or disabled".into()))
    }

    /// List users visible to `actor_id`.
    pub async fn list_users(
        &self,
        actor_id: &str,
        mut dto: GetUserDto,
    ) -> DomainResult<PaginatedResult<User>> {
        let actor = self.current_user(actor_id).await?;
        dto.visibility = actor.visibility();
        self.repos.users().list_users(dto).await
    }

    /// A single user; users outside the actor's visibility are reported missing.
    pub async fn get_user(&self, actor_id: &str, id: &str) -> DomainResult<User> {
        let actor = self.current_user(actor_id).await?;
        self.visible_user(&actor, id).await
    }

    async fn visible_user(&self, actor: &User, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(id)
            .await?
            .filter(|target| actor.can_view(target))
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Create an account. Administrators only.
    pub async fn create_user(&self, actor_id: &str, request: NewUserRequest) -> DomainResult<User> {
        let actor = self.current_user(actor_id).await?;
        if !actor.is_administrator() {
            return Err(DomainError::Forbidden(
                "Only administrators can create users".into(),
            ));
        }
        self.register(request).await
    }

    async fn register(&self, request: NewUserRequest) -> DomainResult<User> {
        let NewUserRequest {
            user: dto,
            password_confirm,
        } = request;

        check_new_password(&dto.password, &password_confirm)?;
        check_phone(dto.phone_number.as_deref())?;

        let users = self.repos.users();
        if users.get_user_by_username(&dto.username).await?.is_some() {
            return Err(DomainError::Conflict("Username already exists".into()));
        }
        if users.get_user_by_email(&dto.email).await?.is_some() {
            return Err(DomainError::Conflict("Email already exists".into()));
        }

        let user = users.create_user(dto).await?;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Create the first administrator when the users table is empty.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<Option<User>> {
        if self.repos.users().count_users().await? > 0 {
            return Ok(None);
        }

        let user = self
            .repos
            .users()
            .create_user(CreateUserDto {
                username: username.to_string(),
                email: email.to_string(),
                first_name: "System".into(),
                last_name: "Administrator".into(),
                role: Some(UserRole::Administrator),
                phone_number: None,
                address: None,
                password: password.to_string(),
            })
            .await?;
        Ok(Some(user))
    }

    /// Update profile fields of a user the actor may manage.
    pub async fn update_user(
        &self,
        actor_id: &str,
        id: &str,
        dto: UpdateUserDto,
    ) -> DomainResult<User> {
        let actor = self.current_user(actor_id).await?;
        let target = self.visible_user(&actor, id).await?;
        if !actor.can_manage(&target) {
            return Err(DomainError::Forbidden(
                "You do not have permission to update this user".into(),
            ));
        }
        if dto.is_active.is_some() && !actor.is_administrator() {
            return Err(DomainError::Forbidden(
                "Only administrators can activate or deactivate users".into(),
            ));
        }
        self.apply_update(id, dto).await
    }

    /// Update the actor's own profile. Account status cannot be changed here.
    pub async fn update_profile(&self, actor_id: &str, mut dto: UpdateUserDto) -> DomainResult<User> {
        self.current_user(actor_id).await?;
        dto.is_active = None;
        self.apply_update(actor_id, dto).await
    }

    async fn apply_update(&self, id: &str, dto: UpdateUserDto) -> DomainResult<User> {
        check_phone(dto.phone_number.as_deref())?;
        self.repos
            .users()
            .update_user(id, dto)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    /// Delete a user the actor may manage.
    pub async fn delete_user(&self, actor_id: &str, id: &str) -> DomainResult<()> {
        let actor = self.current_user(actor_id).await?;
        let target = self.visible_user(&actor, id).await?;
        if !actor.can_manage(&target) {
            return Err(DomainError::Forbidden(
                "You do not have permission to delete this user".into(),
            ));
        }
        self.repos.users().delete_user(id).await?;
        info!(user_id = %id, deleted_by = %actor.id, "User deleted");
        Ok(())
    }

    /// Change another user's role. Administrators only, never on themselves.
    pub async fn change_role(&self, actor_id: &str, id: &str, role: UserRole) -> DomainResult<User> {
        let actor = self.current_user(actor_id).await?;
        if !actor.is_administrator() {
            return Err(DomainError::Forbidden(
                "Only administrators can change roles".into(),
            ));
        }
        if actor.id == id {
            return Err(DomainError::Forbidden("You cannot change your own role".into()));
        }
        let user = self.repos.users().update_user_role(id, role).await?;
        info!(user_id = %id, role = %role, "User role changed");
        Ok(user)
    }

    /// Change a password. Users may only change their own.
    pub async fn change_password(
        &self,
        actor_id: &str,
        id: &str,
        dto: UserChangePasswordDto,
    ) -> DomainResult<()> {
        let actor = self.current_user(actor_id).await?;
        if actor.id != id {
            return Err(DomainError::Forbidden(
                "You can only change your own password".into(),
            ));
        }

        let valid = verify_password(&dto.old_password, &actor.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Validation("Old password is incorrect".into()));
        }
        check_new_password(&dto.new_password, &dto.new_password_confirm)?;

        let new_hash = hash_password(&dto.new_password)
            .map_err(|e| DomainError::Validation(format!("Failed to hash password: {}", e)))?;
        self.repos.users().update_user_password(id, &new_hash).await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn check_new_password(password: &str, confirm: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm {
        return Err(DomainError::Validation("Passwords do not match".into()));
    }
    Ok(())
}

fn check_phone(phone: Option<&str>) -> DomainResult<()> {
    match phone {
        Some(p) if !p.is_empty() && !is_valid_phone_number(p) => Err(DomainError::Validation(
            "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
                .into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::memory_db;
    use crate::infrastructure::SeaOrmRepositoryProvider;

    async fn service() -> UserService {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        UserService::new(
            repos,
            JwtConfig {
                secret: "test".into(),
                ..Default::default()
            },
        )
    }

    fn request(username: &str, role: UserRole) -> NewUserRequest {
        NewUserRequest {
            user: CreateUserDto {
                username: username.into(),
                email: format!("{username}@example.com"),
                first_name: "Test".into(),
                last_name: "User".into(),
                role: Some(role),
                phone_number: None,
                address: None,
                password: "password123".into(),
            },
            password_confirm: "password123".into(),
        }
    }

    async fn admin(svc: &UserService) -> User {
        svc.bootstrap_admin("admin", "admin@example.com", "admin-pass")
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_empty_table() {
        let svc = service().await;
        admin(&svc).await;
        let again = svc
            .bootstrap_admin("admin2", "admin2@example.com", "admin-pass")
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn login_refresh_logout_cycle() {
        let svc = service().await;
        admin(&svc).await;

        assert!(matches!(
            svc.login("admin", "wrong").await,
            Err(DomainError::Unauthorized(_))
        ));

        let auth = svc.login("admin@example.com", "admin-pass").await.unwrap();
        assert!(auth.user.is_administrator());
        assert!(svc.refresh(&auth.refresh).await.is_ok());
        // An access token cannot be used to refresh
        assert!(svc.refresh(&auth.access).await.is_err());

        svc.logout(&auth.refresh).await.unwrap();
        assert!(matches!(
            svc.refresh(&auth.refresh).await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(svc.verify(&auth.access).await.is_ok());
        assert!(svc.verify(&auth.refresh).await.is_err());
    }

    #[tokio::test]
    async fn only_administrators_create_users() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let guest = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap();

        let err = svc
            .create_user(&guest.id, request("other", UserRole::Guest))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_checks_password_confirmation() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let mut req = request("lan", UserRole::Guest);
        req.password_confirm = "different123".into();
        assert!(matches!(
            svc.create_user(&admin.id, req).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn store_manager_sees_and_manages_guests_only() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let manager = svc
            .create_user(&admin.id, request("manager", UserRole::StoreManager))
            .await
            .unwrap();
        let guest = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap();

        let page = svc.list_users(&manager.id, GetUserDto::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, guest.id);

        assert!(matches!(
            svc.get_user(&manager.id, &admin.id).await,
            Err(DomainError::NotFound { .. })
        ));

        let updated = svc
            .update_user(
                &manager.id,
                &guest.id,
                UpdateUserDto {
                    first_name: Some("Minh".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Minh");

        assert!(matches!(
            svc.delete_user(&guest.id, &guest.id).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn role_change_rules() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let guest = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap();

        let promoted = svc
            .change_role(&admin.id, &guest.id, UserRole::BrandManager)
            .await
            .unwrap();
        assert_eq!(promoted.role, UserRole::BrandManager);

        assert!(matches!(
            svc.change_role(&admin.id, &admin.id, UserRole::Guest).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.change_role(&guest.id, &admin.id, UserRole::Guest).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn password_change_is_self_service() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let guest = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap();

        let dto = UserChangePasswordDto {
            old_password: "password123".into(),
            new_password: "new-password".into(),
            new_password_confirm: "new-password".into(),
        };
        assert!(matches!(
            svc.change_password(&admin.id, &guest.id, dto.clone()).await,
            Err(DomainError::Forbidden(_))
        ));

        svc.change_password(&guest.id, &guest.id, dto).await.unwrap();
        assert!(svc.login("guest", "new-password").await.is_ok());
    }

    #[tokio::test]
    async fn only_administrators_change_account_status() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let manager = svc
            .create_user(&admin.id, request("manager", UserRole::StoreManager))
            .await
            .unwrap();
        let guest = svc
            .create_user(&admin.id, request("guest", UserRole::Guest))
            .await
            .unwrap();

        let deactivate = UpdateUserDto {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_user(&manager.id, &guest.id, deactivate.clone()).await,
            Err(DomainError::Forbidden(_))
        ));
        let unchanged = svc.get_user(&admin.id, &guest.id).await.unwrap();
        assert!(unchanged.is_active);
        assert_eq!(unchanged.email, "guest@example.com");

        let disabled = svc.update_user(&admin.id, &guest.id, deactivate).await.unwrap();
        assert!(!disabled.is_active);
        assert!(svc.login("guest", "password123").await.is_err());
    }

    #[tokio::test]
    async fn administrators_may_delete_their_own_account() {
        let svc = service().await;
        let admin = admin(&svc).await;
        let second = svc
            .create_user(&admin.id, request("second", UserRole::Administrator))
            .await
            .unwrap();

        svc.delete_user(&second.id, &second.id).await.unwrap();
        assert!(matches!(
            svc.get_user(&admin.id, &second.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
