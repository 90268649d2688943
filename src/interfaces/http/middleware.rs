//! Authentication middleware for Axum
//!
//! `auth_middleware` guards routes that always need a user;
//! `optional_auth_middleware` only attaches one when a valid access token is
//! present, leaving the decision to the handler (public catalog reads,
//! role-checked writes).
//!
//! The token only identifies the user. Role and active status are read from
//! the database on every request, so a demotion or deactivation applies to
//! tokens issued before it.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::debug;

use crate::application::UserService;
use crate::domain::{Permission, User, UserRole};
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims, TokenType};

use super::common::ApiError;

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    WrongTokenType,
    UnknownUser,
    InsufficientPermissions,
}

impl AuthError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
            Self::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token has expired"),
            Self::WrongTokenType => (StatusCode::UNAUTHORIZED, "Access token required"),
            Self::UnknownUser => (StatusCode::UNAUTHORIZED, "User not found or disabled"),
            Self::InsufficientPermissions => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        }
    }
}

/// Authentication state
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
    pub user_service: Arc<UserService>,
}

/// Authenticated user as currently stored
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

impl AuthenticatedUser {

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Administrator
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn verify_bearer(request: &Request<Body>, config: &JwtConfig) -> Result<TokenClaims, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = extract_token(auth_header).ok_or(AuthError::InvalidToken)?;

    let claims = verify_token(token, config).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::InvalidToken
    })?;
    if claims.is_expired() {
        return Err(AuthError::ExpiredToken);
    }
    if claims.token_type != TokenType::Access {
        return Err(AuthError::WrongTokenType);
    }
    Ok(claims)
}

fn authenticate<'a>(
    request: &Request<Body>,
    state: &'a AuthState,
) -> impl std::future::Future<Output = Result<AuthenticatedUser, AuthError>> + Send + 'a {
    let claims = verify_bearer(request, &state.jwt_config);
    async move {
        let claims = claims?;
        let user = state
            .user_service
            .current_user(&claims.sub)
            .await
            .map_err(|e| {
                debug!(user_id = %claims.sub, error = %e, "Token subject is not an active user");
                AuthError::UnknownUser
            })?;
        Ok(user.into())
    }
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&request, &auth_state).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => auth_error_response(e),
    }
}

/// Optional authentication middleware
pub async fn optional_auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Ok(user) = authenticate(&request, &auth_state).await {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = error.status_and_message();
    let body = Json(json!({
        "success": false,
        "error": message
    }));

    (status, body).into_response()
}

fn reject(error: AuthError) -> ApiError {
    let (status, message) = error.status_and_message();
    (status, Json(super::common::ApiResponse::error(message)))
}

// ── Handler-side guards ─────────────────────────────────────────

pub type MaybeUser = Option<Extension<AuthenticatedUser>>;

/// Any authenticated user.
pub fn require_user(user: MaybeUser) -> Result<AuthenticatedUser, ApiError> {
    user.map(|Extension(u)| u).ok_or_else(|| reject(AuthError::MissingToken))
}

/// Catalog writes: administrators only.
pub fn require_admin(user: MaybeUser) -> Result<AuthenticatedUser, ApiError> {
    let user = require_user(user)?;
    if !user.is_admin() {
        return Err(reject(AuthError::InsufficientPermissions));
    }
    Ok(user)
}

/// Inventory writes: brand or store inventory managers (and administrators).
pub fn require_inventory_manager(user: MaybeUser) -> Result<AuthenticatedUser, ApiError> {
    let user = require_user(user)?;
    if !user.role.can_manage_inventory() {
        return Err(reject(AuthError::InsufficientPermissions));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RepositoryProvider, UpdateUserDto};
    use crate::infrastructure::crypto::jwt::create_token;
    use crate::infrastructure::database::testing::memory_db;
    use crate::infrastructure::SeaOrmRepositoryProvider;

    fn request_with(header_value: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn auth_state() -> (AuthState, Arc<dyn RepositoryProvider>) {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let jwt_config = JwtConfig::default();
        let state = AuthState {
            user_service: Arc::new(UserService::new(repos.clone(), jwt_config.clone())),
            jwt_config,
        };
        (state, repos)
    }

    #[test]
    fn access_token_is_accepted() {
        let config = JwtConfig::default();
        let token = create_token("u-1", "lan", "store_manager", TokenType::Access, &config).unwrap();
        let claims = verify_bearer(&request_with(Some(format!("Bearer {token}"))), &config).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_and_malformed_tokens_are_rejected() {
        let config = JwtConfig::default();
        let refresh = create_token("u-1", "lan", "guest", TokenType::Refresh, &config).unwrap();
        assert!(matches!(
            verify_bearer(&request_with(Some(format!("Bearer {refresh}"))), &config),
            Err(AuthError::WrongTokenType)
        ));
        assert!(matches!(
            verify_bearer(&request_with(None), &config),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            verify_bearer(&request_with(Some("Token abc".into())), &config),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn role_comes_from_the_stored_user() {
        let (state, _) = auth_state().await;
        let admin = state
            .user_service
            .bootstrap_admin("admin", "admin@example.com", "admin-pass")
            .await
            .unwrap()
            .unwrap();

        // Claims say guest, the account is an administrator.
        let token = create_token(&admin.id, "admin", "guest", TokenType::Access, &state.jwt_config).unwrap();
        let user = authenticate(&request_with(Some(format!("Bearer {token}"))), &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, admin.id);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn unknown_or_disabled_users_are_rejected() {
        let (state, repos) = auth_state().await;
        let ghost = create_token("missing", "ghost", "administrator", TokenType::Access, &state.jwt_config).unwrap();
        let err = authenticate(&request_with(Some(format!("Bearer {ghost}"))), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownUser));
        assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);

        let admin = state
            .user_service
            .bootstrap_admin("admin", "admin@example.com", "admin-pass")
            .await
            .unwrap()
            .unwrap();
        let token = create_token(&admin.id, "admin", "administrator", TokenType::Access, &state.jwt_config).unwrap();
        repos
            .users()
            .update_user(
                &admin.id,
                UpdateUserDto {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            authenticate(&request_with(Some(format!("Bearer {token}"))), &state).await,
            Err(AuthError::UnknownUser)
        ));
    }

    #[test]
    fn role_guards() {
        let user = |role| {
            Some(Extension(AuthenticatedUser {
                user_id: "u".into(),
                username: "u".into(),
                role,
            }))
        };
        assert!(require_admin(user(UserRole::Administrator)).is_ok());
        assert_eq!(
            require_admin(user(UserRole::BrandManager)).unwrap_err().0,
            StatusCode::FORBIDDEN
        );
        assert!(require_inventory_manager(user(UserRole::StoreManager)).is_ok());
        assert!(require_inventory_manager(user(UserRole::Guest)).is_err());
        assert_eq!(require_user(None).unwrap_err().0, StatusCode::UNAUTHORIZED);
    }
}
