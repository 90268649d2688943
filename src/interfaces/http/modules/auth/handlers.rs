//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use super::dto::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, TokenPair, VerifyRequest,
    VerifyResponse,
};
use crate::application::identity::UserService;
use crate::infrastructure::crypto::jwt::TokenType;
use crate::interfaces::http::common::{
    domain_error, ApiResponse, ApiResult, MessageResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub user_service: Arc<UserService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or disabled account")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = state
        .user_service
        .login(request.username.trim(), &request.password)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user: UserDto::from(auth.user),
        tokens: TokenPair {
            access: auth.access,
            refresh: auth.refresh,
        },
        token_type: "Bearer".to_string(),
        expires_in: auth.expires_in,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<RefreshResponse>),
        (status = 401, description = "Invalid, expired or revoked refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let access = state
        .user_service
        .refresh(&request.refresh_token)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(RefreshResponse { access })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid refresh token"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<AuthHandlerState>,
    axum::Extension(_user): axum::Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<MessageResponse> {
    state
        .user_service
        .logout(&request.refresh_token)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Successfully logged out",
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    tag = "Authentication",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<VerifyResponse>),
        (status = 401, description = "Token is invalid, expired or revoked")
    )
)]
pub async fn verify(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<VerifyRequest>,
) -> ApiResult<VerifyResponse> {
    let claims = state
        .user_service
        .verify(&request.token)
        .await
        .map_err(domain_error)?;

    let token_type = match claims.token_type {
        TokenType::Access => "access",
        TokenType::Refresh => "refresh",
    };
    Ok(Json(ApiResponse::success(VerifyResponse {
        valid: true,
        expires_at: claims.expires_at(),
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
        token_type: token_type.to_string(),
    })))
}
