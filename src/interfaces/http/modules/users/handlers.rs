//! User management API handlers
//!
//! Visibility and management rules live in `UserService`; handlers only
//! translate requests and map errors.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    ChangePasswordRequest, ChangeRoleRequest, CreateUserRequest, ListUsersParams,
    UpdateProfileRequest, UpdateUserRequest, UserDto,
};
use crate::application::identity::{NewUserRequest, UserService};
use crate::domain::GetUserDto;
use crate::interfaces::http::common::{
    domain_error, parse_enum, parse_flag, ApiError, ApiResponse, ApiResult, MessageResponse,
    PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct UserHandlerState {
    pub user_service: Arc<UserService>,
}

fn list_dto(params: ListUsersParams, default_ordering: &'static str) -> Result<GetUserDto, ApiError> {
    Ok(GetUserDto {
        search: params.search.filter(|s| !s.trim().is_empty()),
        role: parse_enum(params.role.as_deref())?,
        is_active: parse_flag(params.is_active.as_deref()),
        page: params.page,
        limit: params.limit,
        ordering: params.ordering,
        default_ordering,
        ..Default::default()
    })
}

async fn list_with(
    state: &UserHandlerState,
    user: &AuthenticatedUser,
    dto: GetUserDto,
) -> ApiResult<PaginatedResponse<UserDto>> {
    let result = state
        .user_service
        .list_users(&user.user_id, dto)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        UserDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "Users visible to the caller", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<PaginatedResponse<UserDto>> {
    let dto = list_dto(params, "-created_at")?;
    list_with(&state, &user, dto).await
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "Matching users, by username", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn search_users(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<PaginatedResponse<UserDto>> {
    let dto = list_dto(params, "username")?;
    list_with(&state, &user, dto).await
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrators only"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let (dto, password_confirm) = request.into_parts();
    let created = state
        .user_service
        .create_user(
            &user.user_id,
            NewUserRequest {
                user: dto,
                password_confirm,
            },
        )
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(created))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserDto> {
    let me = state
        .user_service
        .current_user(&user.user_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(me))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_profile(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserDto> {
    let updated = state
        .user_service
        .update_profile(&user.user_id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<UserDto> {
    let found = state
        .user_service
        .get_user(&user.user_id, &id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(found))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 403, description = "Caller cannot manage this user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDto> {
    let updated = state
        .user_service
        .update_user(&user.user_id, &id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Caller cannot manage this user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    state
        .user_service
        .delete_user(&user.user_id, &id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new("User deleted"))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/change-role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserDto>),
        (status = 403, description = "Administrators only; not on self"),
        (status = 404, description = "Not found")
    )
)]
pub async fn change_role(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> ApiResult<UserDto> {
    let updated = state
        .user_service
        .change_role(&user.user_id, &id, request.role)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/change-password",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Old password wrong or confirmation mismatch"),
        (status = 403, description = "Only on own account")
    )
)]
pub async fn change_password(
    State(state): State<UserHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    state
        .user_service
        .change_password(&user.user_id, &id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed",
    ))))
}
