//! Item API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateItemRequest, ItemDto, ItemListParams, ItemSearchParams, ItemStatisticsDto,
    UpdateItemRequest,
};
use crate::application::catalog::ItemService;
use crate::domain::item::ItemFilter;
use crate::interfaces::http::common::{
    domain_error, page_request, parse_enum, parse_flag, ApiError, ApiResponse, ApiResult,
    MessageResponse, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::{require_admin, MaybeUser};
use crate::interfaces::http::modules::stores::StoreDto;

#[derive(Clone)]
pub struct ItemHandlerState {
    pub service: Arc<ItemService>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn page_of(
    state: &ItemHandlerState,
    filter: ItemFilter,
    ordering: Option<&str>,
    page: Option<u32>,
    limit: Option<u32>,
) -> ApiResult<PaginatedResponse<ItemDto>> {
    let result = state
        .service
        .list(&filter, ordering, page_request(page, limit))
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        ItemDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "Items",
    params(ItemListParams),
    responses(
        (status = 200, description = "Paginated items", body = ApiResponse<PaginatedResponse<ItemDto>>),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_items(
    State(state): State<ItemHandlerState>,
    Query(params): Query<ItemListParams>,
) -> ApiResult<PaginatedResponse<ItemDto>> {
    let filter = ItemFilter {
        category: parse_enum(params.category.as_deref())?,
        brand: non_blank(params.brand),
        is_active: parse_flag(params.is_active.as_deref()),
        search: non_blank(params.search),
        ..Default::default()
    };
    page_of(
        &state,
        filter,
        params.ordering.as_deref(),
        params.page,
        params.limit,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/v1/items/search",
    tag = "Items",
    params(ItemSearchParams),
    responses(
        (status = 200, description = "Matching items", body = ApiResponse<PaginatedResponse<ItemDto>>),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn search_items(
    State(state): State<ItemHandlerState>,
    Query(params): Query<ItemSearchParams>,
) -> ApiResult<PaginatedResponse<ItemDto>> {
    let filter = ItemFilter {
        name_contains: non_blank(params.name),
        category: parse_enum(params.category.as_deref())?,
        brand_contains: non_blank(params.brand),
        available_only: parse_flag(params.available_only.as_deref()).unwrap_or(false),
        ..Default::default()
    };
    page_of(&state, filter, None, params.page, params.limit).await
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrators only"),
        (status = 409, description = "Barcode already exists")
    )
)]
pub async fn create_item(
    State(state): State<ItemHandlerState>,
    user: MaybeUser,
    ValidatedJson(request): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ItemDto>>), ApiError> {
    require_admin(user)?;
    let view = state
        .service
        .create(request.into())
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ItemDto::from(view))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    tag = "Items",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ApiResponse<ItemDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_item(
    State(state): State<ItemHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<ItemDto> {
    let view = state.service.get(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ItemDto::from(view))))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<ItemDto>),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Barcode already exists")
    )
)]
pub async fn update_item(
    State(state): State<ItemHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateItemRequest>,
) -> ApiResult<ItemDto> {
    require_admin(user)?;
    let view = state
        .service
        .update(id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ItemDto::from(view))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item and its inventory deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_item(
    State(state): State<ItemHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
) -> ApiResult<MessageResponse> {
    require_admin(user)?;
    state.service.delete(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Item deleted"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/statistics",
    tag = "Items",
    responses(
        (status = 200, description = "Item statistics", body = ApiResponse<ItemStatisticsDto>)
    )
)]
pub async fn item_statistics(
    State(state): State<ItemHandlerState>,
) -> ApiResult<ItemStatisticsDto> {
    let stats = state.service.statistics().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/stores",
    tag = "Items",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Stores listing the item", body = ApiResponse<Vec<StoreDto>>),
        (status = 404, description = "Not found")
    )
)]
pub async fn item_stores(
    State(state): State<ItemHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<StoreDto>> {
    let stores = state.service.stores(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        stores.into_iter().map(StoreDto::from).collect(),
    )))
}
