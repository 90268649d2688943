//! Inventory API handlers
//!
//! Reads are public; writes need a role that manages brand or store
//! inventory.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateInventoryRequest, InventoryDto, InventoryListParams, InventorySearchParams,
    InventoryStatisticsDto, NearbyParams, UpdateInventoryRequest,
};
use crate::application::catalog::{InventorySearch, InventoryService};
use crate::domain::inventory::InventoryFilter;
use crate::interfaces::http::common::{
    bad_request, domain_error, page_request, parse_enum, parse_flag, parse_radius,
    require_coordinate, ApiError, ApiResponse, ApiResult, MessageResponse, PaginatedResponse,
};
use crate::interfaces::http::middleware::{require_inventory_manager, MaybeUser};

#[derive(Clone)]
pub struct InventoryHandlerState {
    pub service: Arc<InventoryService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    tag = "Inventory",
    params(InventoryListParams),
    responses(
        (status = 200, description = "Paginated inventory", body = ApiResponse<PaginatedResponse<InventoryDto>>),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_inventory(
    State(state): State<InventoryHandlerState>,
    Query(params): Query<InventoryListParams>,
) -> ApiResult<PaginatedResponse<InventoryDto>> {
    let filter = InventoryFilter {
        store_id: params.store,
        item_id: params.item,
        category: parse_enum(params.category.as_deref())?,
        is_available: parse_flag(params.is_available.as_deref()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };
    let result = state
        .service
        .list(
            &filter,
            params.ordering.as_deref(),
            page_request(params.page, params.limit),
        )
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        InventoryDto::from,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Inventory row created", body = ApiResponse<InventoryDto>),
        (status = 400, description = "Unknown store or item"),
        (status = 403, description = "Inventory managers only"),
        (status = 409, description = "Store already lists this item")
    )
)]
pub async fn create_inventory(
    State(state): State<InventoryHandlerState>,
    user: MaybeUser,
    Json(request): Json<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryDto>>), ApiError> {
    require_inventory_manager(user)?;
    let record = state
        .service
        .create(request.into())
        .await
        .map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(InventoryDto::from(record))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    tag = "Inventory",
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 200, description = "Inventory row", body = ApiResponse<InventoryDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_inventory(
    State(state): State<InventoryHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<InventoryDto> {
    let record = state.service.get(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(InventoryDto::from(record))))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Inventory ID")),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Inventory row updated", body = ApiResponse<InventoryDto>),
        (status = 403, description = "Inventory managers only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Store already lists this item")
    )
)]
pub async fn update_inventory(
    State(state): State<InventoryHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateInventoryRequest>,
) -> ApiResult<InventoryDto> {
    require_inventory_manager(user)?;
    let record = state
        .service
        .update(id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(InventoryDto::from(record))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 200, description = "Inventory row deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Inventory managers only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_inventory(
    State(state): State<InventoryHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
) -> ApiResult<MessageResponse> {
    require_inventory_manager(user)?;
    state.service.delete(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Inventory deleted",
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/nearby",
    tag = "Inventory",
    params(NearbyParams),
    responses(
        (status = 200, description = "Inventory at stores within the radius, closest first", body = ApiResponse<Vec<InventoryDto>>),
        (status = 400, description = "Missing or invalid coordinates or radius")
    )
)]
pub async fn nearby_inventory(
    State(state): State<InventoryHandlerState>,
    Query(params): Query<NearbyParams>,
) -> ApiResult<Vec<InventoryDto>> {
    let point = require_coordinate(params.latitude.as_deref(), params.longitude.as_deref())?;
    let radius_km = parse_radius(params.radius_km.as_deref())?
        .ok_or_else(|| bad_request("radius_km is required"))?;
    let category = parse_enum(params.category.as_deref())?;
    let rows = state
        .service
        .nearby(&point, radius_km, category)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(InventoryDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/search",
    tag = "Inventory",
    params(InventorySearchParams),
    responses(
        (status = 200, description = "Matching inventory", body = ApiResponse<PaginatedResponse<InventoryDto>>),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn search_inventory(
    State(state): State<InventoryHandlerState>,
    Query(params): Query<InventorySearchParams>,
) -> ApiResult<PaginatedResponse<InventoryDto>> {
    let search = InventorySearch {
        item_name: params.item_name,
        category: parse_enum(params.category.as_deref())?,
        available_only: parse_flag(params.available_only.as_deref()).unwrap_or(false),
    };
    let result = state
        .service
        .search(search, page_request(params.page, params.limit))
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        InventoryDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/statistics",
    tag = "Inventory",
    responses(
        (status = 200, description = "Inventory statistics", body = ApiResponse<InventoryStatisticsDto>)
    )
)]
pub async fn inventory_statistics(
    State(state): State<InventoryHandlerState>,
) -> ApiResult<InventoryStatisticsDto> {
    let stats = state.service.statistics().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/available-items",
    tag = "Inventory",
    responses(
        (status = 200, description = "Sorted names of items available somewhere", body = ApiResponse<Vec<String>>)
    )
)]
pub async fn available_items(
    State(state): State<InventoryHandlerState>,
) -> ApiResult<Vec<String>> {
    let names = state.service.available_items().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(names)))
}
