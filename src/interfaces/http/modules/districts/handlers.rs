//! District API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateDistrictRequest, DistrictDensityDto, DistrictDto, DistrictListParams,
    DistrictSearchParams, DistrictStatisticsDto, LocateParams, UpdateDistrictRequest,
};
use crate::application::catalog::{DistrictSearch, DistrictService};
use crate::domain::district::DistrictFilter;
use crate::interfaces::http::common::{
    bad_request, domain_error, page_request, parse_enum, parse_flag, require_coordinate, ApiError,
    ApiResponse, ApiResult, MessageResponse, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::{require_admin, MaybeUser};
use crate::interfaces::http::modules::stores::StoreDto;

#[derive(Clone)]
pub struct DistrictHandlerState {
    pub service: Arc<DistrictService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/districts",
    tag = "Districts",
    params(DistrictListParams),
    responses(
        (status = 200, description = "Paginated districts", body = ApiResponse<PaginatedResponse<DistrictDto>>),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_districts(
    State(state): State<DistrictHandlerState>,
    Query(params): Query<DistrictListParams>,
) -> ApiResult<PaginatedResponse<DistrictDto>> {
    let filter = DistrictFilter {
        city: params.city.filter(|c| !c.trim().is_empty()),
        district_type: parse_enum(params.district_type.as_deref())?,
        is_active: parse_flag(params.is_active.as_deref()),
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
        DistrictDto::from,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/districts",
    tag = "Districts",
    security(("bearer_auth" = [])),
    request_body = CreateDistrictRequest,
    responses(
        (status = 201, description = "District created", body = ApiResponse<DistrictDto>),
        (status = 400, description = "Validation error or malformed boundary"),
        (status = 403, description = "Administrators only"),
        (status = 409, description = "Name or code already exists")
    )
)]
pub async fn create_district(
    State(state): State<DistrictHandlerState>,
    user: MaybeUser,
    ValidatedJson(request): ValidatedJson<CreateDistrictRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DistrictDto>>), ApiError> {
    require_admin(user)?;
    let new = request
        .into_new()
        .map_err(|e| bad_request(e.to_string()))?;
    let view = state.service.create(new).await.map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(DistrictDto::from(view))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/{id}",
    tag = "Districts",
    params(("id" = i32, Path, description = "District ID")),
    responses(
        (status = 200, description = "District details", body = ApiResponse<DistrictDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_district(
    State(state): State<DistrictHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<DistrictDto> {
    let view = state.service.get(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(DistrictDto::from(view))))
}

#[utoipa::path(
    put,
    path = "/api/v1/districts/{id}",
    tag = "Districts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "District ID")),
    request_body = UpdateDistrictRequest,
    responses(
        (status = 200, description = "District updated", body = ApiResponse<DistrictDto>),
        (status = 400, description = "Validation error or malformed boundary"),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_district(
    State(state): State<DistrictHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateDistrictRequest>,
) -> ApiResult<DistrictDto> {
    require_admin(user)?;
    let update = request
        .into_update()
        .map_err(|e| bad_request(e.to_string()))?;
    let view = state
        .service
        .update(id, update)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(DistrictDto::from(view))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/districts/{id}",
    tag = "Districts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "District ID")),
    responses(
        (status = 200, description = "District deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_district(
    State(state): State<DistrictHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
) -> ApiResult<MessageResponse> {
    require_admin(user)?;
    state.service.delete(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "District deleted",
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/search",
    tag = "Districts",
    params(DistrictSearchParams),
    responses(
        (status = 200, description = "Matching districts", body = ApiResponse<Vec<DistrictDto>>),
        (status = 400, description = "No criteria given")
    )
)]
pub async fn search_districts(
    State(state): State<DistrictHandlerState>,
    Query(params): Query<DistrictSearchParams>,
) -> ApiResult<Vec<DistrictDto>> {
    let criteria = DistrictSearch {
        district_id: params.district_id,
        district_name: params.district_name,
        district_type: parse_enum(params.district_type.as_deref())?,
    };
    let views = state.service.search(criteria).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        views.into_iter().map(DistrictDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/statistics",
    tag = "Districts",
    responses(
        (status = 200, description = "District statistics", body = ApiResponse<DistrictStatisticsDto>)
    )
)]
pub async fn district_statistics(
    State(state): State<DistrictHandlerState>,
) -> ApiResult<DistrictStatisticsDto> {
    let stats = state.service.statistics().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/density",
    tag = "Districts",
    responses(
        (status = 200, description = "Active districts by store count", body = ApiResponse<Vec<DistrictDensityDto>>)
    )
)]
pub async fn district_density(
    State(state): State<DistrictHandlerState>,
) -> ApiResult<Vec<DistrictDensityDto>> {
    let rows = state.service.density().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(DistrictDensityDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/locate",
    tag = "Districts",
    params(LocateParams),
    responses(
        (status = 200, description = "District containing the point", body = ApiResponse<DistrictDto>),
        (status = 400, description = "Missing or invalid coordinates"),
        (status = 404, description = "Point is outside every district")
    )
)]
pub async fn locate_district(
    State(state): State<DistrictHandlerState>,
    Query(params): Query<LocateParams>,
) -> ApiResult<DistrictDto> {
    let point = require_coordinate(params.latitude.as_deref(), params.longitude.as_deref())?;
    let view = state
        .service
        .locate(&point)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("No district contains this point")),
            )
        })?;
    Ok(Json(ApiResponse::success(DistrictDto::from(view))))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/{id}/stores",
    tag = "Districts",
    params(("id" = i32, Path, description = "District ID")),
    responses(
        (status = 200, description = "Stores inside the district", body = ApiResponse<Vec<StoreDto>>),
        (status = 404, description = "Not found")
    )
)]
pub async fn district_stores(
    State(state): State<DistrictHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<StoreDto>> {
    let stores = state.service.stores(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        stores.into_iter().map(StoreDto::from).collect(),
    )))
}
