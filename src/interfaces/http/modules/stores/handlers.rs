//! Store API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateStoreRequest, NearestParams, SearchMetadata, StoreDto, StoreInventoryParams,
    StoreListParams, StoreSearchParams, StoreSearchResponse, StoreStatisticsDto,
    UpdateStoreRequest,
};
use crate::application::catalog::{StoreSearch, StoreService};
use crate::domain::store::{DistrictMatch, StoreFilter};
use crate::interfaces::http::common::{
    bad_request, domain_error, page_request, parse_coordinate, parse_enum, parse_flag,
    parse_radius, require_coordinate, ApiError, ApiResponse, ApiResult, MessageResponse,
    PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::{require_admin, MaybeUser};
use crate::interfaces::http::modules::inventory::InventoryDto;

#[derive(Clone)]
pub struct StoreHandlerState {
    pub service: Arc<StoreService>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A numeric `district` selects by id, anything else by partial name.
fn district_match(raw: Option<String>) -> Option<DistrictMatch> {
    non_blank(raw).map(|d| match d.parse::<i32>() {
        Ok(id) => DistrictMatch::Id(id),
        Err(_) => DistrictMatch::NameContains(d),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/stores",
    tag = "Stores",
    params(StoreListParams),
    responses(
        (status = 200, description = "Paginated stores", body = ApiResponse<PaginatedResponse<StoreDto>>),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_stores(
    State(state): State<StoreHandlerState>,
    Query(params): Query<StoreListParams>,
) -> ApiResult<PaginatedResponse<StoreDto>> {
    let filter = StoreFilter {
        store_type: parse_enum(params.store_type.as_deref())?,
        city: non_blank(params.city),
        district: non_blank(params.district).map(DistrictMatch::Name),
        is_active: parse_flag(params.is_active.as_deref()),
        search: non_blank(params.search),
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
        StoreDto::from,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stores",
    tag = "Stores",
    security(("bearer_auth" = [])),
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created", body = ApiResponse<StoreDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn create_store(
    State(state): State<StoreHandlerState>,
    user: MaybeUser,
    ValidatedJson(request): ValidatedJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoreDto>>), ApiError> {
    require_admin(user)?;
    let new = request
        .into_new()
        .map_err(|e| bad_request(e.to_string()))?;
    let view = state.service.create(new).await.map_err(domain_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StoreDto::from(view))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}",
    tag = "Stores",
    params(("id" = i32, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store details", body = ApiResponse<StoreDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_store(
    State(state): State<StoreHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<StoreDto> {
    let view = state.service.get(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(StoreDto::from(view))))
}

#[utoipa::path(
    put,
    path = "/api/v1/stores/{id}",
    tag = "Stores",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store ID")),
    request_body = UpdateStoreRequest,
    responses(
        (status = 200, description = "Store updated", body = ApiResponse<StoreDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_store(
    State(state): State<StoreHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateStoreRequest>,
) -> ApiResult<StoreDto> {
    require_admin(user)?;
    let update = request
        .into_update()
        .map_err(|e| bad_request(e.to_string()))?;
    let view = state
        .service
        .update(id, update)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(StoreDto::from(view))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stores/{id}",
    tag = "Stores",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store and its inventory deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_store(
    State(state): State<StoreHandlerState>,
    user: MaybeUser,
    Path(id): Path<i32>,
) -> ApiResult<MessageResponse> {
    require_admin(user)?;
    state.service.delete(id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Store deleted"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/search",
    tag = "Stores",
    params(StoreSearchParams),
    responses(
        (status = 200, description = "Search results with the applied filters", body = ApiResponse<StoreSearchResponse>),
        (status = 400, description = "Invalid coordinates, radius or filter value")
    )
)]
pub async fn search_stores(
    State(state): State<StoreHandlerState>,
    Query(params): Query<StoreSearchParams>,
) -> ApiResult<StoreSearchResponse> {
    let reference = parse_coordinate(params.latitude.as_deref(), params.longitude.as_deref())?;
    let radius_km = parse_radius(params.radius_km.as_deref())?;
    let sort_by_distance = parse_flag(params.sort_by_distance.as_deref()).unwrap_or(false);
    let store_type = parse_enum(params.store_type.as_deref())?;
    let is_active = parse_flag(params.is_active.as_deref());
    let search = non_blank(params.search);
    let district = non_blank(params.district);
    let inventory_item = non_blank(params.inventory_item);

    let metadata = SearchMetadata {
        search: search.clone(),
        district: district.clone(),
        store_type,
        is_active,
        inventory_item: inventory_item.clone(),
        latitude: reference.map(|p| p.latitude()),
        longitude: reference.map(|p| p.longitude()),
        radius_km,
        sort_by_distance,
    };

    let criteria = StoreSearch {
        filter: StoreFilter {
            store_type,
            district: district_match(district),
            is_active,
            search,
            search_district_name: true,
            inventory_item,
            ..Default::default()
        },
        reference,
        radius_km,
        sort_by_distance,
    };
    let result = state
        .service
        .search(criteria, page_request(params.page, params.limit))
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(StoreSearchResponse {
        results: PaginatedResponse::from_result(result, StoreDto::from),
        search_metadata: metadata,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/nearest",
    tag = "Stores",
    params(NearestParams),
    responses(
        (status = 200, description = "Closest active stores", body = ApiResponse<Vec<StoreDto>>),
        (status = 400, description = "Missing or invalid coordinates")
    )
)]
pub async fn nearest_stores(
    State(state): State<StoreHandlerState>,
    Query(params): Query<NearestParams>,
) -> ApiResult<Vec<StoreDto>> {
    let point = require_coordinate(params.latitude.as_deref(), params.longitude.as_deref())?;
    let store_type = parse_enum(params.store_type.as_deref())?;
    let views = state
        .service
        .nearest(&point, params.limit, store_type)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        views.into_iter().map(StoreDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/statistics",
    tag = "Stores",
    responses(
        (status = 200, description = "Store statistics", body = ApiResponse<StoreStatisticsDto>)
    )
)]
pub async fn store_statistics(
    State(state): State<StoreHandlerState>,
) -> ApiResult<StoreStatisticsDto> {
    let stats = state.service.statistics().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}/inventory",
    tag = "Stores",
    params(("id" = i32, Path, description = "Store ID"), StoreInventoryParams),
    responses(
        (status = 200, description = "Inventory of the store", body = ApiResponse<PaginatedResponse<InventoryDto>>),
        (status = 404, description = "Store not found")
    )
)]
pub async fn store_inventory(
    State(state): State<StoreHandlerState>,
    Path(id): Path<i32>,
    Query(params): Query<StoreInventoryParams>,
) -> ApiResult<PaginatedResponse<InventoryDto>> {
    let result = state
        .service
        .inventory(id, page_request(params.page, params.limit))
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        result,
        InventoryDto::from,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_param_is_id_or_partial_name() {
        assert_eq!(district_match(Some("7".into())), Some(DistrictMatch::Id(7)));
        assert_eq!(
            district_match(Some(" Binh Thanh ".into())),
            Some(DistrictMatch::NameContains("Binh Thanh".into()))
        );
        assert_eq!(district_match(Some("  ".into())), None);
        assert_eq!(district_match(None), None);
    }
}
