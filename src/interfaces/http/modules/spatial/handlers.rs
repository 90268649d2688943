//! City-wide statistics and radius search

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::{SpatialOverviewDto, SpatialSearchParams, SpatialSearchResponse};
use crate::application::catalog::{SpatialService, StoreService};
use crate::interfaces::http::common::{
    bad_request, domain_error, parse_enum, parse_radius, require_coordinate, ApiResponse,
    ApiResult,
};
use crate::interfaces::http::modules::districts::PointDto;
use crate::interfaces::http::modules::stores::StoreDto;

#[derive(Clone)]
pub struct SpatialHandlerState {
    pub spatial: Arc<SpatialService>,
    pub stores: Arc<StoreService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/statistics",
    tag = "Spatial",
    responses(
        (status = 200, description = "Store distribution and geographic extent", body = ApiResponse<SpatialOverviewDto>)
    )
)]
pub async fn spatial_statistics(
    State(state): State<SpatialHandlerState>,
) -> ApiResult<SpatialOverviewDto> {
    let overview = state.spatial.overview().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(overview.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/spatial-search",
    tag = "Spatial",
    params(SpatialSearchParams),
    responses(
        (status = 200, description = "Active stores within the radius, closest first", body = ApiResponse<SpatialSearchResponse>),
        (status = 400, description = "Missing or invalid coordinates or radius")
    )
)]
pub async fn spatial_search(
    State(state): State<SpatialHandlerState>,
    Query(params): Query<SpatialSearchParams>,
) -> ApiResult<SpatialSearchResponse> {
    let center = require_coordinate(params.latitude.as_deref(), params.longitude.as_deref())?;
    let radius_km = parse_radius(params.radius_km.as_deref())?
        .ok_or_else(|| bad_request("radius_km is required"))?;
    let store_type = parse_enum(params.store_type.as_deref())?;

    let views = state
        .stores
        .within_radius(&center, radius_km, store_type)
        .await
        .map_err(domain_error)?;
    let stores: Vec<StoreDto> = views.into_iter().map(StoreDto::from).collect();

    Ok(Json(ApiResponse::success(SpatialSearchResponse {
        center: PointDto::from(center),
        radius_km,
        count: stores.len(),
        stores,
    })))
}
