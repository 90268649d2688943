//! Spatial overview and radius search DTOs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::catalog::SpatialOverview;
use crate::interfaces::http::modules::districts::PointDto;
use crate::interfaces::http::modules::stores::StoreDto;

#[derive(Debug, Serialize, ToSchema)]
pub struct SpatialOverviewDto {
    pub stores_by_district: BTreeMap<String, u64>,
    pub stores_by_type: BTreeMap<String, u64>,
    /// `[min_lng, min_lat, max_lng, max_lat]`; null without located stores
    #[schema(value_type = Option<Vec<f64>>)]
    pub extent: Option<[f64; 4]>,
    pub average_stores_per_district: f64,
}

impl From<SpatialOverview> for SpatialOverviewDto {
    fn from(o: SpatialOverview) -> Self {
        Self {
            stores_by_district: o.stores_by_district,
            stores_by_type: o.stores_by_type,
            extent: o.extent.map(|b| b.as_array()),
            average_stores_per_district: (o.average_stores_per_district * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SpatialSearchParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// 0.1-100
    pub radius_km: Option<String>,
    pub store_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpatialSearchResponse {
    pub center: PointDto,
    pub radius_km: f64,
    pub count: usize,
    pub stores: Vec<StoreDto>,
}
