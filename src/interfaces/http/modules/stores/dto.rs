//! Store DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::catalog::StoreView;
use crate::domain::geo::{m_to_km_rounded, Coordinate, GeoError};
use crate::domain::store::{NewStore, StoreStatistics, StoreUpdate};
use crate::domain::StoreType;
use crate::interfaces::http::common::PaginatedResponse;
use crate::interfaces::http::modules::districts::DistrictSummaryDto;

/// Store API representation
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreDto {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// `POINT (lng lat)`
    pub location_wkt: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub location_geojson: Option<Value>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub store_type: StoreType,
    pub store_type_label: String,
    pub district: Option<DistrictSummaryDto>,
    pub district_name: Option<String>,
    pub city: String,
    pub opening_hours: Option<String>,
    pub is_active: bool,
    pub rating: Option<f64>,
    pub inventory_count: u64,
    /// Present when a reference point was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoreView> for StoreDto {
    fn from(view: StoreView) -> Self {
        let district_name = view.district_name().map(str::to_string);
        let s = view.store;
        Self {
            location_wkt: s.location.as_ref().map(Coordinate::to_wkt),
            location_geojson: s.location.as_ref().map(Coordinate::to_geojson),
            latitude: s.location.map(|p| p.latitude()),
            longitude: s.location.map(|p| p.longitude()),
            store_type_label: s.store_type.label().to_string(),
            district: view.district.map(DistrictSummaryDto::from),
            district_name,
            distance_km: view.distance_m.map(m_to_km_rounded),
            inventory_count: view.inventory_count,
            id: s.id,
            name: s.name,
            address: s.address,
            phone: s.phone,
            email: s.email,
            store_type: s.store_type,
            city: s.city,
            opening_hours: s.opening_hours,
            is_active: s.is_active,
            rating: s.rating,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Detected from the name when omitted
    pub store_type: Option<StoreType>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    pub district_id: Option<i32>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub opening_hours: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

impl CreateStoreRequest {
    pub fn into_new(self) -> Result<NewStore, GeoError> {
        let name = self.name.trim().to_string();
        Ok(NewStore {
            location: Coordinate::from_parts(self.latitude, self.longitude)?,
            store_type: self
                .store_type
                .unwrap_or_else(|| StoreType::detect_from_name(&name)),
            name,
            address: self.address.trim().to_string(),
            phone: self.phone,
            email: self.email,
            district: self.district,
            district_id: self.district_id,
            city: self.city,
            opening_hours: self.opening_hours,
            is_active: self.is_active.unwrap_or(true),
            rating: self.rating,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "address cannot be empty"))]
    pub address: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub store_type: Option<StoreType>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    pub district_id: Option<i32>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub opening_hours: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

impl UpdateStoreRequest {
    pub fn into_update(self) -> Result<StoreUpdate, GeoError> {
        Ok(StoreUpdate {
            location: Coordinate::from_parts(self.latitude, self.longitude)?,
            name: self.name.map(|n| n.trim().to_string()),
            address: self.address.map(|a| a.trim().to_string()),
            phone: self.phone,
            email: self.email,
            store_type: self.store_type,
            district: self.district,
            district_id: self.district_id,
            city: self.city,
            opening_hours: self.opening_hours,
            is_active: self.is_active,
            rating: self.rating,
            clear_district: false,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StoreListParams {
    /// Brand chain, e.g. `circle-k`
    pub store_type: Option<String>,
    pub city: Option<String>,
    /// Exact free-text district name
    pub district: Option<String>,
    pub is_active: Option<String>,
    /// Matches name, address or city
    pub search: Option<String>,
    /// name, city, rating, created_at; `-` for descending
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StoreSearchParams {
    /// Matches name, address, city or district name
    pub search: Option<String>,
    /// District id, or part of its name
    pub district: Option<String>,
    pub store_type: Option<String>,
    pub is_active: Option<String>,
    /// Only stores with this item available
    pub inventory_item: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius_km: Option<String>,
    pub sort_by_distance: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Filters echoed back with a search result
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SearchMetadata {
    pub search: Option<String>,
    pub district: Option<String>,
    pub store_type: Option<StoreType>,
    pub is_active: Option<bool>,
    pub inventory_item: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub sort_by_distance: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreSearchResponse {
    #[serde(flatten)]
    pub results: PaginatedResponse<StoreDto>,
    pub search_metadata: SearchMetadata,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NearestParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// 1-100, default 10
    pub limit: Option<u32>,
    pub store_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StoreInventoryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreStatisticsDto {
    pub total_stores: u64,
    pub active_stores: u64,
    pub stores_by_type: BTreeMap<String, u64>,
    pub stores_by_district: BTreeMap<String, u64>,
    pub average_rating: f64,
    pub total_inventory_items: u64,
}

impl From<StoreStatistics> for StoreStatisticsDto {
    fn from(s: StoreStatistics) -> Self {
        Self {
            total_stores: s.total,
            active_stores: s.active,
            stores_by_type: s.by_type,
            stores_by_district: s.by_district,
            average_rating: (s.average_rating * 100.0).round() / 100.0,
            total_inventory_items: s.total_inventory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(lat: Option<f64>, lng: Option<f64>) -> CreateStoreRequest {
        CreateStoreRequest {
            name: "  Circle K Le Loi ".into(),
            address: "1 Le Loi".into(),
            phone: None,
            email: None,
            latitude: lat,
            longitude: lng,
            store_type: None,
            district: None,
            district_id: None,
            city: None,
            opening_hours: None,
            is_active: None,
            rating: None,
        }
    }

    #[test]
    fn create_request_detects_type_and_trims_name() {
        let new = create(Some(10.77), Some(106.70)).into_new().unwrap();
        assert_eq!(new.name, "Circle K Le Loi");
        assert_eq!(new.store_type, StoreType::CircleK);
        assert!(new.is_active);
        assert_eq!(new.location.unwrap().latitude(), 10.77);
    }

    #[test]
    fn half_a_coordinate_is_rejected() {
        assert_eq!(
            create(Some(10.77), None).into_new().unwrap_err(),
            GeoError::IncompleteCoordinate
        );
        assert!(create(Some(91.0), Some(106.0)).into_new().is_err());
    }
}
