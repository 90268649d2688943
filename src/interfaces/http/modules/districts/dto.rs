//! District DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::catalog::{DistrictDensity, DistrictSummary, DistrictView};
use crate::domain::district::{DistrictStatistics, DistrictUpdate, NewDistrict};
use crate::domain::geo::{Boundary, Coordinate, GeoError};
use crate::domain::DistrictType;

/// `{latitude, longitude}` pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct PointDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for PointDto {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude(),
            longitude: c.longitude(),
        }
    }
}

/// District API representation
#[derive(Debug, Serialize, ToSchema)]
pub struct DistrictDto {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub city: String,
    pub population: Option<i64>,
    pub area_km2: Option<f64>,
    pub district_type: DistrictType,
    pub avg_income: Option<f64>,
    pub is_active: bool,
    /// `MULTIPOLYGON(...)`
    pub boundary_wkt: Option<String>,
    /// GeoJSON MultiPolygon
    #[schema(value_type = Option<Object>)]
    pub boundary_geojson: Option<Value>,
    pub centroid: Option<PointDto>,
    pub store_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DistrictView> for DistrictDto {
    fn from(view: DistrictView) -> Self {
        let d = view.district;
        Self {
            centroid: d.centroid().map(PointDto::from),
            boundary_wkt: d.boundary.as_ref().map(Boundary::to_wkt),
            boundary_geojson: d.boundary.as_ref().map(Boundary::to_geojson),
            id: d.id,
            name: d.name,
            code: d.code,
            city: d.city,
            population: d.population,
            area_km2: d.area_km2,
            district_type: d.district_type,
            avg_income: d.avg_income,
            is_active: d.is_active,
            store_count: view.store_count,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// Short district reference nested in other resources
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DistrictSummaryDto {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub district_type: DistrictType,
}

impl From<DistrictSummary> for DistrictSummaryDto {
    fn from(s: DistrictSummary) -> Self {
        Self {
            id: s.id,
            name: s.name,
            code: s.code,
            district_type: s.district_type,
        }
    }
}

fn parse_boundary(raw: Option<Value>) -> Result<Option<Boundary>, GeoError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Boundary::from_geojson_str(&s).map(Some),
        Some(v) => Boundary::from_geojson(&v).map(Some),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDistrictRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "code must be 1-10 characters"))]
    pub code: String,
    /// GeoJSON Polygon or MultiPolygon (object or string)
    #[schema(value_type = Option<Object>)]
    pub boundary: Option<Value>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0, message = "population cannot be negative"))]
    pub population: Option<i64>,
    #[validate(range(exclusive_min = 0.0, message = "area must be greater than 0"))]
    pub area_km2: Option<f64>,
    pub district_type: Option<DistrictType>,
    #[validate(range(min = 0.0, message = "average income cannot be negative"))]
    pub avg_income: Option<f64>,
    pub is_active: Option<bool>,
}

impl CreateDistrictRequest {
    pub fn into_new(self) -> Result<NewDistrict, GeoError> {
        Ok(NewDistrict {
            boundary: parse_boundary(self.boundary)?,
            name: self.name.trim().to_string(),
            code: self.code.trim().to_string(),
            city: self.city,
            population: self.population,
            area_km2: self.area_km2,
            district_type: self.district_type.unwrap_or_default(),
            avg_income: self.avg_income,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDistrictRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 10, message = "code must be 1-10 characters"))]
    pub code: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub boundary: Option<Value>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0, message = "population cannot be negative"))]
    pub population: Option<i64>,
    #[validate(range(exclusive_min = 0.0, message = "area must be greater than 0"))]
    pub area_km2: Option<f64>,
    pub district_type: Option<DistrictType>,
    #[validate(range(min = 0.0, message = "average income cannot be negative"))]
    pub avg_income: Option<f64>,
    pub is_active: Option<bool>,
}

impl UpdateDistrictRequest {
    pub fn into_update(self) -> Result<DistrictUpdate, GeoError> {
        Ok(DistrictUpdate {
            boundary: parse_boundary(self.boundary)?,
            name: self.name.map(|n| n.trim().to_string()),
            code: self.code.map(|c| c.trim().to_string()),
            city: self.city,
            population: self.population,
            area_km2: self.area_km2,
            district_type: self.district_type,
            avg_income: self.avg_income,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DistrictListParams {
    pub city: Option<String>,
    /// urban, suburban, rural, industrial, tourist, other
    pub district_type: Option<String>,
    /// true/1/yes
    pub is_active: Option<String>,
    /// Matches name, code or city
    pub search: Option<String>,
    /// name, city, population, area_km2, avg_income, created_at; `-` for descending
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DistrictSearchParams {
    pub district_id: Option<i32>,
    /// Contains-match on the name
    pub district_name: Option<String>,
    pub district_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LocateParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistrictStatisticsDto {
    pub total_districts: u64,
    pub active_districts: u64,
    pub districts_by_type: BTreeMap<String, u64>,
    pub total_population: i64,
    pub average_area_km2: f64,
    pub average_income: f64,
}

impl From<DistrictStatistics> for DistrictStatisticsDto {
    fn from(s: DistrictStatistics) -> Self {
        Self {
            total_districts: s.total,
            active_districts: s.active,
            districts_by_type: s.by_type,
            total_population: s.total_population,
            average_area_km2: s.average_area_km2,
            average_income: s.average_income,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistrictDensityDto {
    pub district: DistrictSummaryDto,
    pub store_count: u64,
    pub average_rating: f64,
    pub area_km2: Option<f64>,
    /// Stores per square kilometre, when the area is known
    pub stores_per_km2: Option<f64>,
}

impl From<DistrictDensity> for DistrictDensityDto {
    fn from(row: DistrictDensity) -> Self {
        let d = &row.view.district;
        let count = row.view.store_count;
        Self {
            district: DistrictSummary::from(d).into(),
            store_count: count,
            average_rating: (row.average_rating * 100.0).round() / 100.0,
            area_km2: d.area_km2,
            stores_per_km2: d.area_km2.map(|a| count as f64 / a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boundary_accepts_object_string_or_null() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[106.6, 10.7], [106.7, 10.7], [106.7, 10.8], [106.6, 10.7]]]
        });
        assert!(parse_boundary(Some(polygon.clone())).unwrap().is_some());
        assert!(parse_boundary(Some(Value::String(polygon.to_string()))).unwrap().is_some());
        assert!(parse_boundary(Some(Value::Null)).unwrap().is_none());
        assert!(parse_boundary(Some(json!({"type": "Point", "coordinates": [1, 2]}))).is_err());
    }
}
