//! Geographic value objects
//!
//! Coordinates are WGS84 degrees. Distances are great-circle metres;
//! polygon tests are planar in lon/lat, which is accurate enough at the
//! scale of a city district.

mod boundary;
mod coordinate;

pub use boundary::{Boundary, Polygon, Ring};
pub use coordinate::{BoundingBox, Coordinate, EARTH_RADIUS_M};

use thiserror::Error;

/// Invalid geometry input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Latitude must be between -90 and 90 (got {0})")]
    InvalidLatitude(f64),

    #[error("Longitude must be between -180 and 180 (got {0})")]
    InvalidLongitude(f64),

    #[error("Latitude and longitude must be provided together")]
    IncompleteCoordinate,

    #[error("Ring must contain at least 3 distinct positions")]
    DegenerateRing,

    #[error("Boundary must contain at least one polygon")]
    EmptyBoundary,

    #[error("Boundary must be a Polygon or MultiPolygon geometry (got {0})")]
    UnsupportedGeometry(String),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
}

/// Convert a radius in kilometres to metres.
pub fn km_to_m(km: f64) -> f64 {
    km * 1000.0
}

/// Round a metre distance to kilometres with 3 decimals for display.
pub fn m_to_km_rounded(m: f64) -> f64 {
    m.round() / 1000.0
}

impl From<GeoError> for crate::shared::errors::DomainError {
    fn from(e: GeoError) -> Self {
        crate::shared::errors::DomainError::Validation(e.to_string())
    }
}
