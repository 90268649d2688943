//! Query-string helpers
//!
//! Filters arrive as raw strings so that malformed values produce the
//! standard error envelope instead of a bare extractor rejection.

use std::str::FromStr;

use super::errors::{bad_request, domain_error, ApiError};
use crate::domain::geo::Coordinate;
use crate::shared::errors::DomainError;
use crate::shared::PageRequest;

/// `true`, `1` and `yes` (any case) are true; everything else is false.
/// Missing or blank values mean "not given".
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(matches!(raw.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Parse an optional enum filter; blank values are ignored.
pub fn parse_enum<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map(Some).map_err(domain_error),
        None => Ok(None),
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| bad_request(format!("Invalid {}: {}", name, value))),
        None => Ok(None),
    }
}

/// Parse a `latitude`/`longitude` pair. Both or neither must be given.
pub fn parse_coordinate(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Option<Coordinate>, ApiError> {
    let lat = parse_number("latitude", latitude)?;
    let lng = parse_number("longitude", longitude)?;
    Coordinate::from_parts(lat, lng).map_err(|e| bad_request(e.to_string()))
}

/// Like [`parse_coordinate`], but the point is mandatory.
pub fn require_coordinate(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Coordinate, ApiError> {
    parse_coordinate(latitude, longitude)?
        .ok_or_else(|| bad_request("latitude and longitude are required"))
}

pub fn parse_radius(raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    parse_number("radius_km", raw)
}

pub fn page_request(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    PageRequest::new(page, limit)
}
