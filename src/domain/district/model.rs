//! District domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::geo::{Boundary, BoundingBox, Coordinate};
use crate::shared::errors::DomainError;

/// Default city for districts and stores.
pub const DEFAULT_CITY: &str = "Ho Chi Minh City";

/// District classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DistrictType {
    #[default]
    Urban,
    Suburban,
    Rural,
    Industrial,
    Tourist,
    Other,
}

impl DistrictType {
    pub const ALL: [DistrictType; 6] = [
        Self::Urban,
        Self::Suburban,
        Self::Rural,
        Self::Industrial,
        Self::Tourist,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urban => "urban",
            Self::Suburban => "suburban",
            Self::Rural => "rural",
            Self::Industrial => "industrial",
            Self::Tourist => "tourist",
            Self::Other => "other",
        }
    }

    /// Infer the type from a Vietnamese administrative prefix
    /// (`QUẬN 1` → urban, `HUYỆN CỦ CHI` → rural).
    pub fn from_admin_prefix(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        if upper.starts_with("QUẬN") || upper.starts_with("QUAN ") || upper.starts_with("DISTRICT") {
            Self::Urban
        } else if upper.starts_with("THÀNH PHỐ") || upper.starts_with("THANH PHO") {
            Self::Suburban
        } else if upper.starts_with("HUYỆN") || upper.starts_with("HUYEN") {
            Self::Rural
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for DistrictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistrictType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Validation(format!("Unknown district type: {}", s)))
    }
}

/// Administrative district with an optional boundary
#[derive(Debug, Clone)]
pub struct District {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub boundary: Option<Boundary>,
    pub city: String,
    pub population: Option<i64>,
    pub area_km2: Option<f64>,
    pub district_type: DistrictType,
    pub avg_income: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl District {
    pub fn centroid(&self) -> Option<Coordinate> {
        self.boundary.as_ref().and_then(Boundary::centroid)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.boundary.as_ref().map(Boundary::bounding_box)
    }

    /// `false` when the district has no boundary.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.boundary
            .as_ref()
            .is_some_and(|boundary| boundary.contains(point))
    }
}

/// Input for creating a district
#[derive(Debug, Clone)]
pub struct NewDistrict {
    pub name: String,
    pub code: String,
    pub boundary: Option<Boundary>,
    pub city: Option<String>,
    pub population: Option<i64>,
    pub area_km2: Option<f64>,
    pub district_type: DistrictType,
    pub avg_income: Option<f64>,
    pub is_active: bool,
}

impl NewDistrict {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_code(&self.code)?;
        validate_figures(self.population, self.area_km2, self.avg_income)
    }
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct DistrictUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub boundary: Option<Boundary>,
    pub city: Option<String>,
    pub population: Option<i64>,
    pub area_km2: Option<f64>,
    pub district_type: Option<DistrictType>,
    pub avg_income: Option<f64>,
    pub is_active: Option<bool>,
}

impl DistrictUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        validate_figures(self.population, self.area_km2, self.avg_income)
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err(DomainError::Validation(
            "District name must be 1-100 characters".into(),
        ));
    }
    Ok(())
}

fn validate_code(code: &str) -> Result<(), DomainError> {
    let len = code.trim().chars().count();
    if len == 0 || len > 10 {
        return Err(DomainError::Validation(
            "District code must be 1-10 characters".into(),
        ));
    }
    Ok(())
}

fn validate_figures(
    population: Option<i64>,
    area_km2: Option<f64>,
    avg_income: Option<f64>,
) -> Result<(), DomainError> {
    if population.is_some_and(|p| p < 0) {
        return Err(DomainError::Validation("Population cannot be negative".into()));
    }
    if area_km2.is_some_and(|a| !(a > 0.0)) {
        return Err(DomainError::Validation("Area must be greater than 0".into()));
    }
    if avg_income.is_some_and(|i| !(i >= 0.0)) {
        return Err(DomainError::Validation(
            "Average income cannot be negative".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_district() -> NewDistrict {
        NewDistrict {
            name: "Quận 1".into(),
            code: "Q1".into(),
            boundary: None,
            city: None,
            population: Some(142_000),
            area_km2: Some(7.73),
            district_type: DistrictType::Urban,
            avg_income: None,
            is_active: true,
        }
    }

    #[test]
    fn district_type_parses_case_insensitively() {
        assert_eq!("Tourist".parse::<DistrictType>().unwrap(), DistrictType::Tourist);
        assert!("metropolis".parse::<DistrictType>().is_err());
    }

    #[test]
    fn district_type_from_vietnamese_prefix() {
        assert_eq!(DistrictType::from_admin_prefix("QUẬN 3"), DistrictType::Urban);
        assert_eq!(DistrictType::from_admin_prefix("Huyện Củ Chi"), DistrictType::Rural);
        assert_eq!(DistrictType::from_admin_prefix("THÀNH PHỐ THỦ ĐỨC"), DistrictType::Suburban);
        assert_eq!(DistrictType::from_admin_prefix("Cần Giờ"), DistrictType::Other);
    }

    #[test]
    fn validation_rejects_bad_figures() {
        assert!(new_district().validate().is_ok());

        let mut d = new_district();
        d.code = "TOO-LONG-CODE".into();
        assert!(d.validate().is_err());

        let mut d = new_district();
        d.area_km2 = Some(0.0);
        assert!(d.validate().is_err());

        let mut d = new_district();
        d.population = Some(-1);
        assert!(d.validate().is_err());
    }

    #[test]
    fn update_validates_only_present_fields() {
        assert!(DistrictUpdate::default().validate().is_ok());
        let update = DistrictUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
