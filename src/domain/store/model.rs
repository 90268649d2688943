//! Store domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::geo::Coordinate;
use crate::shared::errors::DomainError;

/// Convenience-store chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum StoreType {
    #[serde(rename = "7-eleven")]
    SevenEleven,
    #[serde(rename = "satrafoods")]
    Satrafoods,
    #[serde(rename = "familymart")]
    FamilyMart,
    #[serde(rename = "ministop")]
    Ministop,
    #[serde(rename = "bach-hoa-xanh")]
    BachHoaXanh,
    #[serde(rename = "gs25")]
    Gs25,
    #[serde(rename = "circle-k")]
    CircleK,
    #[serde(rename = "winmart")]
    Winmart,
    #[serde(rename = "coopxtra")]
    CoopXtra,
    #[default]
    #[serde(rename = "other")]
    Other,
}

impl StoreType {
    pub const ALL: [StoreType; 10] = [
        Self::SevenEleven,
        Self::Satrafoods,
        Self::FamilyMart,
        Self::Ministop,
        Self::BachHoaXanh,
        Self::Gs25,
        Self::CircleK,
        Self::Winmart,
        Self::CoopXtra,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenEleven => "7-eleven",
            Self::Satrafoods => "satrafoods",
            Self::FamilyMart => "familymart",
            Self::Ministop => "ministop",
            Self::BachHoaXanh => "bach-hoa-xanh",
            Self::Gs25 => "gs25",
            Self::CircleK => "circle-k",
            Self::Winmart => "winmart",
            Self::CoopXtra => "coopxtra",
            Self::Other => "other",
        }
    }

    /// Human readable chain name
    pub fn label(&self) -> &'static str {
        match self {
            Self::SevenEleven => "7-Eleven",
            Self::Satrafoods => "Satrafoods",
            Self::FamilyMart => "FamilyMart",
            Self::Ministop => "Ministop",
            Self::BachHoaXanh => "Bách Hóa Xanh",
            Self::Gs25 => "GS25",
            Self::CircleK => "Circle K",
            Self::Winmart => "WinMart",
            Self::CoopXtra => "Co.opXtra",
            Self::Other => "Other",
        }
    }

    /// Guess the chain from a store name such as `"Circle K Lê Lợi"`.
    pub fn detect_from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("7-eleven") {
            Self::SevenEleven
        } else if lower.contains("ministop") {
            Self::Ministop
        } else if lower.contains("winmart") || name.starts_with("WIN ") {
            Self::Winmart
        } else if lower.contains("circle k") {
            Self::CircleK
        } else if lower.contains("familymart") {
            Self::FamilyMart
        } else if lower.contains("gs25") {
            Self::Gs25
        } else if lower.contains("bách hóa xanh") || lower.contains("bach hoa xanh") {
            Self::BachHoaXanh
        } else if lower.contains("co.opxtra") || lower.contains("coopxtra") {
            Self::CoopXtra
        } else if lower.contains("satrafoods") {
            Self::Satrafoods
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Validation(format!("Unknown store type: {}", s)))
    }
}

/// Retail location
#[derive(Debug, Clone)]
pub struct Store {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<Coordinate>,
    pub store_type: StoreType,
    /// Free-text district name, kept alongside `district_id`
    pub district: Option<String>,
    pub district_id: Option<i32>,
    pub city: String,
    pub opening_hours: Option<String>,
    pub is_active: bool,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Distance to `point` in metres; `None` without a location.
    pub fn distance_to(&self, point: &Coordinate) -> Option<f64> {
        self.location.map(|loc| loc.distance_meters(point))
    }
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<Coordinate>,
    pub store_type: StoreType,
    pub district: Option<String>,
    pub district_id: Option<i32>,
    pub city: Option<String>,
    pub opening_hours: Option<String>,
    pub is_active: bool,
    pub rating: Option<f64>,
}

impl NewStore {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_address(&self.address)?;
        validate_optional(
            self.phone.as_deref(),
            self.district.as_deref(),
            self.opening_hours.as_deref(),
            self.rating,
        )
    }
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<Coordinate>,
    pub store_type: Option<StoreType>,
    pub district: Option<String>,
    pub district_id: Option<i32>,
    pub city: Option<String>,
    pub opening_hours: Option<String>,
    pub is_active: Option<bool>,
    pub rating: Option<f64>,
    /// Unlink the district and clear the free-text name. Set fields above
    /// still win.
    pub clear_district: bool,
}

impl StoreUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(address) = &self.address {
            validate_address(address)?;
        }
        validate_optional(
            self.phone.as_deref(),
            self.district.as_deref(),
            self.opening_hours.as_deref(),
            self.rating,
        )
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(DomainError::Validation(
            "Store name must be 1-255 characters".into(),
        ));
    }
    Ok(())
}

fn validate_address(address: &str) -> Result<(), DomainError> {
    if address.trim().is_empty() {
        return Err(DomainError::Validation("Address is required".into()));
    }
    Ok(())
}

fn validate_optional(
    phone: Option<&str>,
    district: Option<&str>,
    opening_hours: Option<&str>,
    rating: Option<f64>,
) -> Result<(), DomainError> {
    if phone.is_some_and(|p| p.chars().count() > 20) {
        return Err(DomainError::Validation(
            "Phone must be at most 20 characters".into(),
        ));
    }
    if district.is_some_and(|d| d.chars().count() > 100) {
        return Err(DomainError::Validation(
            "District name must be at most 100 characters".into(),
        ));
    }
    if opening_hours.is_some_and(|h| h.chars().count() > 100) {
        return Err(DomainError::Validation(
            "Opening hours must be at most 100 characters".into(),
        ));
    }
    if rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        return Err(DomainError::Validation(
            "Rating must be between 0 and 5".into(),
        ));
    }
    Ok(())
}
