//! Item (product) domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::errors::DomainError;

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Beverages,
    Snacks,
    Dairy,
    Frozen,
    Household,
    PersonalCare,
    #[default]
    Other,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 7] = [
        Self::Beverages,
        Self::Snacks,
        Self::Dairy,
        Self::Frozen,
        Self::Household,
        Self::PersonalCare,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beverages => "beverages",
            Self::Snacks => "snacks",
            Self::Dairy => "dairy",
            Self::Frozen => "frozen",
            Self::Household => "household",
            Self::PersonalCare => "personal_care",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Validation(format!("Unknown item category: {}", s)))
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: ItemCategory,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub category: ItemCategory,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub is_active: bool,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_labels(self.brand.as_deref(), self.barcode.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

impl ItemUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_labels(self.brand.as_deref(), self.barcode.as_deref())
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(DomainError::Validation(
            "Item name must be 1-255 characters".into(),
        ));
    }
    Ok(())
}

fn validate_labels(brand: Option<&str>, barcode: Option<&str>) -> Result<(), DomainError> {
    if brand.is_some_and(|b| b.chars().count() > 100) {
        return Err(DomainError::Validation(
            "Brand must be at most 100 characters".into(),
        ));
    }
    if barcode.is_some_and(|b| b.chars().count() > 50) {
        return Err(DomainError::Validation(
            "Barcode must be at most 50 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_care_uses_snake_case() {
        assert_eq!(ItemCategory::PersonalCare.as_str(), "personal_care");
        assert_eq!(
            serde_json::to_value(ItemCategory::PersonalCare).unwrap(),
            "personal_care"
        );
        assert_eq!(
            "PERSONAL_CARE".parse::<ItemCategory>().unwrap(),
            ItemCategory::PersonalCare
        );
    }

    #[test]
    fn barcode_length_is_checked() {
        let item = NewItem {
            name: "Aquafina 500ml".into(),
            description: None,
            category: ItemCategory::Beverages,
            brand: Some("PepsiCo".into()),
            barcode: Some("8".repeat(51)),
            is_active: true,
        };
        assert!(item.validate().is_err());
    }
}
