//! Item DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::catalog::ItemView;
use crate::domain::item::{ItemStatistics, ItemUpdate, NewItem};
use crate::domain::ItemCategory;

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: ItemCategory,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub is_active: bool,
    /// Stores listing the item
    pub store_count: u64,
    /// Stores where it is currently available
    pub available_stores: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemView> for ItemDto {
    fn from(view: ItemView) -> Self {
        let i = view.item;
        Self {
            id: i.id,
            name: i.name,
            description: i.description,
            category: i.category,
            brand: i.brand,
            barcode: i.barcode,
            is_active: i.is_active,
            store_count: view.store_count,
            available_stores: view.available_stores,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 50, message = "barcode must be at most 50 characters"))]
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

impl From<CreateItemRequest> for NewItem {
    fn from(r: CreateItemRequest) -> Self {
        Self {
            name: r.name.trim().to_string(),
            description: r.description,
            category: r.category.unwrap_or_default(),
            brand: r.brand,
            barcode: r.barcode,
            is_active: r.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 50, message = "barcode must be at most 50 characters"))]
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateItemRequest> for ItemUpdate {
    fn from(r: UpdateItemRequest) -> Self {
        Self {
            name: r.name.map(|n| n.trim().to_string()),
            description: r.description,
            category: r.category,
            brand: r.brand,
            barcode: r.barcode,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemListParams {
    /// beverages, snacks, dairy, frozen, household, personal_care, other
    pub category: Option<String>,
    /// Exact brand
    pub brand: Option<String>,
    pub is_active: Option<String>,
    /// Matches name, description, brand or barcode
    pub search: Option<String>,
    /// name, category, brand, created_at; `-` for descending
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemSearchParams {
    /// Part of the item name
    pub name: Option<String>,
    pub category: Option<String>,
    /// Part of the brand
    pub brand: Option<String>,
    /// Only items available in at least one store
    pub available_only: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemStatisticsDto {
    pub total_items: u64,
    pub active_items: u64,
    pub items_by_category: BTreeMap<String, u64>,
    pub items_by_brand: BTreeMap<String, u64>,
    pub items_in_stock: u64,
}

impl From<ItemStatistics> for ItemStatisticsDto {
    fn from(s: ItemStatistics) -> Self {
        Self {
            total_items: s.total,
            active_items: s.active,
            items_by_category: s.by_category,
            items_by_brand: s.by_brand,
            items_in_stock: s.in_stock,
        }
    }
}
