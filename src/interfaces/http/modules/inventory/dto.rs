//! Inventory DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::catalog::InventoryView;
use crate::domain::geo::m_to_km_rounded;
use crate::domain::inventory::{InventoryStatistics, InventoryUpdate, NewInventory};
use crate::domain::{InventoryRecord, ItemCategory};

/// Inventory row with its store and item flattened in
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryDto {
    pub id: i32,
    pub store_id: i32,
    pub store_name: String,
    pub store_address: String,
    pub store_latitude: Option<f64>,
    pub store_longitude: Option<f64>,
    pub item_id: i32,
    pub item_name: String,
    pub item_category: ItemCategory,
    pub item_brand: Option<String>,
    pub is_available: bool,
    /// `available` or `unavailable`
    pub stock_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryDto {
    fn build(record: InventoryRecord, distance_m: Option<f64>) -> Self {
        let InventoryRecord {
            inventory,
            store,
            item,
        } = record;
        Self {
            stock_status: inventory.stock_status().to_string(),
            id: inventory.id,
            store_id: store.id,
            store_name: store.name,
            store_address: store.address,
            store_latitude: store.location.map(|p| p.latitude()),
            store_longitude: store.location.map(|p| p.longitude()),
            item_id: item.id,
            item_name: item.name,
            item_category: item.category,
            item_brand: item.brand,
            is_available: inventory.is_available,
            distance_km: distance_m.map(m_to_km_rounded),
            created_at: inventory.created_at,
            updated_at: inventory.updated_at,
        }
    }
}

impl From<InventoryRecord> for InventoryDto {
    fn from(record: InventoryRecord) -> Self {
        Self::build(record, None)
    }
}

impl From<InventoryView> for InventoryDto {
    fn from(view: InventoryView) -> Self {
        Self::build(view.record, view.distance_m)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInventoryRequest {
    pub store_id: i32,
    pub item_id: i32,
    /// Defaults to `true`
    pub is_available: Option<bool>,
}

impl From<CreateInventoryRequest> for NewInventory {
    fn from(r: CreateInventoryRequest) -> Self {
        Self {
            store_id: r.store_id,
            item_id: r.item_id,
            is_available: r.is_available.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInventoryRequest {
    pub store_id: Option<i32>,
    pub item_id: Option<i32>,
    pub is_available: Option<bool>,
}

impl From<UpdateInventoryRequest> for InventoryUpdate {
    fn from(r: UpdateInventoryRequest) -> Self {
        Self {
            store_id: r.store_id,
            item_id: r.item_id,
            is_available: r.is_available,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryListParams {
    /// Store ID
    pub store: Option<i32>,
    /// Item ID
    pub item: Option<i32>,
    /// Item category
    pub category: Option<String>,
    pub is_available: Option<String>,
    /// Matches item name, store name or item brand
    pub search: Option<String>,
    /// item_name or created_at; `-` for descending
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventorySearchParams {
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub available_only: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NearbyParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// 0.1-100, required
    pub radius_km: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryStatisticsDto {
    pub total_inventory: u64,
    pub available_items: u64,
    pub unavailable_items: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_store: BTreeMap<String, u64>,
}

impl From<InventoryStatistics> for InventoryStatisticsDto {
    fn from(s: InventoryStatistics) -> Self {
        Self {
            total_inventory: s.total,
            available_items: s.available,
            unavailable_items: s.unavailable,
            by_category: s.by_category,
            by_store: s.by_store,
        }
    }
}
