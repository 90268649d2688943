//! Bulk import of districts (GeoJSON) and stores (JSON rows)
//!
//! Rows that cannot be turned into valid entities are skipped and counted;
//! only storage failures abort an import.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::catalog::containing_district;
use crate::domain::district::{DistrictFilter, DistrictUpdate, NewDistrict};
use crate::domain::geo::{Boundary, Coordinate};
use crate::domain::store::{NewStore, StoreFilter, STORE_ORDERING};
use crate::domain::{District, DistrictType, DomainError, DomainResult, RepositoryProvider, StoreType};
use crate::shared::SortSpec;

/// District name properties, in lookup order
const NAME_KEYS: [&str; 4] = ["name", "Name", "NAME_2", "ten"];

/// Administrative prefixes stripped before deriving a code
const ADMIN_PREFIXES: [&str; 4] = ["QUẬN", "THÀNH PHỐ", "HUYỆN", "DISTRICT"];

const MAX_CODE_LEN: usize = 10;

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

pub struct ImportService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ImportService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Upsert districts by name from a GeoJSON `FeatureCollection`.
    pub async fn import_districts(&self, collection: &Value) -> DomainResult<ImportReport> {
        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                DomainError::Validation("Expected a GeoJSON FeatureCollection".into())
            })?;

        let existing = self.repos.districts().find_all(&DistrictFilter::default()).await?;
        let mut codes: BTreeSet<String> = existing.iter().map(|d| d.code.clone()).collect();
        let mut by_name: BTreeMap<String, District> =
            existing.into_iter().map(|d| (d.name.clone(), d)).collect();

        let mut report = ImportReport::default();
        for (index, feature) in features.iter().enumerate() {
            let properties = feature.get("properties").unwrap_or(&Value::Null);
            let Some(name) = feature_name(properties) else {
                warn!(feature = index, "Skipping feature without a name");
                report.skipped += 1;
                continue;
            };
            let boundary = match feature.get("geometry").map(Boundary::from_geojson) {
                Some(Ok(boundary)) => boundary,
                Some(Err(e)) => {
                    warn!(feature = index, name = %name, error = %e, "Skipping feature geometry");
                    report.skipped += 1;
                    continue;
                }
                None => {
                    warn!(feature = index, name = %name, "Skipping feature without geometry");
                    report.skipped += 1;
                    continue;
                }
            };
            let district_type = DistrictType::from_admin_prefix(&name);

            if let Some(current) = by_name.get(&name) {
                let update = DistrictUpdate {
                    boundary: Some(boundary),
                    district_type: Some(district_type),
                    ..Default::default()
                };
                let district = self.repos.districts().update(current.id, update).await?;
                info!(district_id = district.id, name = %district.name, "District boundary updated");
                by_name.insert(name, district);
                report.updated += 1;
                continue;
            }

            let code = properties
                .get("code")
                .and_then(Value::as_str)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty() && !codes.contains(c))
                .unwrap_or_else(|| unique_code(&abbreviate(&name), &codes));

            let new = NewDistrict {
                name: name.clone(),
                code,
                boundary: Some(boundary),
                city: None,
                population: properties.get("population").and_then(Value::as_i64),
                area_km2: properties.get("area_km2").and_then(Value::as_f64),
                district_type,
                avg_income: None,
                is_active: true,
            };
            if let Err(e) = new.validate() {
                warn!(feature = index, name = %name, error = %e, "Skipping invalid district");
                report.skipped += 1;
                continue;
            }

            let district = self.repos.districts().create(new).await?;
            info!(district_id = district.id, name = %district.name, code = %district.code, "District imported");
            codes.insert(district.code.clone());
            by_name.insert(name, district);
            report.created += 1;
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "District import finished"
        );
        Ok(report)
    }

    /// Create stores from a JSON array; stores whose name already exists
    /// are left untouched and counted as skipped.
    pub async fn import_stores(&self, rows: &Value) -> DomainResult<ImportReport> {
        let rows = rows
            .as_array()
            .ok_or_else(|| DomainError::Validation("Expected a JSON array of stores".into()))?;

        let mut report = ImportReport::default();
        for (index, row) in rows.iter().enumerate() {
            let new = match self.store_from_row(row).await? {
                Ok(new) => new,
                Err(reason) => {
                    warn!(row = index, reason = %reason, "Skipping store row");
                    report.skipped += 1;
                    continue;
                }
            };

            if self.store_exists(&new.name).await? {
                warn!(row = index, name = %new.name, "Store already exists");
                report.skipped += 1;
                continue;
            }
            if let Err(e) = new.validate() {
                warn!(row = index, name = %new.name, error = %e, "Skipping invalid store");
                report.skipped += 1;
                continue;
            }

            let store = self.repos.stores().create(new).await?;
            info!(
                store_id = store.id,
                name = %store.name,
                store_type = %store.store_type,
                district_id = ?store.district_id,
                "Store imported"
            );
            report.created += 1;
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            "Store import finished"
        );
        Ok(report)
    }

    /// Build a store from one row. The inner error is the reason to skip it.
    async fn store_from_row(&self, row: &Value) -> DomainResult<Result<NewStore, String>> {
        let Some(name) = text(row, "name") else {
            return Ok(Err("missing name".into()));
        };
        let latitude = number(row, &["latitude", "lat"]);
        let longitude = number(row, &["longitude", "lng"]);
        let location = match (latitude, longitude) {
            (Some(lat), Some(lng)) => match Coordinate::new(lat, lng) {
                Ok(point) => point,
                Err(e) => return Ok(Err(e.to_string())),
            },
            _ => return Ok(Err("missing or non-numeric coordinates".into())),
        };

        let store_type = match text(row, "type") {
            Some(raw) => match raw.parse::<StoreType>() {
                Ok(t) => t,
                Err(e) => return Ok(Err(e.to_string())),
            },
            None => StoreType::detect_from_name(&name),
        };

        let district = containing_district(self.repos.as_ref(), &location).await?;
        let district_name = district.as_ref().map(|d| d.name.clone());
        let city = text(row, "city");
        let address = text(row, "address").unwrap_or_else(|| {
            let area = district_name
                .as_deref()
                .or(city.as_deref())
                .unwrap_or(crate::domain::district::DEFAULT_CITY);
            format!("{:.5}, {:.5}, {}", location.latitude(), location.longitude(), area)
        });

        Ok(Ok(NewStore {
            name,
            address,
            phone: text(row, "phone"),
            email: text(row, "email"),
            location: Some(location),
            store_type,
            district: district_name,
            district_id: district.map(|d| d.id),
            city,
            opening_hours: text(row, "opening_hours"),
            is_active: row.get("is_active").and_then(Value::as_bool).unwrap_or(true),
            rating: row.get("rating").and_then(Value::as_f64),
        }))
    }

    async fn store_exists(&self, name: &str) -> DomainResult<bool> {
        let filter = StoreFilter {
            search: Some(name.to_string()),
            ..Default::default()
        };
        let matches = self
            .repos
            .stores()
            .find_all(&filter, SortSpec::parse(None, STORE_ORDERING, "name"))
            .await?;
        Ok(matches.iter().any(|s| s.name == name))
    }
}

fn feature_name(properties: &Value) -> Option<String> {
    NAME_KEYS.iter().find_map(|key| text(properties, key))
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `QUẬN 1` → `D1`, `QUẬN TÂN BÌNH` → `TB`, `HUYỆN CỦ CHI` → `CC`.
fn abbreviate(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    let rest = ADMIN_PREFIXES
        .iter()
        .find_map(|prefix| upper.strip_prefix(prefix))
        .unwrap_or(&upper)
        .trim();

    if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        return format!("D{}", rest);
    }
    let initials: String = rest
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    let code: String = if initials.is_empty() { "D".to_string() } else { initials };
    code.chars().take(MAX_CODE_LEN).collect()
}

/// Append a counter when `base` is already taken.
fn unique_code(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| {
            let suffix = n.to_string();
            let head: String = base
                .chars()
                .take(MAX_CODE_LEN.saturating_sub(suffix.len()))
                .collect();
            format!("{}{}", head, suffix)
        })
        .find(|code| !taken.contains(code))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures;
    use serde_json::json;

    fn feature(name: &str, min_lng: f64, min_lat: f64) -> Value {
        json!({
            "type": "Feature",
            "properties": { "name": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min_lng, min_lat],
                    [min_lng + 0.1, min_lat],
                    [min_lng + 0.1, min_lat + 0.1],
                    [min_lng, min_lat + 0.1],
                    [min_lng, min_lat]
                ]]
            }
        })
    }

    #[test]
    fn abbreviations_follow_admin_names() {
        assert_eq!(abbreviate("QUẬN 1"), "D1");
        assert_eq!(abbreviate("Quận Tân Bình"), "TB");
        assert_eq!(abbreviate("HUYỆN CỦ CHI"), "CC");
        assert_eq!(abbreviate("THÀNH PHỐ THỦ ĐỨC"), "TĐ");
    }

    #[test]
    fn unique_code_appends_counter() {
        let taken: BTreeSet<String> = ["BT".to_string(), "BT2".to_string()].into();
        assert_eq!(unique_code("BT", &taken), "BT3");
        assert_eq!(unique_code("TB", &taken), "TB");
    }

    #[tokio::test]
    async fn districts_are_upserted_by_name() {
        let repos = fixtures::repos().await;
        let service = ImportService::new(repos.clone());
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                feature("QUẬN BÌNH THẠNH", 106.6, 10.7),
                feature("QUẬN BÌNH TÂN", 106.8, 10.7),
                { "type": "Feature", "properties": {}, "geometry": null },
                { "type": "Feature", "properties": { "ten": "Điểm" },
                  "geometry": { "type": "Point", "coordinates": [106.7, 10.7] } }
            ]
        });

        let report = service.import_districts(&collection).await.unwrap();
        assert_eq!(report, ImportReport { created: 2, updated: 0, skipped: 2 });

        let tan = repos.districts().find_by_name("QUẬN BÌNH TÂN").await.unwrap().unwrap();
        assert_eq!(tan.code, "BT2");
        assert_eq!(tan.district_type, DistrictType::Urban);
        assert!(tan.boundary.is_some());

        let report = service.import_districts(&collection).await.unwrap();
        assert_eq!(report, ImportReport { created: 0, updated: 2, skipped: 2 });
    }

    #[tokio::test]
    async fn rejects_non_collections() {
        let service = ImportService::new(fixtures::repos().await);
        let err = service.import_districts(&json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.import_stores(&json!({"name": "x"})).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn stores_get_type_and_district() {
        let repos = fixtures::repos().await;
        let district = repos
            .districts()
            .create(fixtures::district("Quận 1", "D1", Some(fixtures::square(106.69, 10.77, 0.02))))
            .await
            .unwrap();
        let service = ImportService::new(repos.clone());

        let rows = json!([
            { "name": "Circle K Nguyen Hue", "latitude": 10.776, "longitude": 106.70 },
            { "name": "Corner shop", "lat": "10.9", "lng": "106.5", "type": "gs25",
              "address": "12 Le Loi" },
            { "name": "Nowhere", "latitude": 95.0, "longitude": 106.7 },
            { "name": "No coordinates" },
            { "latitude": 10.7, "longitude": 106.7 },
            { "name": "Circle K Nguyen Hue", "latitude": 10.776, "longitude": 106.70 }
        ]);
        let report = service.import_stores(&rows).await.unwrap();
        assert_eq!(report, ImportReport { created: 2, updated: 0, skipped: 4 });

        let stores = repos
            .stores()
            .find_all(&StoreFilter::default(), SortSpec::parse(None, STORE_ORDERING, "name"))
            .await
            .unwrap();
        let circle = stores.iter().find(|s| s.name == "Circle K Nguyen Hue").unwrap();
        assert_eq!(circle.store_type, StoreType::CircleK);
        assert_eq!(circle.district_id, Some(district.id));
        assert_eq!(circle.district.as_deref(), Some("Quận 1"));
        assert!(!circle.address.is_empty());

        let corner = stores.iter().find(|s| s.name == "Corner shop").unwrap();
        assert_eq!(corner.store_type, StoreType::Gs25);
        assert_eq!(corner.district_id, None);
        assert_eq!(corner.address, "12 Le Loi");
    }
}
