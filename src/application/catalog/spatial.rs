//! City-wide spatial overview

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{by_name, district_store_counts};
use crate::domain::district::DistrictFilter;
use crate::domain::geo::BoundingBox;
use crate::domain::store::StoreFilter;
use crate::domain::{DomainResult, RepositoryProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialOverview {
    /// District name → store count
    pub stores_by_district: BTreeMap<String, u64>,
    pub stores_by_type: BTreeMap<String, u64>,
    /// Box around all located stores
    pub extent: Option<BoundingBox>,
    pub average_stores_per_district: f64,
}

pub struct SpatialService {
    repos: Arc<dyn RepositoryProvider>,
}

impl SpatialService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn overview(&self) -> DomainResult<SpatialOverview> {
        let repos = self.repos.as_ref();

        let districts = repos.districts().find_all(&DistrictFilter::default()).await?;
        let counts = district_store_counts(repos, &districts).await?;
        let stores_by_district = districts
            .iter()
            .map(|d| (d.name.clone(), counts.get(&d.id).copied().unwrap_or(0)))
            .collect();

        let stats = repos.stores().statistics().await?;

        let located = StoreFilter {
            located_only: true,
            ..Default::default()
        };
        let points: Vec<_> = repos
            .stores()
            .find_all(&located, by_name())
            .await?
            .into_iter()
            .filter_map(|s| s.location)
            .collect();
        let extent = BoundingBox::enclosing(&points);

        let active_districts = districts.iter().filter(|d| d.is_active).count();
        let average_stores_per_district = if active_districts == 0 {
            0.0
        } else {
            stats.active as f64 / active_districts as f64
        };

        Ok(SpatialOverview {
            stores_by_district,
            stores_by_type: stats.by_type,
            extent,
            average_stores_per_district,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures::{district, repos, square, store};

    #[tokio::test]
    async fn empty_catalog_has_no_extent() {
        let overview = SpatialService::new(repos().await).overview().await.unwrap();
        assert!(overview.extent.is_none());
        assert_eq!(overview.average_stores_per_district, 0.0);
    }

    #[tokio::test]
    async fn overview_aggregates_stores() {
        let repos = repos().await;
        repos
            .districts()
            .create(district("Quận 1", "Q1", Some(square(106.69, 10.76, 0.03))))
            .await
            .unwrap();
        repos.districts().create(district("Quận 3", "Q3", None)).await.unwrap();
        repos.stores().create(store("Circle K A", 10.77, 106.70)).await.unwrap();
        repos.stores().create(store("Circle K B", 10.80, 106.75)).await.unwrap();

        let overview = SpatialService::new(repos).overview().await.unwrap();
        assert_eq!(overview.stores_by_district.get("Quận 1"), Some(&1));
        assert_eq!(overview.stores_by_district.get("Quận 3"), Some(&0));
        assert_eq!(overview.stores_by_type.get("circle-k"), Some(&2));
        assert_eq!(
            overview.extent.map(|b| b.as_array()),
            Some([106.70, 10.77, 106.75, 10.80])
        );
        assert!((overview.average_stores_per_district - 1.0).abs() < 1e-9);
    }
}
