//! District use-cases

use std::sync::Arc;

use tracing::info;

use super::{
    containing_district, district_views, enrich_stores, stores_in, DistrictView, StoreView,
};
use crate::domain::district::{
    DistrictFilter, DistrictStatistics, DistrictUpdate, NewDistrict, DISTRICT_ORDERING,
};
use crate::domain::geo::Coordinate;
use crate::domain::{DistrictType, DomainError, DomainResult, RepositoryProvider};
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

/// `/districts/search` criteria; at least one must be set
#[derive(Debug, Clone, Default)]
pub struct DistrictSearch {
    pub district_id: Option<i32>,
    pub district_name: Option<String>,
    pub district_type: Option<DistrictType>,
}

impl DistrictSearch {
    fn is_empty(&self) -> bool {
        self.district_id.is_none()
            && self.district_name.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.district_type.is_none()
    }
}

/// Store density of one district
#[derive(Debug, Clone)]
pub struct DistrictDensity {
    pub view: DistrictView,
    pub average_rating: f64,
}

pub struct DistrictService {
    repos: Arc<dyn RepositoryProvider>,
}

impl DistrictService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    async fn view(&self, district: crate::domain::District) -> DomainResult<DistrictView> {
        district_views(self.repos.as_ref(), vec![district])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Database("district view lost during enrichment".into()))
    }

    pub async fn create(&self, new: NewDistrict) -> DomainResult<DistrictView> {
        new.validate()?;
        let district = self.repos.districts().create(new).await?;
        info!(district_id = district.id, name = %district.name, "District created");
        self.view(district).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<DistrictView> {
        let district = self
            .repos
            .districts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("District", id))?;
        self.view(district).await
    }

    pub async fn update(&self, id: i32, update: DistrictUpdate) -> DomainResult<DistrictView> {
        update.validate()?;
        let district = self.repos.districts().update(id, update).await?;
        info!(district_id = id, "District updated");
        self.view(district).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos.districts().delete(id).await?;
        info!(district_id = id, "District deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &DistrictFilter,
        ordering: Option<&str>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<DistrictView>> {
        let sort = SortSpec::parse(ordering, DISTRICT_ORDERING, "name");
        let result = self.repos.districts().list(filter, sort, page).await?;
        let views = district_views(self.repos.as_ref(), result.items).await?;
        Ok(PaginatedResult::new(views, result.total, result.page, result.limit))
    }

    pub async fn search(&self, criteria: DistrictSearch) -> DomainResult<Vec<DistrictView>> {
        if criteria.is_empty() {
            return Err(DomainError::Validation(
                "Provide at least one of district_id, district_name or district_type".into(),
            ));
        }
        let filter = DistrictFilter {
            id: criteria.district_id,
            name_contains: criteria.district_name.filter(|n| !n.trim().is_empty()),
            district_type: criteria.district_type,
            ..Default::default()
        };
        let districts = self.repos.districts().find_all(&filter).await?;
        district_views(self.repos.as_ref(), districts).await
    }

    pub async fn statistics(&self) -> DomainResult<DistrictStatistics> {
        self.repos.districts().statistics().await
    }

    pub async fn stores(&self, id: i32) -> DomainResult<Vec<StoreView>> {
        let district = self
            .repos
            .districts()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("District", id))?;
        let stores = stores_in(self.repos.as_ref(), &district).await?;
        enrich_stores(self.repos.as_ref(), stores, None).await
    }

    /// District containing `point`, if any.
    pub async fn locate(&self, point: &Coordinate) -> DomainResult<Option<DistrictView>> {
        match containing_district(self.repos.as_ref(), point).await? {
            Some(district) => self.view(district).await.map(Some),
            None => Ok(None),
        }
    }

    /// Active districts by number of stores, busiest first.
    pub async fn density(&self) -> DomainResult<Vec<DistrictDensity>> {
        let filter = DistrictFilter {
            is_active: Some(true),
            ..Default::default()
        };
        let districts = self.repos.districts().find_all(&filter).await?;

        let mut rows = Vec::with_capacity(districts.len());
        for district in districts {
            let stores = stores_in(self.repos.as_ref(), &district).await?;
            let ratings: Vec<f64> = stores.iter().filter_map(|s| s.rating).collect();
            let average_rating = if ratings.is_empty() {
                0.0
            } else {
                ratings.iter().sum::<f64>() / ratings.len() as f64
            };
            rows.push(DistrictDensity {
                view: DistrictView {
                    store_count: stores.len() as u64,
                    district,
                },
                average_rating,
            });
        }

        rows.sort_by(|a, b| {
            b.view
                .store_count
                .cmp(&a.view.store_count)
                .then_with(|| a.view.district.name.cmp(&b.view.district.name))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::fixtures::{district, repos, square, store};

    #[tokio::test]
    async fn search_requires_a_criterion() {
        let svc = DistrictService::new(repos().await);
        let err = svc.search(DistrictSearch::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn boundary_districts_count_contained_stores() {
        let repos = repos().await;
        let svc = DistrictService::new(repos.clone());
        let d1 = svc
            .create(district("Quận 1", "Q1", Some(square(106.69, 10.77, 0.02))))
            .await
            .unwrap();
        let plain = svc.create(district("Quận 3", "Q3", None)).await.unwrap();

        repos.stores().create(store("Circle K Inside", 10.78, 106.70)).await.unwrap();
        repos.stores().create(store("GS25 Outside", 10.80, 106.75)).await.unwrap();
        let mut linked = store("Ministop Linked", 10.80, 106.75);
        linked.district_id = Some(plain.district.id);
        repos.stores().create(linked).await.unwrap();

        assert_eq!(svc.get(d1.district.id).await.unwrap().store_count, 1);
        assert_eq!(svc.get(plain.district.id).await.unwrap().store_count, 1);

        let inside = svc.stores(d1.district.id).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].store.name, "Circle K Inside");

        let density = svc.density().await.unwrap();
        assert_eq!(density.len(), 2);
        assert!((density[0].average_rating - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn locate_uses_exact_containment() {
        let svc = DistrictService::new(repos().await);
        svc.create(district("Quận 1", "Q1", Some(square(106.69, 10.77, 0.02))))
            .await
            .unwrap();

        let inside = Coordinate::new(10.775, 106.695).unwrap();
        let outside = Coordinate::new(10.70, 106.60).unwrap();
        assert_eq!(
            svc.locate(&inside).await.unwrap().map(|v| v.district.code),
            Some("Q1".to_string())
        );
        assert!(svc.locate(&outside).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_invalid_figures() {
        let svc = DistrictService::new(repos().await);
        let mut bad = district("Quận 1", "Q1", None);
        bad.area_km2 = Some(-2.0);
        assert!(matches!(
            svc.create(bad).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn text_search_folds_vietnamese_case() {
        let svc = DistrictService::new(repos().await);
        let created = svc
            .create(district("QUẬN BÌNH THẠNH", "BT", None))
            .await
            .unwrap();

        let filter = DistrictFilter {
            search: Some("bình thạnh".into()),
            ..Default::default()
        };
        let page = svc.list(&filter, None, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);

        let hits = svc
            .search(DistrictSearch {
                district_name: Some("quận".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        // renames refresh the folded copy
        svc.update(
            created.district.id,
            DistrictUpdate {
                name: Some("Thủ Đức".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let hits = svc
            .search(DistrictSearch {
                district_name: Some("THỦ ĐỨC".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let stale = svc
            .search(DistrictSearch {
                district_name: Some("bình".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(stale.is_empty());
    }
}
