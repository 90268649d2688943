use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::GeoError;

/// Mean Earth radius (IUGG), metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from an optional pair; both halves must be present together.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, GeoError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(GeoError::IncompleteCoordinate),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    pub fn to_geojson(&self) -> Value {
        json!({ "type": "Point", "coordinates": [self.longitude, self.latitude] })
    }

    pub fn to_wkt(&self) -> String {
        format!("POINT ({} {})", self.longitude, self.latitude)
    }
}

/// Axis-aligned lon/lat rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Smallest box containing every point within `radius_m` of `center`.
    ///
    /// Clamped at the poles; spans all longitudes when it would wrap the
    /// antimeridian or reach a pole.
    pub fn around(center: &Coordinate, radius_m: f64) -> Self {
        let radius_m = radius_m.max(0.0);
        let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let min_lat = (center.latitude - d_lat).max(-90.0);
        let max_lat = (center.latitude + d_lat).min(90.0);

        let cos_lat = center.latitude.to_radians().cos();
        let full_width = min_lat <= -90.0 || max_lat >= 90.0 || cos_lat <= f64::EPSILON;
        let (min_lng, max_lng) = if full_width {
            (-180.0, 180.0)
        } else {
            let d_lng = (radius_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();
            let (lo, hi) = (center.longitude - d_lng, center.longitude + d_lng);
            if lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }

    /// Grow the box to include `point`.
    pub fn extend(&mut self, point: &Coordinate) {
        self.min_lng = self.min_lng.min(point.longitude);
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lng = self.max_lng.max(point.longitude);
        self.max_lat = self.max_lat.max(point.latitude);
    }

    /// `[min_lng, min_lat, max_lng, max_lat]`
    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }

    /// Box covering all points, `None` for an empty iterator.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            min_lng: first.longitude,
            min_lat: first.latitude,
            max_lng: first.longitude,
            max_lat: first.latitude,
        };
        for point in iter {
            bbox.extend(point);
        }
        Some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hcmc_district_1() -> Coordinate {
        Coordinate::new(10.7769, 106.7009).unwrap()
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(Coordinate::new(91.0, 0.0), Err(GeoError::InvalidLatitude(91.0)));
        assert_eq!(Coordinate::new(0.0, -180.5), Err(GeoError::InvalidLongitude(-180.5)));
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn from_parts_requires_both_halves() {
        assert_eq!(Coordinate::from_parts(None, None), Ok(None));
        assert!(Coordinate::from_parts(Some(10.0), None).is_err());
        assert!(Coordinate::from_parts(None, Some(106.0)).is_err());
        assert!(Coordinate::from_parts(Some(10.0), Some(106.0)).unwrap().is_some());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = hcmc_district_1();
        assert!(p.distance_meters(&p).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinate::new(10.0, 106.0).unwrap();
        let b = Coordinate::new(11.0, 106.0).unwrap();
        let d = a.distance_meters(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn ben_thanh_to_tan_son_nhat_is_about_6_km() {
        let ben_thanh = Coordinate::new(10.7725, 106.6980).unwrap();
        let airport = Coordinate::new(10.8188, 106.6520).unwrap();
        let d = ben_thanh.distance_meters(&airport);
        assert!((6_000.0..7_500.0).contains(&d), "got {d}");
    }

    #[test]
    fn bounding_box_contains_points_on_the_radius() {
        let center = hcmc_district_1();
        let bbox = BoundingBox::around(&center, 5_000.0);
        let north = Coordinate::new(center.latitude() + 0.0449, center.longitude()).unwrap();
        let east = Coordinate::new(center.latitude(), center.longitude() + 0.0456).unwrap();
        assert!(north.distance_meters(&center) < 5_000.0);
        assert!(east.distance_meters(&center) < 5_000.0);
        assert!(bbox.contains(&north));
        assert!(bbox.contains(&east));
        assert!(!bbox.contains(&Coordinate::new(center.latitude() + 0.1, center.longitude()).unwrap()));
    }

    #[test]
    fn bounding_box_widens_across_the_antimeridian() {
        let center = Coordinate::new(0.0, 179.99).unwrap();
        let bbox = BoundingBox::around(&center, 10_000.0);
        assert_eq!((bbox.min_lng, bbox.max_lng), (-180.0, 180.0));
    }

    #[test]
    fn enclosing_box_of_points() {
        let pts = [
            Coordinate::new(10.7, 106.6).unwrap(),
            Coordinate::new(10.9, 106.8).unwrap(),
            Coordinate::new(10.8, 106.5).unwrap(),
        ];
        let bbox = BoundingBox::enclosing(pts.iter()).unwrap();
        assert_eq!(bbox.as_array(), [106.5, 10.7, 106.8, 10.9]);
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn renders_wkt_and_geojson_in_lng_lat_order() {
        let p = Coordinate::new(10.5, 106.25).unwrap();
        assert_eq!(p.to_wkt(), "POINT (106.25 10.5)");
        assert_eq!(p.to_geojson()["coordinates"], serde_json::json!([106.25, 10.5]));
    }
}
