use serde_json::{json, Value};

use super::{BoundingBox, Coordinate, GeoError};

/// A closed linear ring (first position == last position).
#[derive(Debug, Clone, PartialEq)]
pub struct Ring(Vec<Coordinate>);

impl Ring {
    /// Build a ring from `[lng, lat, ..]` positions, closing it if needed.
    pub fn from_positions(positions: &[Vec<f64>]) -> Result<Self, GeoError> {
        let mut points = positions
            .iter()
            .map(|pos| match pos.as_slice() {
                [lng, lat, ..] => Coordinate::new(*lat, *lng),
                _ => Err(GeoError::InvalidGeoJson(
                    "position must have at least two numbers".into(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if first != last {
                points.push(first);
            }
        }
        // closed ring: 3 distinct vertices + the closing one
        if points.len() < 4 {
            return Err(GeoError::DegenerateRing);
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }

    /// Even-odd ray cast. Points exactly on an edge may fall either way.
    fn contains(&self, point: &Coordinate) -> bool {
        let (x, y) = (point.longitude(), point.latitude());
        let mut inside = false;
        for edge in self.0.windows(2) {
            let (xi, yi) = (edge[0].longitude(), edge[0].latitude());
            let (xj, yj) = (edge[1].longitude(), edge[1].latitude());
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
        }
        inside
    }

    /// Shoelace terms: (signed area, x moment, y moment).
    fn moments(&self) -> (f64, f64, f64) {
        let (mut area, mut cx, mut cy) = (0.0, 0.0, 0.0);
        for edge in self.0.windows(2) {
            let (x0, y0) = (edge[0].longitude(), edge[0].latitude());
            let (x1, y1) = (edge[1].longitude(), edge[1].latitude());
            let cross = x0 * y1 - x1 * y0;
            area += cross;
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }
        (area / 2.0, cx / 6.0, cy / 6.0)
    }

    fn to_positions(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|p| json!([p.longitude(), p.latitude()]))
                .collect(),
        )
    }

    fn to_wkt(&self) -> String {
        let coords: Vec<String> = self
            .0
            .iter()
            .map(|p| format!("{} {}", p.longitude(), p.latitude()))
            .collect();
        format!("({})", coords.join(", "))
    }
}

/// Exterior ring with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    fn from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Self, GeoError> {
        let (exterior, interiors) = rings.split_first().ok_or(GeoError::DegenerateRing)?;
        Ok(Self {
            exterior: Ring::from_positions(exterior)?,
            interiors: interiors
                .iter()
                .map(|r| Ring::from_positions(r))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        self.exterior.contains(point) && !self.interiors.iter().any(|hole| hole.contains(point))
    }
}

/// District boundary, stored as a MultiPolygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    polygons: Vec<Polygon>,
}

impl Boundary {
    pub fn new(polygons: Vec<Polygon>) -> Result<Self, GeoError> {
        if polygons.is_empty() {
            return Err(GeoError::EmptyBoundary);
        }
        Ok(Self { polygons })
    }

    /// Parse a GeoJSON `Polygon`, `MultiPolygon` or a `Feature` wrapping one.
    pub fn from_geojson(value: &Value) -> Result<Self, GeoError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeoError::InvalidGeoJson("missing \"type\"".into()))?;

        match kind {
            "Feature" => {
                let geometry = value
                    .get("geometry")
                    .filter(|g| !g.is_null())
                    .ok_or_else(|| GeoError::InvalidGeoJson("feature has no geometry".into()))?;
                Self::from_geojson(geometry)
            }
            "Polygon" => {
                let rings: Vec<Vec<Vec<f64>>> = coordinates(value)?;
                Self::new(vec![Polygon::from_rings(&rings)?])
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<Vec<f64>>>> = coordinates(value)?;
                Self::new(
                    polygons
                        .iter()
                        .map(|rings| Polygon::from_rings(rings))
                        .collect::<Result<_, _>>()?,
                )
            }
            other => Err(GeoError::UnsupportedGeometry(other.to_string())),
        }
    }

    /// Parse the stored text form (GeoJSON).
    pub fn from_geojson_str(raw: &str) -> Result<Self, GeoError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| GeoError::InvalidGeoJson(e.to_string()))?;
        Self::from_geojson(&value)
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        self.bounding_box().contains(point) && self.polygons.iter().any(|p| p.contains(point))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // `new` rejects empty boundaries and rings always hold 4+ points
        BoundingBox::enclosing(self.polygons.iter().flat_map(|p| p.exterior.points()))
            .unwrap_or(BoundingBox {
                min_lng: 0.0,
                min_lat: 0.0,
                max_lng: 0.0,
                max_lat: 0.0,
            })
    }

    /// Area-weighted centroid in degrees.
    pub fn centroid(&self) -> Option<Coordinate> {
        let (mut area, mut mx, mut my) = (0.0, 0.0, 0.0);
        for polygon in &self.polygons {
            let (a, x, y) = polygon.exterior.moments();
            // orient exterior positive, holes negative
            let sign = if a < 0.0 { -1.0 } else { 1.0 };
            area += a * sign;
            mx += x * sign;
            my += y * sign;
            for hole in &polygon.interiors {
                let (a, x, y) = hole.moments();
                let sign = if a < 0.0 { 1.0 } else { -1.0 };
                area += a * sign;
                mx += x * sign;
                my += y * sign;
            }
        }

        if area.abs() < f64::EPSILON {
            let points: Vec<&Coordinate> = self
                .polygons
                .iter()
                .flat_map(|p| p.exterior.points())
                .collect();
            let n = points.len() as f64;
            let lat = points.iter().map(|p| p.latitude()).sum::<f64>() / n;
            let lng = points.iter().map(|p| p.longitude()).sum::<f64>() / n;
            return Coordinate::new(lat, lng).ok();
        }

        Coordinate::new(my / area, mx / area).ok()
    }

    pub fn to_geojson(&self) -> Value {
        let polygons: Vec<Value> = self
            .polygons
            .iter()
            .map(|p| {
                let mut rings = vec![p.exterior.to_positions()];
                rings.extend(p.interiors.iter().map(Ring::to_positions));
                Value::Array(rings)
            })
            .collect();
        json!({ "type": "MultiPolygon", "coordinates": polygons })
    }

    pub fn to_wkt(&self) -> String {
        let polygons: Vec<String> = self
            .polygons
            .iter()
            .map(|p| {
                let mut rings = vec![p.exterior.to_wkt()];
                rings.extend(p.interiors.iter().map(Ring::to_wkt));
                format!("({})", rings.join(", "))
            })
            .collect();
        format!("MULTIPOLYGON ({})", polygons.join(", "))
    }
}

fn coordinates<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, GeoError> {
    let raw = value
        .get("coordinates")
        .cloned()
        .ok_or_else(|| GeoError::InvalidGeoJson("missing \"coordinates\"".into()))?;
    serde_json::from_value(raw).map_err(|e| GeoError::InvalidGeoJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn square(min: f64, max: f64) -> Value {
        json!([[min, min], [max, min], [max, max], [min, max], [min, min]])
    }

    #[test]
    fn polygon_contains_interior_point_only() {
        let boundary =
            Boundary::from_geojson(&json!({"type": "Polygon", "coordinates": [square(0.0, 10.0)]}))
                .unwrap();
        assert!(boundary.contains(&point(5.0, 5.0)));
        assert!(!boundary.contains(&point(11.0, 5.0)));
        assert!(!boundary.contains(&point(5.0, -0.5)));
    }

    #[test]
    fn holes_are_excluded() {
        let boundary = Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [square(0.0, 10.0), square(4.0, 6.0)]
        }))
        .unwrap();
        assert!(!boundary.contains(&point(5.0, 5.0)));
        assert!(boundary.contains(&point(2.0, 2.0)));
    }

    #[test]
    fn multipolygon_matches_any_member() {
        let boundary = Boundary::from_geojson(&json!({
            "type": "MultiPolygon",
            "coordinates": [[square(0.0, 1.0)], [square(5.0, 6.0)]]
        }))
        .unwrap();
        assert_eq!(boundary.polygons().len(), 2);
        assert!(boundary.contains(&point(0.5, 0.5)));
        assert!(boundary.contains(&point(5.5, 5.5)));
        assert!(!boundary.contains(&point(3.0, 3.0)));
    }

    #[test]
    fn feature_wrapper_is_unwrapped() {
        let feature = json!({
            "type": "Feature",
            "properties": {"name": "QUẬN 1"},
            "geometry": {"type": "Polygon", "coordinates": [square(0.0, 2.0)]}
        });
        assert!(Boundary::from_geojson(&feature).is_ok());
    }

    #[test]
    fn points_are_not_boundaries() {
        let err = Boundary::from_geojson(&json!({"type": "Point", "coordinates": [1.0, 2.0]}))
            .unwrap_err();
        assert_eq!(err, GeoError::UnsupportedGeometry("Point".into()));
    }

    #[test]
    fn open_rings_are_closed_and_degenerate_rings_rejected() {
        let open = Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
        }))
        .unwrap();
        let ring = open.polygons()[0].exterior.points();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());

        let err = Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0]]]
        }))
        .unwrap_err();
        assert_eq!(err, GeoError::DegenerateRing);
    }

    #[test]
    fn invalid_positions_are_reported() {
        let err = Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 95.0], [1.0, 0.0], [1.0, 1.0]]]
        }))
        .unwrap_err();
        assert_eq!(err, GeoError::InvalidLatitude(95.0));
    }

    #[test]
    fn centroid_of_square_with_hole_shifts_away_from_hole() {
        let plain = Boundary::from_geojson(&json!({"type": "Polygon", "coordinates": [square(0.0, 4.0)]}))
            .unwrap();
        let c = plain.centroid().unwrap();
        assert!((c.latitude() - 2.0).abs() < 1e-9);
        assert!((c.longitude() - 2.0).abs() < 1e-9);

        let holed = Boundary::from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [square(0.0, 4.0), square(2.5, 3.5)]
        }))
        .unwrap();
        let c = holed.centroid().unwrap();
        assert!(c.latitude() < 2.0);
        assert!(c.longitude() < 2.0);
    }

    #[test]
    fn geojson_round_trip_through_storage_text() {
        let boundary = Boundary::from_geojson(&json!({"type": "Polygon", "coordinates": [square(0.0, 1.0)]}))
            .unwrap();
        let stored = boundary.to_geojson().to_string();
        let restored = Boundary::from_geojson_str(&stored).unwrap();
        assert_eq!(restored, boundary);
        assert_eq!(boundary.to_geojson()["type"], "MultiPolygon");
    }

    #[test]
    fn renders_wkt() {
        let boundary = Boundary::from_geojson(&json!({"type": "Polygon", "coordinates": [square(0.0, 1.0)]}))
            .unwrap();
        assert_eq!(
            boundary.to_wkt(),
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)))"
        );
    }

    #[test]
    fn bounding_box_spans_all_polygons() {
        let boundary = Boundary::from_geojson(&json!({
            "type": "MultiPolygon",
            "coordinates": [[square(0.0, 1.0)], [square(5.0, 6.0)]]
        }))
        .unwrap();
        assert_eq!(boundary.bounding_box().as_array(), [0.0, 0.0, 6.0, 6.0]);
    }
}
