//! Polygon geometry on latitude/longitude pairs.
//!
//! Polygons are stored as an ordered ring of `[lat, lng]` pairs; the closing
//! edge back to the first vertex is implied. An empty ring means the
//! association has not been drawn yet.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Minimum number of vertices for a renderable area.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// A geographic point. Serialized as a `[lat, lng]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(p: LatLng) -> Self {
        [p.lat, p.lng]
    }
}

/// Axis-aligned extent of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// An ordered ring of vertices (closed ring implied).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<LatLng>,
}

impl Polygon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a polygon from a raw vertex list coming from the drawing surface.
    ///
    /// Any length is accepted (in-progress drawings may have fewer than three
    /// points); every coordinate must be finite.
    pub fn from_coords(coords: Vec<[f64; 2]>) -> Result<Self, DataError> {
        let vertices: Vec<LatLng> = coords.into_iter().map(LatLng::from).collect();
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(DataError::invalid_coordinates(format!(
                "vertex {} is not a finite [lat, lng] pair",
                index
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the ring has enough vertices to enclose an area.
    pub fn is_renderable(&self) -> bool {
        self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    /// Raw `[lat, lng]` pairs, e.g. for handing to a drawing surface.
    pub fn to_coords(&self) -> Vec<[f64; 2]> {
        self.vertices.iter().map(|&v| v.into()).collect()
    }

    /// Twice the signed area (shoelace sum), with longitude as x and latitude as y.
    ///
    /// Positive for counter-clockwise rings.
    pub fn signed_area_sum(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.lng * b.lat - b.lng * a.lat
            })
            .sum()
    }

    /// Signed area in squared degrees.
    pub fn signed_area(&self) -> f64 {
        self.signed_area_sum() / 2.0
    }

    /// Area centroid of the ring.
    ///
    /// Returns `None` for rings with fewer than three vertices or zero area,
    /// where the centroid formula would divide by zero.
    pub fn centroid(&self) -> Option<LatLng> {
        if !self.is_renderable() {
            return None;
        }

        let n = self.vertices.len();
        let mut area_sum = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = a.lng * b.lat - b.lng * a.lat;
            area_sum += cross;
            cx += (a.lng + b.lng) * cross;
            cy += (a.lat + b.lat) * cross;
        }

        if area_sum == 0.0 || !area_sum.is_finite() {
            return None;
        }

        let factor = 1.0 / (3.0 * area_sum);
        let centroid = LatLng::new(cy * factor, cx * factor);
        centroid.is_finite().then_some(centroid)
    }

    /// Extent of the ring, if it has any vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.vertices.first()?;
        let (mut south_west, mut north_east) = (first, first);
        for v in &self.vertices[1..] {
            south_west.lat = south_west.lat.min(v.lat);
            south_west.lng = south_west.lng.min(v.lng);
            north_east.lat = north_east.lat.max(v.lat);
            north_east.lng = north_east.lng.max(v.lng);
        }
        Some(Bounds {
            south_west,
            north_east,
        })
    }

    /// Check if a point is inside the ring (ray casting algorithm).
    pub fn contains(&self, point: LatLng) -> bool {
        if !self.is_renderable() {
            return false;
        }

        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if ((vi.lat > point.lat) != (vj.lat > point.lat))
                && (point.lng
                    < (vj.lng - vi.lng) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lng)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

impl From<Vec<LatLng>> for Polygon {
    fn from(vertices: Vec<LatLng>) -> Self {
        Self { vertices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Polygon {
        Polygon::from_coords(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap()
    }

    fn square() -> Polygon {
        Polygon::from_coords(vec![[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_serializes_as_pairs() {
        let json = serde_json::to_string(&triangle()).unwrap();
        assert_eq!(json, "[[0.0,0.0],[0.0,1.0],[1.0,1.0]]");

        let parsed: Polygon = serde_json::from_str("[[41.49,2.26],[41.5,2.27]]").unwrap();
        assert_eq!(parsed.vertices()[1], LatLng::new(41.5, 2.27));
    }

    #[test]
    fn test_from_coords_rejects_non_finite() {
        let err = Polygon::from_coords(vec![[0.0, 0.0], [f64::NAN, 1.0]]).unwrap_err();
        assert!(matches!(err, DataError::InvalidCoordinates { .. }));
        assert!(Polygon::from_coords(vec![[f64::INFINITY, 0.0]]).is_err());
        assert!(Polygon::from_coords(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_signed_area() {
        assert!((square().signed_area().abs() - 4.0).abs() < 1e-12);
        assert!((triangle().signed_area().abs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_of_triangle_is_inside() {
        let c = triangle().centroid().expect("triangle has area");
        assert!((c.lat - 1.0 / 3.0).abs() < 1e-12);
        assert!((c.lng - 2.0 / 3.0).abs() < 1e-12);
        assert!(triangle().contains(c));
    }

    #[test]
    fn test_centroid_independent_of_winding() {
        let mut reversed = square().to_coords();
        reversed.reverse();
        let a = square().centroid().unwrap();
        let b = Polygon::from_coords(reversed).unwrap().centroid().unwrap();
        assert!((a.lat - 1.0).abs() < 1e-12 && (a.lng - 1.0).abs() < 1e-12);
        assert!((a.lat - b.lat).abs() < 1e-12 && (a.lng - b.lng).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_degenerate() {
        assert_eq!(Polygon::new().centroid(), None);
        let two = Polygon::from_coords(vec![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        assert_eq!(two.centroid(), None);
        let collinear = Polygon::from_coords(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
        assert_eq!(collinear.centroid(), None);
    }

    #[test]
    fn test_contains() {
        let sq = square();
        assert!(sq.contains(LatLng::new(1.0, 1.0)));
        assert!(!sq.contains(LatLng::new(3.0, 1.0)));
        assert!(!Polygon::new().contains(LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn test_bounds() {
        let b = triangle().bounds().unwrap();
        assert_eq!(b.south_west, LatLng::new(0.0, 0.0));
        assert_eq!(b.north_east, LatLng::new(1.0, 1.0));
        assert!(Polygon::new().bounds().is_none());
    }
}
