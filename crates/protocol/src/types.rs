use serde::{Deserialize, Serialize};

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Key used to cluster co-located places: both axes rounded to 6 decimals.
    pub fn grid_key(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lon)
    }

    /// Whether two coordinates refer to the same marker position.
    pub fn approx_eq(&self, other: &LatLon) -> bool {
        const TOLERANCE: f64 = 1e-6;
        (self.lat - other.lat).abs() < TOLERANCE && (self.lon - other.lon).abs() < TOLERANCE
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

impl Bounds {
    pub fn from_point(p: LatLon) -> Self {
        Self {
            south_west: p,
            north_east: p,
        }
    }

    /// Grow the bounds to include `p`.
    pub fn extend(&mut self, p: LatLon) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lon = self.south_west.lon.min(p.lon);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lon = self.north_east.lon.max(p.lon);
    }
}

/// A position on the minimap image, in percent of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimapPoint {
    pub x: f64,
    pub y: f64,
}

impl MinimapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
