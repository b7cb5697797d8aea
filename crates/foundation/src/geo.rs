use serde::{Deserialize, Serialize};

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `[lng, lat]`, the coordinate order used by GeoJSON and the map engine.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat(coords: [f64; 2]) -> Self {
        Self::new(coords[1], coords[0])
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Component-wise comparison with tolerance `eps` degrees.
    pub fn approx_eq(&self, other: &LatLng, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lng - other.lng).abs() <= eps
    }
}

/// Pixel position relative to the top-left corner of the map canvas.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Camera state shared between the engine and the UI.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: f64,
}

/// Camera comparisons ignore sub-micro-degree jitter from engine round trips.
const VIEW_EPS_DEG: f64 = 1e-7;
const VIEW_EPS_ZOOM: f64 = 1e-6;

impl ViewState {
    pub const fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn approx_eq(&self, other: &ViewState) -> bool {
        self.center.approx_eq(&other.center, VIEW_EPS_DEG)
            && (self.zoom - other.zoom).abs() <= VIEW_EPS_ZOOM
    }
}
