use mesk_core::GeoPoint;
use serde::Deserialize;

/// Maps clicks on a rectangular map surface to coordinates.
///
/// The surface shows a square window of `span` degrees centred on `center`.
/// Latitude grows downwards, matching how the map surface is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapViewport {
    pub center: GeoPoint,
    pub span: f64,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(40.7, -74.0),
            span: 0.1,
        }
    }
}

impl MapViewport {
    /// Converts a click at `(x, y)` on a `width` x `height` surface.
    pub fn project(&self, x: f64, y: f64, width: f64, height: f64) -> GeoPoint {
        GeoPoint {
            lat: self.center.lat + (y / height - 0.5) * self.span,
            lng: self.center.lng + (x / width - 0.5) * self.span,
        }
    }
}
