use mesk_core::{CaptureMode, GeoPoint};
use tracing::debug;

use crate::area;

/// Number of points a boundary needs before it encloses an area.
pub const MIN_BOUNDARY_POINTS: usize = 3;

/// Accumulates map clicks into a farm location and an area-of-interest boundary.
///
/// Boundary points are kept in capture order. They can only be appended or
/// cleared all at once.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCaptureSession {
    mode: CaptureMode,
    location: Option<GeoPoint>,
    boundary: Vec<GeoPoint>,
}

impl BoundaryCaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CaptureMode) {
        self.mode = mode;
    }

    /// Interprets a click according to the current mode.
    ///
    /// In `Location` mode the last click wins. In `Boundary` mode the point is
    /// appended as-is, duplicates included.
    pub fn record_point(&mut self, point: GeoPoint) {
        match self.mode {
            CaptureMode::Location => {
                debug!(lat = point.lat, lng = point.lng, "location set");
                self.location = Some(point);
            }
            CaptureMode::Boundary => {
                self.boundary.push(point);
                debug!(
                    lat = point.lat,
                    lng = point.lng,
                    points = self.boundary.len(),
                    "boundary point added"
                );
            }
        }
    }

    pub fn clear_boundary(&mut self) {
        self.boundary.clear();
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn boundary(&self) -> &[GeoPoint] {
        &self.boundary
    }

    pub fn current_area_acres(&self) -> f64 {
        area::area_acres(&self.boundary)
    }

    pub fn is_boundary_complete(&self) -> bool {
        self.boundary.len() >= MIN_BOUNDARY_POINTS
    }

    /// How many more clicks until the boundary is complete.
    pub fn points_remaining(&self) -> usize {
        MIN_BOUNDARY_POINTS.saturating_sub(self.boundary.len())
    }

    /// Drops all captured data and returns to `Location` mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
