use std::path::Path;

use mesk_core::GeoPoint;
use mesk_field::MapViewport;
use serde::Deserialize;

use crate::config::ConfigError;

/// Boundary input: coordinates, map clicks, or both.
///
/// ```toml
/// [[points]]
/// lat = 40.70
/// lng = -74.00
///
/// [surface]
/// width = 800
/// height = 384
///
/// [[clicks]]
/// x = 120
/// y = 64
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PointsFile {
    pub points: Vec<GeoPoint>,
    pub clicks: Vec<Click>,
    pub surface: Surface,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Click {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 384.0,
        }
    }
}

impl PointsFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Coordinates in capture order: explicit points, then projected clicks.
    pub fn boundary(&self, viewport: &MapViewport) -> Vec<GeoPoint> {
        let projected = self
            .clicks
            .iter()
            .map(|c| viewport.project(c.x, c.y, self.surface.width, self.surface.height));
        self.points.iter().copied().chain(projected).collect()
    }
}
