use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

type BoxStr = Box<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Ulid);

impl ImageId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmId(pub Ulid);

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}°N, {:.6}°W", self.lat, self.lng)
    }
}

/// How a map click is interpreted while a farm is being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMode {
    #[default]
    Location,
    Boundary,
}

/// A saved farm with its marked location and area-of-interest boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    pub id: FarmId,
    pub name: BoxStr,
    pub description: BoxStr,
    pub location: GeoPoint,
    pub boundary: Box<[GeoPoint]>,
    pub area_acres: f64,
    pub created_at: jiff::Timestamp,
}

/// Per-image analysis lifecycle. Only ever moves forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Analyzing,
    Complete,
}

impl AnalysisStatus {
    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Analyzing),
            Self::Analyzing => Some(Self::Complete),
            Self::Complete => None,
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Queued",
            Self::Analyzing => "Analyzing",
            Self::Complete => "Complete",
        };
        f.write_str(label)
    }
}

/// Pixel-space box in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// One prediction from the inference backend, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f64,
}

/// Where a [`DetectionResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    Model,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub pest_detected: bool,
    /// Whole percent, 0..=100.
    pub confidence: u8,
    pub pest_type: Option<String>,
    pub detections: Vec<RawDetection>,
    pub recommendations: Vec<String>,
    pub source: ResultSource,
}

impl DetectionResult {
    /// The first `limit` detections, for display.
    pub fn top_detections(&self, limit: usize) -> &[RawDetection] {
        &self.detections[..self.detections.len().min(limit)]
    }
}

/// Opaque reference to the bytes of an uploaded image.
#[derive(Clone)]
pub enum ImageHandle {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageHandle {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageHandle {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub id: ImageId,
    pub name: BoxStr,
    #[serde(skip)]
    pub handle: ImageHandle,
    pub status: AnalysisStatus,
    pub result: Option<DetectionResult>,
    pub uploaded_at: jiff::Timestamp,
}

impl UploadedImage {
    pub fn new(name: impl Into<BoxStr>, handle: ImageHandle) -> Self {
        Self {
            id: ImageId::new(),
            name: name.into(),
            handle,
            status: AnalysisStatus::Pending,
            result: None,
            uploaded_at: jiff::Timestamp::now(),
        }
    }

    /// New version of this record in the `Analyzing` state.
    ///
    /// Returns `None` unless the record is currently `Pending`.
    pub fn analyzing(&self) -> Option<Self> {
        (self.status.next() == Some(AnalysisStatus::Analyzing)).then(|| Self {
            status: AnalysisStatus::Analyzing,
            ..self.clone()
        })
    }

    /// New version of this record, `Complete` with its result set.
    ///
    /// Returns `None` unless the record is currently `Analyzing`.
    pub fn completed(&self, result: DetectionResult) -> Option<Self> {
        (self.status.next() == Some(AnalysisStatus::Complete)).then(|| Self {
            status: AnalysisStatus::Complete,
            result: Some(result),
            ..self.clone()
        })
    }
}
