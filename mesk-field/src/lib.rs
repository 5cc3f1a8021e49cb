//! Boundary geometry for farm registration: marking a location, drawing an
//! area-of-interest polygon and estimating its size.

pub mod area;
pub mod capture;
pub mod draft;
pub mod viewport;

pub use area::{ACRES_PER_SQUARE_DEGREE, area_acres, planar_area, round_acres};
pub use capture::{BoundaryCaptureSession, MIN_BOUNDARY_POINTS};
pub use draft::{DraftError, FarmDraft};
pub use viewport::MapViewport;
