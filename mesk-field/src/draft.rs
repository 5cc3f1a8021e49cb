use mesk_core::{Farm, FarmId, GeoPoint};
use thiserror::Error;
use tracing::info;
use ulid::Ulid;

use crate::area;
use crate::capture::BoundaryCaptureSession;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("farm name is required")]
    MissingName,
    #[error("farm location is required")]
    MissingLocation,
}

/// A farm being edited. Lives for one editing session and is emptied again
/// on save or cancel.
#[derive(Debug, Clone, Default)]
pub struct FarmDraft {
    pub name: String,
    pub description: String,
    session: BoundaryCaptureSession,
}

impl FarmDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &BoundaryCaptureSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BoundaryCaptureSession {
        &mut self.session
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.session.location()
    }

    pub fn boundary(&self) -> &[GeoPoint] {
        self.session.boundary()
    }

    pub fn area_acres(&self) -> f64 {
        area::round_acres(self.session.current_area_acres())
    }

    /// Validates the draft and turns it into a [`Farm`].
    ///
    /// On success the draft is reset. On failure it is left untouched so the
    /// operator can fix it.
    pub fn save(&mut self) -> Result<Farm, DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        let location = self.location().ok_or(DraftError::MissingLocation)?;

        let farm = Farm {
            id: FarmId(Ulid::new()),
            name: self.name.as_str().into(),
            description: self.description.as_str().into(),
            location,
            boundary: self.boundary().into(),
            area_acres: self.area_acres(),
            created_at: jiff::Timestamp::now(),
        };

        info!(
            farm_id = %farm.id.0,
            name = %farm.name,
            points = farm.boundary.len(),
            area_acres = farm.area_acres,
            "farm saved"
        );

        self.cancel();
        Ok(farm)
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use mesk_core::CaptureMode;

    use super::*;

    fn drawn_draft() -> FarmDraft {
        let mut draft = FarmDraft::new();
        draft.name = "North Field".into();
        draft.description = "Maize, rain-fed".into();

        let session = draft.session_mut();
        session.record_point(GeoPoint::new(40.7, -74.0));
        session.set_mode(CaptureMode::Boundary);
        session.record_point(GeoPoint::new(0.0, 0.0));
        session.record_point(GeoPoint::new(0.0, 1.0));
        session.record_point(GeoPoint::new(1.0, 1.0));
        draft
    }

    #[test]
    fn save_produces_farm_and_resets() {
        let mut draft = drawn_draft();

        let farm = draft.save().unwrap();
        assert_eq!(&*farm.name, "North Field");
        assert_eq!(farm.location, GeoPoint::new(40.7, -74.0));
        assert_eq!(farm.boundary.len(), 3);
        assert_eq!(farm.area_acres, 123.55);

        assert!(draft.name.is_empty());
        assert!(draft.location().is_none());
        assert!(draft.boundary().is_empty());
        assert_eq!(draft.session().mode(), CaptureMode::Location);
    }

    #[test]
    fn save_requires_name() {
        let mut draft = drawn_draft();
        draft.name = "   ".into();

        assert_eq!(draft.save().unwrap_err(), DraftError::MissingName);
        assert_eq!(draft.boundary().len(), 3);
    }

    #[test]
    fn save_requires_location() {
        let mut draft = FarmDraft::new();
        draft.name = "South Field".into();

        assert_eq!(draft.save().unwrap_err(), DraftError::MissingLocation);
        assert_eq!(draft.name, "South Field");
    }

    #[test]
    fn boundary_is_optional() {
        let mut draft = FarmDraft::new();
        draft.name = "Orchard".into();
        draft.session_mut().record_point(GeoPoint::new(1.0, 1.0));

        let farm = draft.save().unwrap();
        assert_eq!(farm.area_acres, 0.0);
        assert!(farm.boundary.is_empty());
    }
}
