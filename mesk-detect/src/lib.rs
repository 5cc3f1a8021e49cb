//! Pest detection pipeline.
//!
//! A single [`DetectionModel`] is built at startup and shared by every
//! [`ImageAnalysisTask`]. Model acquisition happens at most once; when no
//! backend can be acquired the pipeline keeps working on simulated verdicts.

pub mod backend;
pub mod loader;
pub mod model;
pub mod notify;
pub mod queue;
pub mod reducer;
pub mod simulate;
pub mod task;

use thiserror::Error;

pub use backend::{BackendError, BackendLoader, Device, InferenceBackend};
pub use loader::ImageFrame;
pub use model::{DetectionModel, ModelStatus};
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use queue::{QueueSummary, Upload, UploadQueue};
pub use reducer::{SCORE_THRESHOLD, reduce};
pub use task::{AnalysisSettings, ImageAnalysisTask, TaskObserver};

/// Failures inside the pipeline. None of them reach the operator: every one
/// resolves to a simulated verdict for the affected image.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detection model unavailable: {reason}")]
    ModelUnavailable { reason: String },
    #[error("detection failed: {0}")]
    DetectionRuntime(String),
    #[error("image could not be loaded: {0}")]
    ImageLoad(String),
}
