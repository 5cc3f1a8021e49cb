pub mod mock;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mesk_core::RawDetection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DetectError;
use crate::loader::ImageFrame;

/// Execution target for an inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// GPU or other accelerator.
    Accelerated,
    /// Plain CPU execution.
    Standard,
}

impl Device {
    /// Acquisition order: fastest first.
    pub const PREFERENCE: [Device; 2] = [Device::Accelerated, Device::Standard];
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Accelerated => f.write_str("accelerated"),
            Device::Standard => f.write_str("standard"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{device} backend: {message}")]
pub struct BackendError {
    pub device: Device,
    pub message: String,
}

/// A loaded object-detection model.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the model over one decoded image.
    ///
    /// Boxes are in the frame's pixel space. Failures are reported as
    /// [`DetectError::DetectionRuntime`].
    async fn detect(&self, frame: &ImageFrame) -> Result<Vec<RawDetection>, DetectError>;
}

/// Acquires an [`InferenceBackend`] on a given device.
///
/// Acquisition may be slow (model download, compilation). Fallback between
/// devices is the caller's job, not the loader's.
#[async_trait]
pub trait BackendLoader: Send + Sync {
    async fn load(&self, device: Device) -> Result<Arc<dyn InferenceBackend>, BackendError>;
}
