use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mesk_core::{BoundingBox, RawDetection};
use tokio::sync::Notify;
use tracing::{debug, info};

use super::{BackendError, BackendLoader, Device, InferenceBackend};
use crate::DetectError;
use crate::loader::ImageFrame;

/// Produces the raw predictions for one frame.
pub type Script = Arc<dyn Fn(&ImageFrame) -> Result<Vec<RawDetection>, DetectError> + Send + Sync>;

/// Loader for a backend whose predictions are scripted rather than inferred.
///
/// Used when no model runtime is available on the host, and throughout the
/// tests. Each device can be marked unavailable to exercise fallback, and
/// frames of a given width can be held until released to control completion
/// order.
#[derive(Clone)]
pub struct ScriptedLoader {
    accelerated: bool,
    standard: bool,
    load_delay: Duration,
    script: Script,
    holds: Arc<Mutex<HashMap<u32, Arc<Notify>>>>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedLoader {
    /// Every frame yields one full-frame detection per `(label, score)`.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let labels: Vec<(String, f64)> = labels
            .into_iter()
            .map(|(label, score)| (label.into(), score))
            .collect();

        let script: Script = Arc::new(move |frame: &ImageFrame| {
            Ok(labels
                .iter()
                .map(|(label, score)| RawDetection {
                    bbox: BoundingBox {
                        xmin: 0.0,
                        ymin: 0.0,
                        xmax: f64::from(frame.width),
                        ymax: f64::from(frame.height),
                    },
                    label: label.clone(),
                    score: *score,
                })
                .collect())
        });

        Self {
            accelerated: true,
            standard: true,
            load_delay: Duration::ZERO,
            script,
            holds: Arc::new(Mutex::new(HashMap::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A loader for which every device fails.
    pub fn unavailable() -> Self {
        Self {
            accelerated: false,
            standard: false,
            ..Self::new(Vec::<(String, f64)>::new())
        }
    }

    pub fn without_accelerator(mut self) -> Self {
        self.accelerated = false;
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Frames of this width block inside `detect` until the returned handle
    /// is notified.
    pub fn hold_width(&self, width: u32) -> Arc<Notify> {
        let mut holds = self.holds.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(holds.entry(width).or_default())
    }

    /// Number of `load` calls made so far, across all devices.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendLoader for ScriptedLoader {
    async fn load(&self, device: Device) -> Result<Arc<dyn InferenceBackend>, BackendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        let available = match device {
            Device::Accelerated => self.accelerated,
            Device::Standard => self.standard,
        };
        if !available {
            return Err(BackendError {
                device,
                message: "device not available".into(),
            });
        }

        info!(%device, "scripted backend loaded");
        Ok(Arc::new(ScriptedBackend {
            script: Arc::clone(&self.script),
            holds: Arc::clone(&self.holds),
        }))
    }
}

struct ScriptedBackend {
    script: Script,
    holds: Arc<Mutex<HashMap<u32, Arc<Notify>>>>,
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn detect(&self, frame: &ImageFrame) -> Result<Vec<RawDetection>, DetectError> {
        let hold = self
            .holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&frame.width)
            .cloned();

        if let Some(hold) = hold {
            debug!(width = frame.width, "holding frame");
            hold.notified().await;
        }

        (self.script)(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_devices_fail() {
        let loader = ScriptedLoader::new([("aphid", 0.9)]).without_accelerator();

        let err = loader.load(Device::Accelerated).await.err().unwrap();
        assert_eq!(err.device, Device::Accelerated);
        assert!(loader.load(Device::Standard).await.is_ok());
        assert_eq!(loader.attempts(), 2);
    }

    #[tokio::test]
    async fn detections_cover_the_frame() {
        let loader = ScriptedLoader::new([("aphid", 0.9), ("bird", 0.2)]);
        let backend = loader.load(Device::Standard).await.unwrap();

        let frame = ImageFrame::new(8, 6, vec![0; 8 * 6 * 3]);
        let detections = backend.detect(&frame).await.unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "aphid");
        assert_eq!(detections[0].bbox.xmax, 8.0);
        assert_eq!(detections[0].bbox.ymax, 6.0);
    }
}
