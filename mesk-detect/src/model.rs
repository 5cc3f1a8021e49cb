use std::sync::{Arc, Mutex, PoisonError};

use mesk_core::RawDetection;
use tokio::sync::{OnceCell, watch};
use tracing::{error, info, warn};

use crate::DetectError;
use crate::backend::{BackendLoader, Device, InferenceBackend};
use crate::loader::ImageFrame;
use crate::notify::{Notification, Notifier};

/// Lifecycle of the shared model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Uninitialized,
    Initializing,
    Ready(Device),
    Degraded(String),
}

#[derive(Clone)]
enum Acquired {
    Ready {
        device: Device,
        backend: Arc<dyn InferenceBackend>,
    },
    Degraded {
        reason: String,
    },
}

type Acquisition = Arc<OnceCell<Acquired>>;

/// Shared handle to the object-detection capability.
///
/// Construct once and hand an `Arc` to every task. The first caller that
/// needs the model runs the acquisition protocol (accelerated device, then
/// standard, then degraded); concurrent callers wait on that same attempt.
/// The outcome is kept until [`DetectionModel::reset`].
pub struct DetectionModel {
    loader: Arc<dyn BackendLoader>,
    notifier: Arc<dyn Notifier>,
    acquisition: Mutex<Acquisition>,
    status: watch::Sender<ModelStatus>,
}

impl DetectionModel {
    pub fn new(loader: Arc<dyn BackendLoader>, notifier: Arc<dyn Notifier>) -> Self {
        let (status, _) = watch::channel(ModelStatus::Uninitialized);
        Self {
            loader,
            notifier,
            acquisition: Mutex::new(Arc::new(OnceCell::new())),
            status,
        }
    }

    pub fn status(&self) -> ModelStatus {
        self.status.borrow().clone()
    }

    /// Watch lifecycle changes, e.g. to show a "loading model" indicator.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.status.subscribe()
    }

    /// Acquires the model if no attempt has been made yet and returns the
    /// settled state, either `Ready` or `Degraded`.
    pub async fn acquire(&self) -> ModelStatus {
        match self.acquired().await {
            Acquired::Ready { device, .. } => ModelStatus::Ready(device),
            Acquired::Degraded { reason } => ModelStatus::Degraded(reason),
        }
    }

    /// Runs the backend over `frame`.
    ///
    /// A degraded model fails with [`DetectError::ModelUnavailable`]; callers
    /// are expected to fall back to a simulated verdict.
    pub async fn detect(&self, frame: &ImageFrame) -> Result<Vec<RawDetection>, DetectError> {
        match self.acquired().await {
            Acquired::Ready { backend, .. } => backend.detect(frame).await,
            Acquired::Degraded { reason } => Err(DetectError::ModelUnavailable { reason }),
        }
    }

    /// Forgets the cached outcome. The next caller acquires again.
    pub fn reset(&self) {
        *self.lock_acquisition() = Arc::new(OnceCell::new());
        self.status.send_replace(ModelStatus::Uninitialized);
        info!("detection model reset");
    }

    fn lock_acquisition(&self) -> std::sync::MutexGuard<'_, Acquisition> {
        self.acquisition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquired(&self) -> Acquired {
        let cell = Arc::clone(&self.lock_acquisition());
        cell.get_or_init(|| self.run_acquisition(&cell))
            .await
            .clone()
    }

    async fn run_acquisition(&self, cell: &Acquisition) -> Acquired {
        self.publish(cell, ModelStatus::Initializing);
        info!("acquiring detection model");

        let mut failures = Vec::new();
        for device in Device::PREFERENCE {
            match self.loader.load(device).await {
                Ok(backend) => {
                    info!(%device, backend = backend.name(), "detection model ready");
                    self.publish(cell, ModelStatus::Ready(device));
                    self.notifier.notify(Notification::ModelReady { device });
                    return Acquired::Ready { device, backend };
                }
                Err(e) => {
                    warn!(%device, error = %e, "backend acquisition failed");
                    failures.push(e.to_string());
                }
            }
        }

        let reason = failures.join("; ");
        error!(%reason, "no detection backend available, using simulated analysis");
        self.publish(cell, ModelStatus::Degraded(reason.clone()));
        self.notifier.notify(Notification::ModelUnavailable {
            reason: reason.clone(),
        });

        Acquired::Degraded { reason }
    }

    /// Status updates from an attempt that was superseded by `reset` are dropped.
    fn publish(&self, cell: &Acquisition, status: ModelStatus) {
        if Arc::ptr_eq(cell, &self.lock_acquisition()) {
            self.status.send_replace(status);
        }
    }
}
