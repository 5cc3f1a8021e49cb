use mesk_core::ImageId;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::Device;

/// Discrete events surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ModelReady { device: Device },
    ModelUnavailable { reason: String },
    AnalysisComplete { image_id: ImageId, image_name: String },
}

/// Fire-and-forget sink for [`Notification`]s.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::ModelReady { device } => {
                info!(%device, "AI model ready: pest detection model loaded");
            }
            Notification::ModelUnavailable { reason } => {
                warn!(%reason, "model load failed: using simulated analysis");
            }
            Notification::AnalysisComplete {
                image_id,
                image_name,
            } => {
                info!(%image_id, %image_name, "analysis complete");
            }
        }
    }
}

/// Forwards notifications over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(notification);
    }
}
