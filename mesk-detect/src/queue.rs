use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mesk_core::{AnalysisStatus, ImageHandle, ImageId, UploadedImage};
use tokio::sync::RwLock;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::model::{DetectionModel, ModelStatus};
use crate::notify::{Notification, Notifier};
use crate::task::{AnalysisSettings, ImageAnalysisTask, TaskObserver};

/// One file handed over by the operator.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub handle: ImageHandle,
}

impl Upload {
    pub fn new(name: impl Into<String>, handle: impl Into<ImageHandle>) -> Self {
        Self {
            name: name.into(),
            handle: handle.into(),
        }
    }

    /// Names the upload after the file's last path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub total: usize,
    pub complete: usize,
    pub pests_detected: usize,
    /// The shared model is still being acquired.
    pub model_loading: bool,
}

#[derive(Default)]
struct Records {
    order: Vec<ImageId>,
    by_id: HashMap<ImageId, UploadedImage>,
}

/// Upload records keyed by id.
///
/// Tasks replace their own record wholesale; no update ever goes through a
/// position, so completions in any order leave other records alone.
#[derive(Clone, Default)]
struct ImageRecords {
    inner: Arc<RwLock<Records>>,
}

impl ImageRecords {
    async fn insert(&self, image: UploadedImage) {
        let mut records = self.inner.write().await;
        records.order.push(image.id);
        let _ = records.by_id.insert(image.id, image);
    }

    async fn list(&self) -> Vec<UploadedImage> {
        let records = self.inner.read().await;
        records
            .order
            .iter()
            .filter_map(|id| records.by_id.get(id))
            .cloned()
            .collect()
    }

    async fn get(&self, id: ImageId) -> Option<UploadedImage> {
        self.inner.read().await.by_id.get(&id).cloned()
    }
}

#[async_trait]
impl TaskObserver for ImageRecords {
    async fn publish(&self, image: &UploadedImage) {
        let mut records = self.inner.write().await;
        match records.by_id.get_mut(&image.id) {
            Some(current) if current.status <= image.status => *current = image.clone(),
            Some(current) => warn!(
                image_id = %image.id,
                current = ?current.status,
                stale = ?image.status,
                "ignoring stale record"
            ),
            None => warn!(image_id = %image.id, "ignoring record for unknown image"),
        }
    }
}

/// Runs one analysis task per uploaded image.
///
/// Every upload starts its task immediately; there is no batching or
/// backpressure. The queue only keeps the records so they can be rendered.
#[derive(Clone)]
pub struct UploadQueue {
    model: Arc<DetectionModel>,
    notifier: Arc<dyn Notifier>,
    settings: AnalysisSettings,
    records: ImageRecords,
    tracker: TaskTracker,
}

impl UploadQueue {
    pub fn new(
        model: Arc<DetectionModel>,
        notifier: Arc<dyn Notifier>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            model,
            notifier,
            settings,
            records: ImageRecords::default(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn model(&self) -> &Arc<DetectionModel> {
        &self.model
    }

    /// Records every upload as `Pending` and starts its analysis.
    ///
    /// Returns the new ids in upload order.
    pub async fn upload<I>(&self, uploads: I) -> Vec<ImageId>
    where
        I: IntoIterator<Item = Upload>,
    {
        let mut ids = Vec::new();

        for upload in uploads {
            let image = UploadedImage::new(upload.name, upload.handle);
            let id = image.id;
            self.records.insert(image.clone()).await;

            let task = ImageAnalysisTask::new(image, Arc::clone(&self.model), self.settings);
            let records = self.records.clone();
            let notifier = Arc::clone(&self.notifier);

            self.tracker.spawn(async move {
                let image = task.run(&records).await;
                notifier.notify(Notification::AnalysisComplete {
                    image_id: image.id,
                    image_name: image.name.to_string(),
                });
            });

            ids.push(id);
        }

        info!(count = ids.len(), "images queued for analysis");
        ids
    }

    /// Current records in upload order.
    pub async fn images(&self) -> Vec<UploadedImage> {
        self.records.list().await
    }

    pub async fn get(&self, id: ImageId) -> Option<UploadedImage> {
        self.records.get(id).await
    }

    pub async fn summary(&self) -> QueueSummary {
        let images = self.images().await;
        QueueSummary {
            total: images.len(),
            complete: images
                .iter()
                .filter(|i| i.status == AnalysisStatus::Complete)
                .count(),
            pests_detected: images
                .iter()
                .filter(|i| i.result.as_ref().is_some_and(|r| r.pest_detected))
                .count(),
            model_loading: self.model.status() == ModelStatus::Initializing,
        }
    }

    /// Waits until every task started so far has finished.
    ///
    /// Uploads made while waiting are waited for too. Not meant to be called
    /// from several places at once.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use mesk_core::{DetectionResult, ResultSource};

    use super::*;

    fn result() -> DetectionResult {
        DetectionResult {
            pest_detected: true,
            confidence: 77,
            pest_type: Some("Thrips".into()),
            detections: vec![],
            recommendations: vec![],
            source: ResultSource::Simulated,
        }
    }

    #[tokio::test]
    async fn publish_replaces_by_id_only() {
        let records = ImageRecords::default();
        let a = UploadedImage::new("a.jpg", ImageHandle::from(vec![0]));
        let b = UploadedImage::new("b.jpg", ImageHandle::from(vec![1]));
        records.insert(a.clone()).await;
        records.insert(b.clone()).await;

        let b_done = b.analyzing().unwrap().completed(result()).unwrap();
        records.publish(&b_done).await;
        records.publish(&a.analyzing().unwrap()).await;

        let list = records.list().await;
        assert_eq!(list[0].id, a.id);
        assert_eq!(list[0].status, AnalysisStatus::Analyzing);
        assert_eq!(list[1].id, b.id);
        assert_eq!(list[1].status, AnalysisStatus::Complete);
    }

    #[tokio::test]
    async fn stale_versions_are_ignored() {
        let records = ImageRecords::default();
        let image = UploadedImage::new("a.jpg", ImageHandle::from(vec![0]));
        records.insert(image.clone()).await;

        let analyzing = image.analyzing().unwrap();
        let done = analyzing.completed(result()).unwrap();
        records.publish(&done).await;
        records.publish(&analyzing).await;

        let current = records.get(image.id).await.unwrap();
        assert_eq!(current.status, AnalysisStatus::Complete);
        assert!(current.result.is_some());
    }

    #[test]
    fn upload_name_from_path() {
        let upload = Upload::from_path("/tmp/field/leaf-01.jpg");
        assert_eq!(upload.name, "leaf-01.jpg");
    }
}
