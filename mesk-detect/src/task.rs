use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mesk_core::{
    AnalysisStatus, DetectionResult, ImageHandle, ImageId, RawDetection, UploadedImage,
};
use tracing::{debug, info, warn};

use crate::model::{DetectionModel, ModelStatus};
use crate::{DetectError, loader, reducer, simulate};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub score_threshold: f64,
    /// Wait before an image moves to `Analyzing`.
    pub load_delay: Duration,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            score_threshold: reducer::SCORE_THRESHOLD,
            load_delay: Duration::from_millis(500),
        }
    }
}

/// Receives every new version of a task's record.
#[async_trait]
pub trait TaskObserver: Send + Sync {
    async fn publish(&self, image: &UploadedImage);
}

#[async_trait]
impl TaskObserver for () {
    async fn publish(&self, _image: &UploadedImage) {}
}

/// Analysis of one uploaded image, from `Pending` to `Complete`.
///
/// Always completes: model, decode and inference failures all resolve to a
/// simulated verdict for this image alone.
pub struct ImageAnalysisTask {
    image: UploadedImage,
    model: Arc<DetectionModel>,
    settings: AnalysisSettings,
}

impl ImageAnalysisTask {
    pub fn new(
        image: UploadedImage,
        model: Arc<DetectionModel>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            image,
            model,
            settings,
        }
    }

    pub fn id(&self) -> ImageId {
        self.image.id
    }

    /// Runs the analysis and returns the final record.
    ///
    /// A task whose image is not `Pending` does nothing; re-analysing needs a
    /// fresh upload.
    pub async fn run<O>(self, observer: &O) -> UploadedImage
    where
        O: TaskObserver + ?Sized,
    {
        let Self {
            image,
            model,
            settings,
        } = self;

        if image.status != AnalysisStatus::Pending {
            warn!(
                image_id = %image.id,
                status = ?image.status,
                "task already started, not re-running"
            );
            return image;
        }

        if !settings.load_delay.is_zero() {
            tokio::time::sleep(settings.load_delay).await;
        }

        let Some(analyzing) = image.analyzing() else {
            return image;
        };
        debug!(image_id = %analyzing.id, name = %analyzing.name, "analyzing");
        observer.publish(&analyzing).await;

        let result = match detect(&model, &analyzing.handle).await {
            Ok(raw) => reducer::reduce_with_threshold(raw, settings.score_threshold),
            Err(e) => {
                match &e {
                    DetectError::ModelUnavailable { .. } => {
                        debug!(image_id = %analyzing.id, "model unavailable, simulating")
                    }
                    _ => warn!(image_id = %analyzing.id, error = %e, "analysis failed, simulating"),
                }
                simulated()
            }
        };

        info!(
            image_id = %analyzing.id,
            pest_detected = result.pest_detected,
            confidence = result.confidence,
            source = ?result.source,
            "analysis finished"
        );

        let Some(complete) = analyzing.completed(result) else {
            return analyzing;
        };
        observer.publish(&complete).await;
        complete
    }
}

async fn detect(
    model: &DetectionModel,
    handle: &ImageHandle,
) -> Result<Vec<RawDetection>, DetectError> {
    // Acquire before decoding so a degraded model skips the decode.
    if let ModelStatus::Degraded(reason) = model.acquire().await {
        return Err(DetectError::ModelUnavailable { reason });
    }
    let frame = loader::load(handle).await?;
    model.detect(&frame).await
}

fn simulated() -> DetectionResult {
    simulate::simulate(&mut rand::rng())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;

    use image::{ImageFormat, RgbImage};
    use mesk_core::ResultSource;

    use super::*;
    use crate::backend::mock::ScriptedLoader;
    use crate::loader::ImageFrame;
    use crate::notify::TracingNotifier;

    fn png(width: u32, height: u32) -> ImageHandle {
        let mut bytes = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageHandle::from(bytes)
    }

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            load_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn task(loader: &ScriptedLoader, handle: ImageHandle) -> ImageAnalysisTask {
        let model = DetectionModel::new(Arc::new(loader.clone()), Arc::new(TracingNotifier));
        ImageAnalysisTask::new(
            UploadedImage::new("leaf.png", handle),
            Arc::new(model),
            settings(),
        )
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<AnalysisStatus>>);

    #[async_trait]
    impl TaskObserver for Recorder {
        async fn publish(&self, image: &UploadedImage) {
            self.0.lock().unwrap().push(image.status);
        }
    }

    #[tokio::test]
    async fn real_detections_are_reduced() {
        let loader = ScriptedLoader::new([("caterpillar", 0.64), ("bird", 0.12)]);
        let recorder = Recorder::default();

        let image = task(&loader, png(4, 4)).run(&recorder).await;

        assert_eq!(image.status, AnalysisStatus::Complete);
        let result = image.result.unwrap();
        assert_eq!(result.source, ResultSource::Model);
        assert!(result.pest_detected);
        assert_eq!(result.confidence, 64);
        assert_eq!(result.pest_type.as_deref(), Some("Caterpillars"));
        assert_eq!(result.detections.len(), 1);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![AnalysisStatus::Analyzing, AnalysisStatus::Complete]
        );
    }

    #[tokio::test]
    async fn degraded_model_simulates() {
        let loader = ScriptedLoader::unavailable();

        let image = task(&loader, png(4, 4)).run(&()).await;

        let result = image.result.unwrap();
        assert_eq!(result.source, ResultSource::Simulated);
        assert!(result.detections.is_empty());
    }

    #[tokio::test]
    async fn runtime_failure_simulates() {
        let loader = ScriptedLoader::new([("aphid", 0.9)]).with_script(Arc::new(|_: &ImageFrame| {
            Err::<Vec<RawDetection>, _>(DetectError::DetectionRuntime(
                "tensor shape mismatch".into(),
            ))
        }));

        let image = task(&loader, png(4, 4)).run(&()).await;

        assert_eq!(image.status, AnalysisStatus::Complete);
        assert_eq!(image.result.unwrap().source, ResultSource::Simulated);
    }

    #[tokio::test]
    async fn undecodable_image_simulates() {
        let loader = ScriptedLoader::new([("aphid", 0.9)]);

        let image = task(&loader, ImageHandle::from(b"GIF89a?".to_vec()))
            .run(&())
            .await;

        assert_eq!(image.result.unwrap().source, ResultSource::Simulated);
        assert_eq!(loader.attempts(), 1);
    }

    #[tokio::test]
    async fn completed_image_is_not_rerun() {
        let loader = ScriptedLoader::new([("aphid", 0.9)]);
        let first = task(&loader, png(2, 2)).run(&()).await;
        let recorder = Recorder::default();

        let model = DetectionModel::new(Arc::new(loader.clone()), Arc::new(TracingNotifier));
        let again = ImageAnalysisTask::new(first.clone(), Arc::new(model), settings())
            .run(&recorder)
            .await;

        assert_eq!(again.result, first.result);
        assert!(recorder.0.lock().unwrap().is_empty());
    }
}
