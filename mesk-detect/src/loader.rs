use std::sync::Arc;

use mesk_core::ImageHandle;
use tracing::debug;

use crate::DetectError;

/// A decoded RGB8 image.
#[derive(Clone)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    pixels: Arc<[u8]>,
}

impl ImageFrame {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Row-major RGB bytes, three per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Reads and decodes the image behind `handle`.
///
/// Decoding runs on the blocking pool. Any read or decode failure is
/// [`DetectError::ImageLoad`].
pub async fn load(handle: &ImageHandle) -> Result<ImageFrame, DetectError> {
    let bytes: Arc<[u8]> = match handle {
        ImageHandle::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|e| DetectError::ImageLoad(format!("{}: {e}", path.display())))?
            .into(),
        ImageHandle::Bytes(bytes) => Arc::clone(bytes),
    };

    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| DetectError::ImageLoad(e.to_string()))?
}

fn decode(bytes: &[u8]) -> Result<ImageFrame, DetectError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| DetectError::ImageLoad(e.to_string()))?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    debug!(width, height, "image decoded");

    Ok(ImageFrame::new(width, height, rgb.into_raw()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn decodes_png_bytes() {
        let frame = load(&ImageHandle::from(png(5, 3))).await.unwrap();
        assert_eq!((frame.width, frame.height), (5, 3));
        assert_eq!(frame.pixels().len(), 5 * 3 * 3);
    }

    #[tokio::test]
    async fn garbage_bytes_are_an_image_load_error() {
        let err = load(&ImageHandle::from(b"not an image".to_vec()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DetectError::ImageLoad(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_image_load_error() {
        let handle = ImageHandle::Path("/nonexistent/leaf.jpg".into());
        let err = load(&handle).await.err().unwrap();
        assert!(matches!(err, DetectError::ImageLoad(_)));
    }
}
