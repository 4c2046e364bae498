use anyhow::Result;
use image::RgbImage;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// `detect` borrows the backend immutably: one instance is shared by every
/// request handler and must tolerate concurrent calls.
pub trait DetectorBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB image.
    ///
    /// Returns target-class detections scoring above
    /// `confidence_threshold`, ordered by descending confidence, with boxes
    /// in pixel coordinates of `image`.
    fn detect(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
