use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Stub backend that reports a fixed set of detections.
///
/// Used for tests and for exercising the HTTP surface without a model file.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    detections: Vec<Detection>,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Backend that never detects anything.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, _image: &RgbImage, confidence_threshold: f32) -> Result<Vec<Detection>> {
        let mut detections: Vec<Detection> = self
            .detections
            .iter()
            .filter(|d| d.confidence > confidence_threshold)
            .copied()
            .collect();
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_applies_threshold_and_orders_by_confidence() {
        let backend = StubBackend::new(vec![
            Detection::new(0.0, 0.0, 1.0, 1.0, 0.6),
            Detection::new(0.0, 0.0, 1.0, 1.0, 0.3),
            Detection::new(0.0, 0.0, 1.0, 1.0, 0.9),
        ]);
        let image = RgbImage::new(4, 4);

        let found = backend.detect(&image, 0.5).unwrap();
        let scores: Vec<f32> = found.iter().map(|d| d.confidence).collect();
        assert_eq!(scores, vec![0.9, 0.6]);
    }

    #[test]
    fn stub_drops_scores_at_threshold() {
        let backend = StubBackend::new(vec![Detection::new(0.0, 0.0, 1.0, 1.0, 0.5)]);
        let image = RgbImage::new(4, 4);
        assert!(backend.detect(&image, 0.5).unwrap().is_empty());
    }

    #[test]
    fn empty_stub_reports_nothing() {
        let image = RgbImage::new(4, 4);
        assert!(StubBackend::empty().detect(&image, 0.0).unwrap().is_empty());
    }
}
