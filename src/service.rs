//! Decode → detect → compose pipeline and the reports served over HTTP.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use crate::compose::compose;
use crate::config::ServiceConfig;
use crate::decode::{decode_base64_image, DecodeError};
use crate::detect::DetectorCapability;

pub const MODEL_TYPE: &str = "yolov8-face";
pub const SERVICE_NAME: &str = "YOLO Face Detection";
pub const MODEL_DESCRIPTION: &str = "YOLOv8n (standard)";

const MOCK_FACE_COUNT: u32 = 1;
const MOCK_CONFIDENCE: f32 = 0.95;
const MOCK_NOTE: &str = "Model not loaded - mock response";

#[derive(Clone, Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 frame, optionally with a data-URL header.
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub face_count: u32,
    pub confidence: f32,
    pub looking_away: bool,
    pub processing_time_ms: f64,
    pub bounding_boxes: Option<Vec<[f32; 4]>>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
    pub model_type: String,
    pub confidence_threshold: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServiceMetadata {
    pub service: &'static str,
    pub version: &'static str,
    pub model: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Clone, Debug, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub analyze: &'static str,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Client sent something that is not a decodable image.
    #[error(transparent)]
    InvalidImage(#[from] DecodeError),

    /// Anything that went wrong after decoding.
    #[error("{0:#}")]
    Inference(#[from] anyhow::Error),
}

impl AnalyzeError {
    /// HTTP status the error maps to.
    pub fn status(&self) -> u16 {
        match self {
            AnalyzeError::InvalidImage(_) => 400,
            AnalyzeError::Inference(_) => 500,
        }
    }
}

/// Shared, read-only request handler state.
pub struct ProctorService {
    config: ServiceConfig,
    detector: DetectorCapability,
}

impl ProctorService {
    pub fn new(config: ServiceConfig, detector: DetectorCapability) -> Self {
        Self { config, detector }
    }

    pub fn health(&self) -> HealthResponse {
        let model_loaded = self.detector.is_loaded();
        HealthResponse {
            status: if model_loaded { "healthy" } else { "degraded" }.to_string(),
            model_loaded,
            model_path: self.config.model_path.clone(),
            model_type: MODEL_TYPE.to_string(),
            confidence_threshold: self.config.confidence_threshold,
        }
    }

    pub fn metadata(&self) -> ServiceMetadata {
        ServiceMetadata {
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            model: MODEL_DESCRIPTION,
            endpoints: Endpoints {
                health: "GET /health",
                analyze: "POST /analyze",
            },
        }
    }

    /// Count faces in a frame and estimate whether the subject looks away.
    ///
    /// Without a model this returns the fixed placeholder result and never
    /// touches the image.
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, AnalyzeError> {
        let start = Instant::now();

        let backend = match &self.detector {
            DetectorCapability::Initialized(backend) => backend,
            DetectorCapability::Unavailable { .. } => {
                log::warn!("model not loaded, returning mock response");
                return Ok(AnalyzeResponse {
                    success: true,
                    face_count: MOCK_FACE_COUNT,
                    confidence: MOCK_CONFIDENCE,
                    looking_away: false,
                    processing_time_ms: elapsed_ms(start),
                    bounding_boxes: None,
                    error: Some(MOCK_NOTE.to_string()),
                });
            }
        };

        let image = decode_base64_image(&request.image, self.config.max_image_size)
            .inspect_err(|err| log::error!("invalid image: {}", err))?;
        let detections = backend
            .detect(&image, self.config.confidence_threshold)
            .inspect_err(|err| log::error!("analysis error: {:#}", err))?;
        let composition = compose(&detections, image.width());
        let processing_time_ms = elapsed_ms(start);

        log::info!(
            "analysis complete: {} faces, conf={:.2}, looking_away={}, time={:.1}ms",
            composition.face_count,
            composition.confidence,
            composition.looking_away,
            processing_time_ms
        );

        Ok(AnalyzeResponse {
            success: true,
            face_count: composition.face_count,
            confidence: composition.confidence,
            looking_away: composition.looking_away,
            processing_time_ms,
            bounding_boxes: Some(composition.bounding_boxes),
            error: None,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, StubBackend};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_base64(width: u32, height: u32) -> String {
        let mut buf = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf)
    }

    fn service(detector: DetectorCapability) -> ProctorService {
        ProctorService::new(ServiceConfig::default(), detector)
    }

    #[test]
    fn degraded_service_returns_mock() {
        let svc = service(DetectorCapability::unavailable("no model"));
        let response = svc
            .analyze(&AnalyzeRequest {
                image: "garbage".to_string(),
            })
            .unwrap();
        assert!(response.success);
        assert_eq!(response.face_count, 1);
        assert_eq!(response.confidence, 0.95);
        assert!(!response.looking_away);
        assert!(response.bounding_boxes.is_none());
        assert_eq!(response.error.as_deref(), Some("Model not loaded - mock response"));

        let health = svc.health();
        assert_eq!(health.status, "degraded");
        assert!(!health.model_loaded);
    }

    #[test]
    fn analyze_composes_detections() {
        let svc = service(DetectorCapability::initialized(StubBackend::new(vec![
            Detection::new(600.0, 100.0, 640.0, 200.0, 0.8),
        ])));
        let response = svc
            .analyze(&AnalyzeRequest {
                image: png_base64(640, 480),
            })
            .unwrap();
        assert_eq!(response.face_count, 1);
        assert_eq!(response.confidence, 0.8);
        assert!(response.looking_away);
        assert_eq!(
            response.bounding_boxes,
            Some(vec![[600.0, 100.0, 640.0, 200.0]])
        );
        assert!(response.error.is_none());
        assert_eq!(svc.health().status, "healthy");
    }

    #[test]
    fn blank_frame_with_no_detections() {
        let svc = service(DetectorCapability::initialized(StubBackend::empty()));
        let response = svc
            .analyze(&AnalyzeRequest {
                image: png_base64(64, 64),
            })
            .unwrap();
        assert_eq!(response.face_count, 0);
        assert_eq!(response.confidence, 0.0);
        assert!(!response.looking_away);
        assert_eq!(response.bounding_boxes, Some(vec![]));
    }

    #[test]
    fn invalid_image_maps_to_400() {
        let svc = service(DetectorCapability::initialized(StubBackend::empty()));
        let err = svc
            .analyze(&AnalyzeRequest {
                image: "%%%".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("Invalid image data"));
    }

    #[test]
    fn inference_failure_maps_to_500() {
        struct Failing;
        impl crate::detect::DetectorBackend for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn detect(&self, _: &RgbImage, _: f32) -> anyhow::Result<Vec<Detection>> {
                Err(anyhow::anyhow!("tensor shape mismatch"))
            }
        }

        let svc = service(DetectorCapability::initialized(Failing));
        let err = svc
            .analyze(&AnalyzeRequest {
                image: png_base64(8, 8),
            })
            .unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "tensor shape mismatch");
    }
}
