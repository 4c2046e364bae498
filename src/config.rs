use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

const DEFAULT_MODEL_PATH: &str = "yolov8n-face.onnx";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_MAX_IMAGE_SIZE: u32 = 1280;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
const DEFAULT_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Deserialize, Default)]
struct ServiceConfigFile {
    model_path: Option<String>,
    confidence_threshold: Option<f32>,
    max_image_size: Option<u32>,
    input_size: Option<u32>,
    iou_threshold: Option<f32>,
    addr: Option<String>,
}

/// Process-wide service settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// ONNX model file handed to the detector backend.
    pub model_path: String,
    /// Minimum score for a detection to be reported.
    pub confidence_threshold: f32,
    /// Longest side of a decoded image; larger images are downscaled.
    pub max_image_size: u32,
    /// Square model input resolution.
    pub input_size: u32,
    /// IoU above which overlapping detections are suppressed.
    pub iou_threshold: f32,
    /// Listen address for the HTTP server.
    pub addr: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_file(ServiceConfigFile::default())
    }
}

impl ServiceConfig {
    /// Load from the optional `PROCTOR_CONFIG` JSON file, then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PROCTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ServiceConfigFile) -> Self {
        Self {
            model_path: file
                .model_path
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            max_image_size: file.max_image_size.unwrap_or(DEFAULT_MAX_IMAGE_SIZE),
            input_size: file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            iou_threshold: file.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
            addr: file.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("YOLO_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = path;
            }
        }
        if let Ok(addr) = std::env::var("PROCTOR_ADDR") {
            if !addr.trim().is_empty() {
                self.addr = addr;
            }
        }
        if let Some(threshold) = parse_env::<f32>("CONFIDENCE_THRESHOLD")? {
            self.confidence_threshold = threshold;
        }
        if let Some(size) = parse_env::<u32>("MAX_IMAGE_SIZE")? {
            self.max_image_size = size;
        }
        if let Some(size) = parse_env::<u32>("YOLO_INPUT_SIZE")? {
            self.input_size = size;
        }
        if let Some(threshold) = parse_env::<f32>("YOLO_IOU_THRESHOLD")? {
            self.iou_threshold = threshold;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(anyhow!(
                "IoU threshold must be within [0, 1], got {}",
                self.iou_threshold
            ));
        }
        if self.max_image_size == 0 {
            return Err(anyhow!("max image size must be greater than zero"));
        }
        if self.input_size == 0 {
            return Err(anyhow!("model input size must be greater than zero"));
        }
        if self.model_path.trim().is_empty() {
            return Err(anyhow!("model path must not be empty"));
        }
        self.addr
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("invalid listen address '{}': {}", self.addr, e))?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value '{}'", key, raw)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<ServiceConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
