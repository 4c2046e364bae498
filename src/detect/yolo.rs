//! YOLOv8 pre- and post-processing.
//!
//! Kept free of any inference runtime so the tensor layout handling can be
//! exercised without a model file.

use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

use crate::detect::result::Detection;

/// COCO "person"; also the only class of single-class face exports.
pub const TARGET_CLASS: usize = 0;

/// Gray used for letterbox padding.
pub const LETTERBOX_FILL: u8 = 114;

/// Aspect-preserving fit of a source image into a square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub source_width: u32,
    pub source_height: u32,
    pub target: u32,
}

impl Letterbox {
    pub fn new(source_width: u32, source_height: u32, target: u32) -> Self {
        let scale = (target as f32 / source_width.max(1) as f32)
            .min(target as f32 / source_height.max(1) as f32);
        let scaled_width = ((source_width as f32 * scale).round() as u32).clamp(1, target);
        let scaled_height = ((source_height as f32 * scale).round() as u32).clamp(1, target);
        Self {
            scale,
            pad_x: (target - scaled_width) / 2,
            pad_y: (target - scaled_height) / 2,
            scaled_width,
            scaled_height,
            source_width,
            source_height,
            target,
        }
    }

    /// Render `image` into a padded `target x target` canvas.
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let resized = image::imageops::resize(
            image,
            self.scaled_width,
            self.scaled_height,
            FilterType::Triangle,
        );
        let mut canvas = RgbImage::from_pixel(self.target, self.target, Rgb([LETTERBOX_FILL; 3]));
        image::imageops::overlay(&mut canvas, &resized, self.pad_x as i64, self.pad_y as i64);
        canvas
    }

    /// Map a point in model-input space back to source pixels.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let sx = (x - self.pad_x as f32) / self.scale;
        let sy = (y - self.pad_y as f32) / self.scale;
        (
            sx.clamp(0.0, self.source_width as f32),
            sy.clamp(0.0, self.source_height as f32),
        )
    }
}

/// Post-processing thresholds.
#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub target_class: usize,
}

/// Decode a `[1, 4 + classes, proposals]` YOLOv8 output tensor.
///
/// Each proposal contributes when its best class is the target class and that
/// score exceeds the confidence threshold. Survivors go through NMS and come
/// back sorted by descending confidence.
pub fn decode_output(
    data: &[f32],
    shape: &[usize],
    letterbox: &Letterbox,
    params: DecodeParams,
) -> Result<Vec<Detection>> {
    let (rows, proposals) = match shape {
        [1, rows, proposals] => (*rows, *proposals),
        _ => return Err(anyhow!("unexpected YOLO output shape {:?}", shape)),
    };
    if rows < 5 {
        return Err(anyhow!(
            "YOLO output has {} rows; expected 4 box rows plus class scores",
            rows
        ));
    }
    let num_classes = rows - 4;
    if params.target_class >= num_classes {
        return Err(anyhow!(
            "target class {} outside model's {} classes",
            params.target_class,
            num_classes
        ));
    }
    let expected = rows
        .checked_mul(proposals)
        .ok_or_else(|| anyhow!("YOLO output dimensions overflow"))?;
    if data.len() != expected {
        return Err(anyhow!(
            "YOLO output holds {} values, shape {:?} implies {}",
            data.len(),
            shape,
            expected
        ));
    }

    let at = |row: usize, i: usize| data[row * proposals + i];
    let mut candidates = Vec::new();
    for i in 0..proposals {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..num_classes {
            let s = at(4 + c, i);
            if s > best_score {
                best_score = s;
                best_class = c;
            }
        }
        if best_class != params.target_class || best_score <= params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
        let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);
        candidates.push(Detection {
            x1,
            y1,
            x2,
            y2,
            confidence: best_score,
            class_id: best_class,
        });
    }

    Ok(nms(candidates, params.iou_threshold))
}

/// Greedy non-maximum suppression, highest confidence first.
pub fn nms(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
