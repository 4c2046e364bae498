//! Detection post-processing into the proctoring result.

use crate::detect::Detection;

/// Relative offset from the image center beyond which a lone face counts as
/// looking away.
pub const LOOKING_AWAY_DEVIATION: f32 = 0.4;

#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    pub face_count: u32,
    pub confidence: f32,
    pub looking_away: bool,
    pub bounding_boxes: Vec<[f32; 4]>,
}

/// Derive count, top confidence and the looking-away flag.
///
/// Looking away is only evaluated when exactly one face is present.
pub fn compose(detections: &[Detection], image_width: u32) -> Composition {
    let face_count = detections.len() as u32;
    let confidence = detections
        .iter()
        .map(|d| d.confidence)
        .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))))
        .unwrap_or(0.0);
    let looking_away = if face_count == 1 {
        estimate_looking_away(detections, image_width)
    } else {
        false
    };
    Composition {
        face_count,
        confidence,
        looking_away,
        bounding_boxes: detections.iter().map(Detection::to_xyxy).collect(),
    }
}

/// Centering heuristic on the first box, not head-pose estimation.
///
/// True when the box's horizontal center is more than 40% of the half-width
/// away from the image center.
pub fn estimate_looking_away(detections: &[Detection], image_width: u32) -> bool {
    let Some(main) = detections.first() else {
        return false;
    };
    if image_width == 0 {
        return false;
    }
    let image_center_x = image_width as f32 / 2.0;
    let deviation = (main.center_x() - image_center_x).abs() / image_center_x;
    deviation > LOOKING_AWAY_DEVIATION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_centered_at(cx: f32, confidence: f32) -> Detection {
        Detection::new(cx - 10.0, 20.0, cx + 10.0, 60.0, confidence)
    }

    #[test]
    fn empty_detections_compose_to_zero() {
        let c = compose(&[], 640);
        assert_eq!(c.face_count, 0);
        assert_eq!(c.confidence, 0.0);
        assert!(!c.looking_away);
        assert!(c.bounding_boxes.is_empty());
    }

    #[test]
    fn confidence_is_the_maximum() {
        let dets = [
            face_centered_at(100.0, 0.55),
            face_centered_at(300.0, 0.92),
            face_centered_at(500.0, 0.71),
        ];
        let c = compose(&dets, 640);
        assert_eq!(c.face_count, 3);
        assert_eq!(c.confidence, 0.92);
        assert_eq!(c.bounding_boxes.len(), 3);
    }

    #[test]
    fn centered_face_is_not_looking_away() {
        let c = compose(&[face_centered_at(320.0, 0.9)], 640);
        assert!(!c.looking_away);
    }

    #[test]
    fn off_center_face_is_looking_away() {
        // 600 is 280px from the 320 center: deviation 0.875.
        let c = compose(&[face_centered_at(600.0, 0.9)], 640);
        assert!(c.looking_away);
        let c = compose(&[face_centered_at(20.0, 0.9)], 640);
        assert!(c.looking_away);
    }

    #[test]
    fn boundary_is_exclusive() {
        // Width 100: center 50, threshold at 70 / 30.
        assert!(!compose(&[face_centered_at(70.0, 0.9)], 100).looking_away);
        assert!(!compose(&[face_centered_at(69.9, 0.9)], 100).looking_away);
        assert!(compose(&[face_centered_at(70.1, 0.9)], 100).looking_away);
        assert!(compose(&[face_centered_at(29.9, 0.9)], 100).looking_away);
    }

    #[test]
    fn multiple_faces_never_look_away() {
        let dets = [face_centered_at(5.0, 0.9), face_centered_at(635.0, 0.8)];
        let c = compose(&dets, 640);
        assert_eq!(c.face_count, 2);
        assert!(!c.looking_away);
    }

    #[test]
    fn zero_width_is_not_looking_away() {
        assert!(!estimate_looking_away(&[face_centered_at(10.0, 0.9)], 0));
    }
}
