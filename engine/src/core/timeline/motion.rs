//! Scene Motion
//!
//! Deterministic linear transforms applied to a scene image over its duration.
//! Translations are fractions of the frame size; positive x moves right,
//! positive y moves down.

use serde::{Deserialize, Serialize};

use super::MotionType;
use crate::core::TimeSec;

/// Final scale reached by a zoom-in
pub const ZOOM_END_SCALE: f64 = 1.2;

/// Constant scale held during pans so the frame edges never show
pub const PAN_SCALE: f64 = 1.2;

/// Distance travelled by a pan on either side of center
pub const PAN_TRAVEL: f64 = 0.08;

/// Transform of the scene image at one instant
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl MotionTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl Default for MotionTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Progress through a scene in `[0, 1]`
pub fn motion_progress(local_time: TimeSec, duration_sec: TimeSec) -> f64 {
    if duration_sec <= 0.0 || !local_time.is_finite() {
        return 0.0;
    }
    (local_time / duration_sec).clamp(0.0, 1.0)
}

impl MotionType {
    /// Transform at `progress` (clamped to `[0, 1]`)
    pub fn transform_at(&self, progress: f64) -> MotionTransform {
        let p = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        // Pans sweep from +travel to -travel (or the reverse) through center.
        let sweep = PAN_TRAVEL - 2.0 * PAN_TRAVEL * p;

        match self {
            MotionType::None => MotionTransform::identity(),
            MotionType::ZoomIn => MotionTransform {
                scale: 1.0 + (ZOOM_END_SCALE - 1.0) * p,
                ..MotionTransform::identity()
            },
            MotionType::PanLeft => MotionTransform {
                scale: PAN_SCALE,
                translate_x: sweep,
                translate_y: 0.0,
            },
            MotionType::PanRight => MotionTransform {
                scale: PAN_SCALE,
                translate_x: -sweep,
                translate_y: 0.0,
            },
            MotionType::PanUp => MotionTransform {
                scale: PAN_SCALE,
                translate_x: 0.0,
                translate_y: sweep,
            },
            MotionType::PanDown => MotionTransform {
                scale: PAN_SCALE,
                translate_x: 0.0,
                translate_y: -sweep,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_in_is_linear() {
        let start = MotionType::ZoomIn.transform_at(0.0);
        let mid = MotionType::ZoomIn.transform_at(0.5);
        let end = MotionType::ZoomIn.transform_at(1.0);

        assert_eq!(start.scale, 1.0);
        assert!((mid.scale - 1.1).abs() < 1e-9);
        assert!((end.scale - ZOOM_END_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_pan_left_moves_image_left() {
        let start = MotionType::PanLeft.transform_at(0.0);
        let end = MotionType::PanLeft.transform_at(1.0);

        assert!(start.translate_x > end.translate_x);
        assert!((start.translate_x - PAN_TRAVEL).abs() < 1e-9);
        assert!((end.translate_x + PAN_TRAVEL).abs() < 1e-9);
        assert_eq!(start.scale, PAN_SCALE);
    }

    #[test]
    fn test_pan_down_moves_image_down() {
        let start = MotionType::PanDown.transform_at(0.0);
        let end = MotionType::PanDown.transform_at(1.0);
        assert!(end.translate_y > start.translate_y);
        assert_eq!(end.translate_x, 0.0);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(motion_progress(-1.0, 4.0), 0.0);
        assert_eq!(motion_progress(2.0, 4.0), 0.5);
        assert_eq!(motion_progress(9.0, 4.0), 1.0);
        assert_eq!(motion_progress(1.0, 0.0), 0.0);
        assert_eq!(MotionType::None.transform_at(7.0), MotionTransform::identity());
    }
}
