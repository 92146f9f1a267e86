use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::annotation::BoundingBox;
use crate::shared::frame::{ColorConversion, Frame};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("unreadable content in frame {index}: {reason}")]
    UnreadableFrame { index: usize, reason: String },
    #[error("detector failed: {0}")]
    Backend(String),
}

/// A face located by a detector, with the encoding used for identity matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub region: BoundingBox,
    #[serde(default)]
    pub encoding: Vec<f64>,
}

/// Domain interface for face detection and encoding.
///
/// One detector instance is shared by every worker, so implementations
/// take `&self` and must be `Sync`. Per-frame state belongs in the frame.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError>;

    /// Factor mapping returned regions back to full-resolution coordinates.
    fn coordinate_scale(&self) -> u32 {
        1
    }

    /// Colorspace the detector reads from `Frame::converted`, if any.
    ///
    /// The pipeline attaches it to each frame before detection.
    fn conversion(&self) -> Option<ColorConversion> {
        None
    }
}
