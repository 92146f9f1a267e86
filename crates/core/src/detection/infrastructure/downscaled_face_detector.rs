use thiserror::Error;

use crate::detection::domain::face_detector::{DetectedFace, DetectionError, FaceDetector};
use crate::shared::frame::{ColorConversion, Frame};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DownscaleError {
    #[error("downscale factor must be at least 1, got {0}")]
    InvalidFactor(u32),
}

/// Decorator that runs the inner detector on a copy shrunk by an integer
/// factor.
///
/// Regions come back in downscaled units; `coordinate_scale` reports the
/// factor so the renderer can map them onto the full-resolution frame.
pub struct DownscaledFaceDetector {
    inner: Box<dyn FaceDetector>,
    factor: u32,
}

impl DownscaledFaceDetector {
    pub fn new(inner: Box<dyn FaceDetector>, factor: u32) -> Result<Self, DownscaleError> {
        if factor < 1 {
            return Err(DownscaleError::InvalidFactor(factor));
        }
        Ok(Self { inner, factor })
    }

    fn shrink(&self, frame: &Frame) -> Result<Frame, DetectionError> {
        let w = (frame.width() / self.factor).max(1);
        let h = (frame.height() / self.factor).max(1);
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| DetectionError::UnreadableFrame {
                index: frame.index(),
                reason: "pixel buffer does not match RGB dimensions".into(),
            })?;
        let small = image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle);
        let small = Frame::new(small.into_raw(), w, h, 3, frame.index());
        Ok(match frame.converted() {
            Some(converted) => small.with_conversion(converted.conversion),
            None => small,
        })
    }
}

impl FaceDetector for DownscaledFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
        if self.factor == 1 {
            return self.inner.detect(frame);
        }
        let small = self.shrink(frame)?;
        self.inner.detect(&small)
    }

    fn coordinate_scale(&self) -> u32 {
        self.factor * self.inner.coordinate_scale()
    }

    fn conversion(&self) -> Option<ColorConversion> {
        self.inner.conversion()
    }
}
