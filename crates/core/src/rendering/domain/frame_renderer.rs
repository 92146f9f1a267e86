use thiserror::Error;

use crate::shared::annotation::Annotation;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("frame {index} has unsupported layout ({channels} channels, {width}x{height})")]
    UnsupportedLayout {
        index: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
}

/// Domain interface for drawing annotation overlays.
///
/// Returns a new frame with the same index; the input frame is left
/// untouched. Region coordinates are multiplied by each annotation's
/// scale factor before drawing.
pub trait FrameRenderer: Send + Sync {
    fn render(&self, frame: &Frame, annotations: &[Annotation]) -> Result<Frame, RenderError>;
}
