use crate::detection::domain::face_detector::DetectionError;
use crate::shared::annotation::Annotation;
use crate::shared::frame::{ColorConversion, Frame};
use crate::shared::identity::KnownIdentitySet;

/// Turns one frame into the annotations to draw on it.
///
/// Must be a pure function of its inputs: workers call it concurrently
/// on disjoint frames with the same identity set.
pub trait Annotator: Send + Sync {
    fn annotate(
        &self,
        frame: &Frame,
        known: &KnownIdentitySet,
    ) -> Result<Vec<Annotation>, DetectionError>;

    /// Conversion workers attach to a frame before calling `annotate`.
    fn conversion(&self) -> Option<ColorConversion> {
        None
    }
}
