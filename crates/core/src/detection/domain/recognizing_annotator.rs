use std::sync::Arc;

use crate::detection::domain::annotator::Annotator;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::annotation::Annotation;
use crate::shared::constants::DEFAULT_MATCH_TOLERANCE;
use crate::shared::frame::{ColorConversion, Frame};
use crate::shared::identity::KnownIdentitySet;

/// Annotator that detects faces and labels each with the closest known
/// identity inside the match tolerance.
pub struct RecognizingAnnotator {
    detector: Arc<dyn FaceDetector>,
    tolerance: f64,
}

impl RecognizingAnnotator {
    pub fn new(detector: Arc<dyn FaceDetector>, tolerance: f64) -> Self {
        Self {
            detector,
            tolerance,
        }
    }

    pub fn with_default_tolerance(detector: Arc<dyn FaceDetector>) -> Self {
        Self::new(detector, DEFAULT_MATCH_TOLERANCE)
    }
}

impl Annotator for RecognizingAnnotator {
    fn annotate(
        &self,
        frame: &Frame,
        known: &KnownIdentitySet,
    ) -> Result<Vec<Annotation>, DetectionError> {
        let scale = self.detector.coordinate_scale();
        let faces = self.detector.detect(frame)?;

        Ok(faces
            .into_iter()
            .map(|face| match known.best_match(&face.encoding, self.tolerance) {
                Some(name) => {
                    log::debug!("Frame {}: matched {name}", frame.index());
                    Annotation::identified(face.region, scale, name)
                }
                None => Annotation::unidentified(face.region, scale),
            })
            .collect())
    }

    fn conversion(&self) -> Option<ColorConversion> {
        self.detector.conversion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::DetectedFace;
    use crate::shared::annotation::BoundingBox;
    use crate::shared::identity::Identity;

    struct FixedDetector {
        faces: Vec<DetectedFace>,
        scale: u32,
    }

    impl FaceDetector for FixedDetector {
        fn detect(&self, _frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
            Ok(self.faces.clone())
        }

        fn coordinate_scale(&self) -> u32 {
            self.scale
        }
    }

    struct GrayDetector;

    impl FaceDetector for GrayDetector {
        fn detect(&self, _frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
            Ok(Vec::new())
        }

        fn conversion(&self) -> Option<ColorConversion> {
            Some(ColorConversion::Grayscale)
        }
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn detect(&self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
            Err(DetectionError::UnreadableFrame {
                index: frame.index(),
                reason: "corrupt".into(),
            })
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 1)
    }

    fn face(encoding: Vec<f64>) -> DetectedFace {
        DetectedFace {
            region: BoundingBox::new(1, 3, 3, 1),
            encoding,
        }
    }

    fn known() -> KnownIdentitySet {
        KnownIdentitySet::new(vec![Identity::new("alice-1", vec![0.0, 0.0])])
    }

    #[test]
    fn test_labels_matching_faces() {
        let detector = FixedDetector {
            faces: vec![face(vec![0.1, 0.0]), face(vec![5.0, 5.0])],
            scale: 1,
        };
        let annotator = RecognizingAnnotator::with_default_tolerance(Arc::new(detector));

        let annotations = annotator.annotate(&frame(), &known()).unwrap();

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].label, "alice-1");
        assert!(!annotations[1].is_identified());
    }

    #[test]
    fn test_no_known_identities_leaves_every_face_unlabelled() {
        let detector = FixedDetector {
            faces: vec![face(vec![0.0, 0.0])],
            scale: 1,
        };
        let annotator = RecognizingAnnotator::with_default_tolerance(Arc::new(detector));

        let annotations = annotator
            .annotate(&frame(), &KnownIdentitySet::empty())
            .unwrap();

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].label, "");
    }

    #[test]
    fn test_carries_detector_scale() {
        let detector = FixedDetector {
            faces: vec![face(vec![])],
            scale: 4,
        };
        let annotator = RecognizingAnnotator::with_default_tolerance(Arc::new(detector));

        let annotations = annotator.annotate(&frame(), &known()).unwrap();

        assert_eq!(annotations[0].scale, 4);
    }

    #[test]
    fn test_forwards_detector_conversion() {
        let gray = RecognizingAnnotator::with_default_tolerance(Arc::new(GrayDetector));
        assert_eq!(gray.conversion(), Some(ColorConversion::Grayscale));

        let plain = RecognizingAnnotator::with_default_tolerance(Arc::new(BrokenDetector));
        assert_eq!(plain.conversion(), None);
    }

    #[test]
    fn test_detector_error_propagates() {
        let annotator = RecognizingAnnotator::with_default_tolerance(Arc::new(BrokenDetector));
        let err = annotator.annotate(&frame(), &known()).unwrap_err();
        assert!(matches!(err, DetectionError::UnreadableFrame { index: 1, .. }));
    }
}
