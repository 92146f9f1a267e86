use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::face_detector::{DetectedFace, DetectionError, FaceDetector};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionCacheError {
    #[error("failed to read detections from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detections file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Replays pre-computed detections by frame index.
///
/// Lets the pipeline run against detections produced by an external tool
/// (a JSON object mapping 1-based frame index to a list of faces). Frames
/// without an entry have no faces.
pub struct CachedFaceDetector {
    cache: Arc<HashMap<usize, Vec<DetectedFace>>>,
}

impl CachedFaceDetector {
    pub fn new(cache: Arc<HashMap<usize, Vec<DetectedFace>>>) -> Self {
        Self { cache }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DetectionCacheError> {
        let json = std::fs::read_to_string(path).map_err(|source| DetectionCacheError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cache: HashMap<usize, Vec<DetectedFace>> =
            serde_json::from_str(&json).map_err(|source| DetectionCacheError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        log::info!(
            "Loaded detections for {} frames from {}",
            cache.len(),
            path.display()
        );
        Ok(Self::new(Arc::new(cache)))
    }
}

impl FaceDetector for CachedFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectionError> {
        Ok(self.cache.get(&frame.index()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::annotation::BoundingBox;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 3, index)
    }

    fn face(left: i32) -> DetectedFace {
        DetectedFace {
            region: BoundingBox::new(2, left + 4, 6, left),
            encoding: vec![0.25, 0.5],
        }
    }

    #[test]
    fn test_returns_cached_faces_for_known_frame() {
        let faces = vec![face(1), face(5)];
        let detector = CachedFaceDetector::new(Arc::new(HashMap::from([(1, faces.clone())])));

        assert_eq!(detector.detect(&frame(1)).unwrap(), faces);
    }

    #[test]
    fn test_returns_empty_for_unknown_frame() {
        let detector = CachedFaceDetector::new(Arc::new(HashMap::from([(1, vec![face(1)])])));

        assert!(detector.detect(&frame(2)).unwrap().is_empty());
    }

    #[test]
    fn test_loads_json_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.json");
        std::fs::write(
            &path,
            r#"{"3": [{"region": {"top": 1, "right": 9, "bottom": 8, "left": 2}, "encoding": [0.5]}],
                "4": [{"region": {"top": 0, "right": 4, "bottom": 4, "left": 0}}]}"#,
        )
        .unwrap();

        let detector = CachedFaceDetector::from_json_file(&path).unwrap();

        let faces = detector.detect(&frame(3)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].region, BoundingBox::new(1, 9, 8, 2));
        assert_eq!(faces[0].encoding, vec![0.5]);
        assert!(detector.detect(&frame(4)).unwrap()[0].encoding.is_empty());
    }

    #[test]
    fn test_missing_sidecar_is_read_error() {
        let err = CachedFaceDetector::from_json_file(Path::new("/nonexistent/d.json"))
            .err()
            .unwrap();
        assert!(matches!(err, DetectionCacheError::Read { .. }));
    }

    #[test]
    fn test_malformed_sidecar_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.json");
        std::fs::write(&path, "not json").unwrap();

        let err = CachedFaceDetector::from_json_file(&path).err().unwrap();
        assert!(matches!(err, DetectionCacheError::Parse { .. }));
    }
}
