pub mod annotator;
pub mod face_detector;
pub mod recognizing_annotator;
