pub mod cached_face_detector;
pub mod downscaled_face_detector;
