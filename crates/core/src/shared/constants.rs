/// Workers used when the caller does not choose a count.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Maximum encoding distance for two faces to count as the same person.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.5;

/// Consecutive detection failures after which a worker abandons its chunk.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 3;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
