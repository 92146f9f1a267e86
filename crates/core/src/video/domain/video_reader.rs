use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("unable to open video {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("reader is not open")]
    NotOpened,
    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },
}

/// Reads frames from a video source.
///
/// Implementations handle I/O details (codec, container format, etc.)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types. Frames are yielded in playback order with indices `1..=N` and no
/// gaps.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError>;

    /// Returns an iterator over frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
